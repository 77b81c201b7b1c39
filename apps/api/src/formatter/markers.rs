//! Section markers: the canonical headers and the looser phrasings models
//! actually produce.

use std::sync::OnceLock;

use regex::Regex;

/// The four sections of an evaluated reply, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    WhatsGood,
    AreasForImprovement,
    ModelAnswer,
    FollowUp,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::WhatsGood,
        Section::AreasForImprovement,
        Section::ModelAnswer,
        Section::FollowUp,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Section::WhatsGood => "### \u{2705} What's Good",
            Section::AreasForImprovement => "### \u{26A0}\u{FE0F} Areas for Improvement",
            Section::ModelAnswer => "### \u{1F4DD} Model Answer",
            Section::FollowUp => "### \u{2753} Follow-up Question",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    fn name_pattern(self) -> &'static str {
        match self {
            Section::WhatsGood => r"what['’]?s?\s+(?:is\s+)?good|strengths?",
            Section::AreasForImprovement => {
                r"areas?\s+(?:for|of)\s+improvements?|what\s+(?:can|could)\s+be\s+improved|improvements?"
            }
            Section::ModelAnswer => r"(?:a\s+)?model\s+answer|sample\s+answer",
            Section::FollowUp => r"follow[-\s]?up(?:\s+questions?)?|next\s+question",
        }
    }
}

/// How a marker line is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    /// Decorated header with nothing after it: `### ✅ What's Good`, `**Model Answer:**`.
    Heading,
    /// Undecorated or colon-suffixed: `What's good:`, `✅ What's Good: clear answer`.
    Plain,
    /// Numbered-list item: `2. What can be improved: ...`.
    Numbered,
    /// Conversational opener such as `Now, let's ...` or `A good answer ...`.
    Conversational,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker<'a> {
    pub section: Section,
    pub style: MarkerStyle,
    /// Text after the marker's colon, trimmed. For conversational markers,
    /// the whole trimmed line.
    pub inline: &'a str,
}

impl Marker<'_> {
    pub fn is_conversational(&self) -> bool {
        self.style == MarkerStyle::Conversational
    }
}

const EMOJI: &str = r"(?:\x{2705}|\x{2714}\x{FE0F}?|\x{2611}\x{FE0F}?|\x{1F44D}|\x{26A0}\x{FE0F}?|\x{2757}\x{FE0F}?|\x{1F527}|\x{1F4DD}|\x{1F4A1}|\x{1F4CC}|\x{2753}|\x{2754}|\x{1F914}|\x{1F449})";

struct MarkerPatterns {
    headers: Vec<Regex>,
    conversational: Vec<(Section, Regex)>,
}

fn patterns() -> &'static MarkerPatterns {
    static PATTERNS: OnceLock<MarkerPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let headers = Section::ALL
            .iter()
            .map(|section| {
                let pattern = format!(
                    r"(?i)^\s*(?P<hashes>#{{1,6}}\s*)?(?P<num>\d+[.)]\s*)?(?P<deco1>(?:{EMOJI}\s*)*)(?P<bold1>\*\*|__)?\s*(?P<deco2>(?:{EMOJI}\s*)*)(?:{name})\s*(?P<bold2>\*\*|__)?\s*(?P<colon>:)?\s*(?P<bold3>\*\*|__)?(?P<rest>.*)$",
                    name = section.name_pattern(),
                );
                Regex::new(&pattern).expect("section header pattern is valid")
            })
            .collect();

        let conversational = vec![
            (
                Section::FollowUp,
                Regex::new(r"(?i)^\s*(?:now,?\s+let['’]?s|can\s+you\s+explain|let['’]?s\s+dive)\b")
                    .expect("follow-up opener pattern is valid"),
            ),
            (
                Section::ModelAnswer,
                Regex::new(r"(?i)^\s*a\s+good\s+(?:answer|introduction|response)\b")
                    .expect("model answer opener pattern is valid"),
            ),
        ];

        MarkerPatterns {
            headers,
            conversational,
        }
    })
}

/// Classifies a single line as a section marker, if it is one.
///
/// Markers must start the line. A header phrase followed by more words is only
/// a marker when a colon separates them, so ordinary prose such as
/// "What's good about this approach" is left alone.
pub fn classify_line(line: &str) -> Option<Marker<'_>> {
    let p = patterns();

    for (section, re) in Section::ALL.iter().zip(&p.headers) {
        let Some(caps) = re.captures(line) else {
            continue;
        };

        let has_colon = caps.name("colon").is_some();
        let rest = caps.name("rest").map_or("", |m| m.as_str()).trim();
        if !rest.is_empty() && !has_colon {
            continue;
        }

        let non_blank = |name: &str| caps.name(name).is_some_and(|m| !m.as_str().trim().is_empty());
        let decorated = non_blank("hashes")
            || non_blank("deco1")
            || non_blank("deco2")
            || caps.name("bold1").is_some()
            || caps.name("bold2").is_some();

        let style = if caps.name("num").is_some() {
            MarkerStyle::Numbered
        } else if decorated && rest.is_empty() {
            MarkerStyle::Heading
        } else {
            MarkerStyle::Plain
        };

        return Some(Marker {
            section: *section,
            style,
            inline: rest,
        });
    }

    p.conversational
        .iter()
        .find(|(_, re)| re.is_match(line))
        .map(|(section, _)| Marker {
            section: *section,
            style: MarkerStyle::Conversational,
            inline: line.trim(),
        })
}

/// True when `line` is exactly one of the canonical headers.
pub fn is_canonical_header(line: &str) -> bool {
    let line = line.trim();
    Section::ALL.iter().any(|s| s.header() == line)
}
