use super::markers::{classify_line, MarkerStyle, Section};
use super::FormatStrategy;

const GREETING_PHRASES: [&str; 2] = ["let's start", "tell me about yourself"];
const GREETING_MAX_CHARS: usize = 120;

/// Opening greetings are shown verbatim.
pub struct GreetingPassthrough;

impl FormatStrategy for GreetingPassthrough {
    fn name(&self) -> &'static str {
        "greeting"
    }

    fn apply(&self, text: &str) -> Option<String> {
        if text.chars().count() >= GREETING_MAX_CHARS {
            return None;
        }
        let normalized = text.to_lowercase().replace('\u{2019}', "'");
        GREETING_PHRASES
            .iter()
            .any(|phrase| normalized.contains(phrase))
            .then(|| text.to_string())
    }
}

/// All four sections already present as header lines, once each and in
/// order. Only the header spelling is normalized.
pub struct AlreadyCanonical;

fn heading_section(line: &str) -> Option<Section> {
    classify_line(line)
        .filter(|m| m.style == MarkerStyle::Heading)
        .map(|m| m.section)
}

fn split_line_ending(segment: &str) -> (&str, &str) {
    if let Some(content) = segment.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = segment.strip_suffix('\n') {
        (content, "\n")
    } else {
        (segment, "")
    }
}

impl FormatStrategy for AlreadyCanonical {
    fn name(&self) -> &'static str {
        "already_canonical"
    }

    fn apply(&self, text: &str) -> Option<String> {
        let found: Vec<Section> = text.lines().filter_map(heading_section).collect();
        if found != Section::ALL {
            return None;
        }

        let mut out = String::with_capacity(text.len());
        for segment in text.split_inclusive('\n') {
            let (content, ending) = split_line_ending(segment);
            match heading_section(content) {
                Some(section) => {
                    out.push_str(section.header());
                    out.push_str(ending);
                }
                None => out.push_str(segment),
            }
        }
        Some(out)
    }
}
