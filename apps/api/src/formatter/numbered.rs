use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use super::markers::{classify_line, Marker, MarkerStyle, Section};
use super::{paragraphs, FormatStrategy, SectionBodies};

const QUESTION_SEARCH_LINES: usize = 4;
const MODEL_ANSWER_MIN_TEXT_CHARS: usize = 300;
const MODEL_ANSWER_MIN_PARAGRAPH_CHARS: usize = 50;
const MIN_FILLED_SECTIONS: usize = 3;

fn numbered_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+[.)]\s").expect("numbered item pattern is valid"))
}

/// Line-oriented scan for replies written as a numbered list, e.g.
/// `1. What's good: ...` / `2. What can be improved: ...`.
pub struct NumberedList;

struct Question {
    lines: Range<usize>,
    text: String,
}

fn is_strong(marker: &Option<Marker<'_>>) -> bool {
    marker.is_some_and(|m| !m.is_conversational())
}

/// The first follow-up marker wins; otherwise the last questioning line near
/// the end of the text. The question runs until the next marker line.
fn locate_question(lines: &[&str], classified: &[Option<Marker<'_>>]) -> Option<Question> {
    let explicit = classified.iter().enumerate().find_map(|(i, m)| {
        m.filter(|m| m.section == Section::FollowUp)
            .map(|m| (i, m.inline.to_string()))
    });

    let (start, first) = explicit.or_else(|| {
        let tail = lines.len().saturating_sub(QUESTION_SEARCH_LINES);
        (tail..lines.len())
            .rev()
            .find(|&i| classified[i].is_none() && lines[i].contains('?'))
            .map(|i| (i, lines[i].trim().to_string()))
    })?;

    let end = (start + 1..lines.len())
        .find(|&i| is_strong(&classified[i]))
        .unwrap_or(lines.len());

    let pieces: Vec<String> = std::iter::once(first)
        .chain(lines[start + 1..end].iter().map(|l| l.trim().to_string()))
        .filter(|p| !p.is_empty())
        .collect();

    Some(Question {
        lines: start..end,
        text: pieces.join(" "),
    })
}

fn bulletize(body: &str) -> String {
    body.lines()
        .map(|line| {
            if line.starts_with(['-', '*', '\u{2022}']) {
                line.to_string()
            } else {
                format!("- {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Longest paragraph once marker and question lines are blanked out.
fn longest_paragraph(
    lines: &[&str],
    classified: &[Option<Marker<'_>>],
    question: Option<&Range<usize>>,
) -> Option<String> {
    let remaining = lines.iter().enumerate().map(|(i, line)| {
        let in_question = question.is_some_and(|q| q.contains(&i));
        if in_question || is_strong(&classified[i]) {
            ""
        } else {
            *line
        }
    });

    let mut best: Option<String> = None;
    for paragraph in paragraphs(remaining) {
        let len = paragraph.chars().count();
        if len <= MODEL_ANSWER_MIN_PARAGRAPH_CHARS {
            continue;
        }
        if best.as_ref().map_or(true, |b| len > b.chars().count()) {
            best = Some(paragraph);
        }
    }
    best
}

impl FormatStrategy for NumberedList {
    fn name(&self) -> &'static str {
        "numbered_list"
    }

    fn apply(&self, text: &str) -> Option<String> {
        let lines: Vec<&str> = text.lines().collect();
        let classified: Vec<Option<Marker<'_>>> = lines.iter().map(|l| classify_line(l)).collect();

        let triggered = classified.iter().flatten().any(|m| {
            m.style == MarkerStyle::Numbered && m.section != Section::FollowUp
        });
        if !triggered {
            return None;
        }

        let question = locate_question(&lines, &classified);
        let mut bodies = SectionBodies::default();
        let mut cursor: Option<Section> = None;

        for (i, line) in lines.iter().enumerate() {
            if question.as_ref().is_some_and(|q| q.lines.contains(&i)) {
                continue;
            }

            match classified[i] {
                Some(m) if !m.is_conversational() && m.section != Section::FollowUp => {
                    cursor = Some(m.section);
                    bodies.append_line(m.section, m.inline);
                }
                Some(m) if !m.is_conversational() => cursor = None,
                _ if numbered_item().is_match(line) => cursor = None,
                _ => {
                    if let Some(section) = cursor {
                        bodies.append_line(section, line);
                    }
                }
            }
        }

        for section in [Section::WhatsGood, Section::AreasForImprovement] {
            if !bodies.is_empty(section) {
                let bulleted = bulletize(bodies.get(section));
                bodies.set(section, &bulleted);
            }
        }

        if bodies.is_empty(Section::ModelAnswer)
            && text.chars().count() > MODEL_ANSWER_MIN_TEXT_CHARS
        {
            let range = question.as_ref().map(|q| &q.lines);
            if let Some(paragraph) = longest_paragraph(&lines, &classified, range) {
                bodies.set(Section::ModelAnswer, &paragraph);
            }
        }

        if let Some(question) = &question {
            bodies.set(Section::FollowUp, &question.text);
        }

        if bodies.filled() < MIN_FILLED_SECTIONS {
            return None;
        }
        bodies.render()
    }
}
