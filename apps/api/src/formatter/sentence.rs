use std::ops::Range;

use super::markers::{classify_line, Section};
use super::{paragraphs, FormatStrategy, SectionBodies};

const MIN_TEXT_CHARS: usize = 200;
const MIN_BODY_CHARS: usize = 100;
const GOOD_EFFORT: &str = "- Good effort in answering the question";
const MORE_DETAIL: &str = "- Could provide more detail and examples";

/// Last structured attempt: the first question becomes the follow-up and the
/// prose before it the model answer, with generic evaluation bullets.
pub struct SentenceSplit;

/// Byte ranges of sentences. A sentence ends after a run of terminal
/// punctuation or at a line break (which is not part of either sentence).
fn sentence_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '\n' {
            spans.push(start..i);
            start = i + 1;
        } else if matches!(c, '.' | '!' | '?') {
            let mut end = i + c.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if !matches!(next, '.' | '!' | '?') {
                    break;
                }
                end = j + next.len_utf8();
                chars.next();
            }
            spans.push(start..end);
            start = end;
        }
    }
    if start < text.len() {
        spans.push(start..text.len());
    }
    spans
}

impl FormatStrategy for SentenceSplit {
    fn name(&self) -> &'static str {
        "sentence_split"
    }

    fn apply(&self, text: &str) -> Option<String> {
        if text.chars().count() <= MIN_TEXT_CHARS {
            return None;
        }

        let cleaned = text
            .lines()
            .filter(|line| classify_line(line).map_or(true, |m| m.is_conversational()))
            .collect::<Vec<_>>()
            .join("\n");

        let question = sentence_spans(&cleaned)
            .into_iter()
            .find(|span| cleaned[span.clone()].contains('?'))?;

        let body = cleaned[..question.start].trim();
        if body.chars().count() <= MIN_BODY_CHARS {
            return None;
        }
        let paras = paragraphs(body.lines());
        if paras.len() < 2 {
            return None;
        }

        let mut bodies = SectionBodies::default();
        bodies.set(Section::WhatsGood, GOOD_EFFORT);
        bodies.set(Section::AreasForImprovement, MORE_DETAIL);
        bodies.set(Section::ModelAnswer, &paras[1..].join("\n\n"));
        bodies.set(Section::FollowUp, &cleaned[question]);
        bodies.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPENING: &str = "Here is my take on your answer, which covered the basics of TCP handshakes reasonably well.";
    const DETAIL: &str = "TCP uses a three-way handshake of SYN, SYN-ACK and ACK before any data flows between the peers.";

    #[test]
    fn test_sentence_spans_split_on_punctuation_and_newlines() {
        let text = "One. Two?! Three\nFour";
        let spans: Vec<&str> = sentence_spans(text).into_iter().map(|s| &text[s]).collect();
        assert_eq!(spans, vec!["One.", " Two?!", " Three", "Four"]);
    }

    #[test]
    fn test_prose_is_split_around_first_question() {
        let raw = format!("{OPENING}\n\n{DETAIL}\n\nWhat does the final ACK confirm? Take your time.");
        assert_eq!(
            SentenceSplit.apply(&raw).unwrap(),
            format!(
                "### ✅ What's Good\n{GOOD_EFFORT}\n\n### ⚠️ Areas for Improvement\n{MORE_DETAIL}\n\n### 📝 Model Answer\n{DETAIL}\n\n### ❓ Follow-up Question\nWhat does the final ACK confirm?"
            )
        );
    }

    #[test]
    fn test_orphan_marker_lines_are_dropped() {
        let raw = format!("{OPENING}\n\n**Model Answer**\n{DETAIL}\n\nWhat does the final ACK confirm?");
        let formatted = SentenceSplit.apply(&raw).unwrap();
        assert!(formatted.contains(&format!("### 📝 Model Answer\n{DETAIL}\n\n")));
        assert!(!formatted.contains("**Model Answer**"));
    }

    #[test]
    fn test_short_text_is_rejected() {
        assert!(SentenceSplit.apply("Para one.\n\nPara two.\n\nWhy?").is_none());
    }

    #[test]
    fn test_single_paragraph_before_question_is_rejected() {
        let raw = format!("{OPENING} {DETAIL} What does the final ACK confirm?");
        assert!(SentenceSplit.apply(&raw).is_none());
    }

    #[test]
    fn test_text_without_question_is_rejected() {
        let raw = format!("{OPENING}\n\n{DETAIL}\n\n{OPENING}");
        assert!(SentenceSplit.apply(&raw).is_none());
    }
}
