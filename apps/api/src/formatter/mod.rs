//! Response formatter. Coerces free-text model replies into the four-section
//! layout the UI renders (`What's Good`, `Areas for Improvement`,
//! `Model Answer`, `Follow-up Question`).
//!
//! The model is asked for that layout but nothing enforces it, so the
//! formatter tries a chain of strategies from strictest to loosest and stops
//! at the first that matches. If none does, the reply is returned untouched:
//! callers see either a fully sectioned reply or the raw text, never a mix.
//!
//! Strategies are pure functions of the input text, and the chain is
//! idempotent: formatting an already formatted reply returns it unchanged.

mod canonical;
mod marked;
pub mod markers;
mod numbered;
mod sentence;

use tracing::debug;

use canonical::{AlreadyCanonical, GreetingPassthrough};
use marked::MarkedSections;
use markers::Section;
use numbered::NumberedList;
use sentence::SentenceSplit;

/// One step of the formatting cascade.
pub trait FormatStrategy {
    fn name(&self) -> &'static str;

    /// Returns the formatted text, or `None` if this strategy does not apply.
    fn apply(&self, text: &str) -> Option<String>;
}

fn strategies() -> [&'static dyn FormatStrategy; 5] {
    [
        &GreetingPassthrough,
        &AlreadyCanonical,
        &MarkedSections,
        &NumberedList,
        &SentenceSplit,
    ]
}

/// Formats a raw model reply. Never fails; the worst case is the input itself.
pub fn enforce_format(raw: &str) -> String {
    for strategy in strategies() {
        if let Some(formatted) = strategy.apply(raw) {
            debug!(
                "Formatter strategy '{}' matched ({} -> {} chars)",
                strategy.name(),
                raw.len(),
                formatted.len()
            );
            return formatted;
        }
    }

    debug!("No formatter strategy matched; returning reply unchanged");
    raw.to_string()
}

/// Accumulated body text per section.
#[derive(Debug, Default)]
struct SectionBodies {
    bodies: [String; 4],
}

impl SectionBodies {
    fn get(&self, section: Section) -> &str {
        &self.bodies[section.index()]
    }

    fn is_empty(&self, section: Section) -> bool {
        self.bodies[section.index()].is_empty()
    }

    fn join_with(&mut self, section: Section, text: &str, separator: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let body = &mut self.bodies[section.index()];
        if !body.is_empty() {
            body.push_str(separator);
        }
        body.push_str(text);
    }

    /// Appends a block of text, separated from existing content by a blank line.
    fn append_block(&mut self, section: Section, text: &str) {
        self.join_with(section, text, "\n\n");
    }

    fn append_line(&mut self, section: Section, line: &str) {
        self.join_with(section, line, "\n");
    }

    fn set(&mut self, section: Section, text: &str) {
        self.bodies[section.index()] = text.trim().to_string();
    }

    fn filled(&self) -> usize {
        self.bodies.iter().filter(|b| !b.is_empty()).count()
    }

    /// Canonical headers in fixed order, each followed by its body. Empty
    /// sections are omitted; `None` when every section is empty.
    fn render(&self) -> Option<String> {
        let parts: Vec<String> = Section::ALL
            .iter()
            .filter(|s| !self.is_empty(**s))
            .map(|s| format!("{}\n{}", s.header(), self.get(*s)))
            .collect();

        (!parts.is_empty()).then(|| parts.join("\n\n"))
    }
}

/// Blank-line-delimited blocks of `lines`, trimmed, empty ones dropped.
fn paragraphs<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join("\n").trim().to_string());
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current.join("\n").trim().to_string());
    }

    out.retain(|p| !p.is_empty());
    out
}
