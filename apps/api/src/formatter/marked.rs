use super::markers::{classify_line, is_canonical_header, Marker};
use super::{FormatStrategy, SectionBodies};

/// Splits the text at every recognized marker line and files each body under
/// its section. Text before the first marker is dropped.
pub struct MarkedSections;

impl FormatStrategy for MarkedSections {
    fn name(&self) -> &'static str {
        "marked_sections"
    }

    fn apply(&self, text: &str) -> Option<String> {
        let lines: Vec<&str> = text.lines().collect();
        let has_canonical = lines.iter().any(|l| is_canonical_header(l));

        let markers: Vec<(usize, Marker<'_>)> = lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| classify_line(line).map(|m| (i, m)))
            .filter(|(_, m)| !(has_canonical && m.is_conversational()))
            .collect();

        let mut bodies = SectionBodies::default();
        for (pos, (start, marker)) in markers.iter().enumerate() {
            let end = markers.get(pos + 1).map_or(lines.len(), |(next, _)| *next);
            let body = lines[start + 1..end].join("\n");
            bodies.append_block(marker.section, &body);
        }

        bodies.render()
    }
}
