use std::io::{Cursor, Read};

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use super::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Body paragraphs of a `.docx`, one per line. Table content is skipped.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let xml = read_document_part(bytes)?;
    let paragraphs = body_paragraphs(&xml)?;
    Ok(paragraphs.join("\n"))
}

fn read_document_part(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::Docx(format!("{DOCUMENT_PART}: {e}")))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| ExtractError::Docx(format!("{DOCUMENT_PART}: {e}")))?;
    Ok(xml)
}

fn resolve_reference(reference: &BytesRef<'_>) -> Result<String, ExtractError> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| ExtractError::Docx(e.to_string()))?
    {
        return Ok(ch.to_string());
    }

    let name = reference
        .decode()
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| ExtractError::Docx(format!("unknown entity &{name};")))
}

#[derive(Default)]
struct BodyWalker {
    paragraphs: Vec<String>,
    current: String,
    paragraph_depth: usize,
    table_depth: usize,
    in_text_run: bool,
}

impl BodyWalker {
    fn collecting(&self) -> bool {
        self.paragraph_depth > 0 && self.table_depth == 0
    }

    fn open(&mut self, name: &[u8]) {
        match name {
            b"tbl" => self.table_depth += 1,
            b"p" => {
                if self.paragraph_depth == 0 {
                    self.current.clear();
                }
                self.paragraph_depth += 1;
            }
            b"t" => self.in_text_run = true,
            _ => self.control(name),
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"tbl" => self.table_depth = self.table_depth.saturating_sub(1),
            b"p" => {
                self.paragraph_depth = self.paragraph_depth.saturating_sub(1);
                if self.paragraph_depth == 0 && self.table_depth == 0 {
                    self.paragraphs.push(std::mem::take(&mut self.current));
                }
            }
            b"t" => self.in_text_run = false,
            _ => {}
        }
    }

    /// Self-closing elements: `<w:p/>` is an empty paragraph, the rest are
    /// in-run controls.
    fn empty(&mut self, name: &[u8]) {
        match name {
            b"p" if self.paragraph_depth == 0 && self.table_depth == 0 => {
                self.paragraphs.push(String::new());
            }
            _ => self.control(name),
        }
    }

    fn control(&mut self, name: &[u8]) {
        if !self.collecting() {
            return;
        }
        match name {
            b"tab" => self.current.push('\t'),
            b"br" | b"cr" => self.current.push('\n'),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.collecting() && self.in_text_run {
            self.current.push_str(text);
        }
    }
}

fn body_paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut walker = BodyWalker::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => walker.open(e.local_name().as_ref()),
            Ok(Event::End(e)) => walker.close(e.local_name().as_ref()),
            Ok(Event::Empty(e)) => walker.empty(e.local_name().as_ref()),
            Ok(Event::Text(e)) => {
                let text = e.decode().map_err(|e| ExtractError::Docx(e.to_string()))?;
                walker.text(&text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e);
                walker.text(&text);
            }
            Ok(Event::GeneralRef(e)) => {
                if walker.collecting() && walker.in_text_run {
                    let resolved = resolve_reference(&e)?;
                    walker.text(&resolved);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ExtractError::Docx(format!(
                    "XML error at byte {}: {e}",
                    reader.error_position()
                )))
            }
        }
    }

    Ok(walker.paragraphs)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::*;

    /// A minimal `.docx` whose document body is `body`.
    pub(crate) fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("[Content_Types].xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer
            .start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_paragraphs_are_joined_in_order() {
        let docx = docx_with_body(
            "<w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>\
             <w:p><w:r><w:t xml:space=\"preserve\">Backend </w:t></w:r><w:r><w:t>Engineer</w:t></w:r></w:p>\
             <w:p/>\
             <w:p><w:r><w:t>Skills: Rust</w:t></w:r></w:p>",
        );
        assert_eq!(extract(&docx).unwrap(), "Jane Doe\nBackend Engineer\n\nSkills: Rust");
    }

    #[test]
    fn test_tabs_breaks_and_entities() {
        let docx = docx_with_body(
            "<w:p><w:r><w:t>C&amp;C++</w:t><w:tab/><w:t>2019&#8211;2023</w:t><w:br/><w:t>&lt;lead&gt;</w:t></w:r></w:p>",
        );
        assert_eq!(extract(&docx).unwrap(), "C&C++\t2019\u{2013}2023\n<lead>");
    }

    #[test]
    fn test_table_content_is_skipped() {
        let docx = docx_with_body(
            "<w:p><w:r><w:t>Before</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:t>After</w:t></w:r></w:p>",
        );
        assert_eq!(extract(&docx).unwrap(), "Before\nAfter");
    }

    #[test]
    fn test_non_text_elements_are_ignored() {
        let docx = docx_with_body(
            "<w:p><w:pPr><w:pStyle w:val=\"Heading1\"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>Experience</w:t></w:r><w:r><w:delText>old</w:delText></w:r></w:p>",
        );
        assert_eq!(extract(&docx).unwrap(), "Experience");
    }

    #[test]
    fn test_not_a_zip_is_an_error() {
        assert!(matches!(extract(b"plain text"), Err(ExtractError::Docx(_))));
    }

    #[test]
    fn test_missing_document_part_is_an_error() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<styles/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract(&bytes).unwrap_err();
        assert!(err.to_string().contains(DOCUMENT_PART));
    }
}
