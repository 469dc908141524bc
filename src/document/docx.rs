use super::{utf16_len, TextLine};
use crate::engine::EngineError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Read, Seek};

const MAIN_PART: &str = "word/document.xml";

/// Read the main document part of a `.docx`/`.docm` package into lines.
pub fn read_lines<R: Read + Seek>(reader: R) -> Result<Vec<TextLine>, EngineError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut part = archive
        .by_name(MAIN_PART)
        .map_err(|_| EngineError::UnsupportedFormat(format!("package has no {}", MAIN_PART)))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)?;

    parse_document_xml(&xml)
}

/// Walks `w:body` keeping the same counters a word processor reports:
/// paragraph marks, breaks and tabs each count as one character, page
/// breaks restart line numbering.
pub fn parse_document_xml(xml: &str) -> Result<Vec<TextLine>, EngineError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut layout = Layout::new();
    let mut in_text = false;
    let mut in_paragraph_props = false;
    let mut in_section_props = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"pPr" => in_paragraph_props = true,
                b"sectPr" if in_paragraph_props => {
                    in_section_props = true;
                    layout.section_break = true;
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"pPr" => in_paragraph_props = false,
                b"sectPr" => in_section_props = false,
                b"p" => layout.end_paragraph(),
                b"tr" => layout.advance(1),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" if !in_paragraph_props => layout.push_text("\t"),
                b"noBreakHyphen" => layout.push_text("-"),
                b"br" => layout.line_break(break_type(&e).as_deref()),
                b"cr" => layout.line_break(None),
                b"lastRenderedPageBreak" => layout.rendered_page_break(),
                // Section type defaults to next page
                b"sectPr" if in_paragraph_props => layout.section_break = true,
                b"sym" => layout.push_text(&symbol(&e).to_string()),
                b"type" if in_section_props => {
                    if attribute(&e, b"val").as_deref() == Some("continuous") {
                        layout.section_break = false;
                    }
                }
                _ => {}
            },
            Event::Text(e) if in_text => {
                let text = e.unescape()?;
                layout.push_text(&text);
            }
            Event::CData(e) if in_text => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                layout.push_text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    layout.flush();
    Ok(layout.lines)
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Character drawn by `w:sym`; Word counts it as one character.
fn symbol(e: &BytesStart<'_>) -> char {
    attribute(e, b"char")
        .and_then(|code| u32::from_str_radix(&code, 16).ok())
        .and_then(char::from_u32)
        .filter(|c| !c.is_control())
        .unwrap_or('\u{FFFD}')
}

fn break_type(e: &BytesStart<'_>) -> Option<String> {
    attribute(e, b"type")
}

struct Layout {
    lines: Vec<TextLine>,
    page: u32,
    line: u32,
    position: u64,
    line_start: u64,
    current: String,
    /// An explicit page break was seen and no text followed it yet
    fresh_page: bool,
    /// The paragraph being read closes a section that starts a new page
    section_break: bool,
}

impl Layout {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            page: 1,
            line: 1,
            position: 0,
            line_start: 0,
            current: String::new(),
            fresh_page: false,
            section_break: false,
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.current.is_empty() {
            self.line_start = self.position;
        }
        // A line never spans a raw line separator
        self.current
            .extend(text.chars().map(|c| if is_line_separator(c) { ' ' } else { c }));
        self.position += utf16_len(text);
        self.fresh_page = false;
    }

    fn advance(&mut self, chars: u64) {
        self.position += chars;
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(TextLine {
                page: self.page,
                line: self.line,
                start: self.line_start,
                text: std::mem::take(&mut self.current),
            });
        }
    }

    fn new_page(&mut self) {
        self.page += 1;
        self.line = 1;
        self.fresh_page = true;
    }

    fn end_paragraph(&mut self) {
        self.flush();
        self.advance(1);
        if self.section_break {
            self.section_break = false;
            self.new_page();
        } else {
            self.line += 1;
        }
    }

    fn line_break(&mut self, kind: Option<&str>) {
        self.flush();
        self.advance(1);
        match kind {
            Some("page") => self.new_page(),
            _ => self.line += 1,
        }
    }

    fn rendered_page_break(&mut self) {
        // Word writes this marker next to explicit breaks as well
        if self.fresh_page {
            return;
        }
        self.flush();
        self.new_page();
    }
}

pub(crate) fn is_line_separator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Minimal `.docx` package around a `w:body` fragment.
#[cfg(test)]
pub(crate) fn build_docx(body: &str) -> Vec<u8> {
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
        .unwrap();
    zip.start_file(MAIN_PART, options).unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}
