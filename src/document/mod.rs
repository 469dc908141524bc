//! Text stream of a word-processing document.
//!
//! Engines do not read documents themselves: they ask this module for the
//! document's lines, each tagged with the page it sits on, its line number
//! within that page, and the character offset of its first character in
//! the whole document.

pub mod docx;

use crate::engine::EngineError;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use unicode_segmentation::UnicodeSegmentation;

/// Compound File Binary signature: legacy `.doc` and encrypted OOXML packages.
const CFB_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub page: u32,
    /// 1-based, restarts on every page
    pub line: u32,
    /// Offset of the first character, in UTF-16 units
    pub start: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpan {
    pub text: String,
    pub page: u32,
    pub line: u32,
    pub position: u64,
    /// Byte offset within the line's text
    pub column: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub lines: Vec<TextLine>,
}

impl LoadedDocument {
    /// Read a document from disk. The file is opened read-only and never written.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let bytes = fs::read(path)?;

        if bytes.starts_with(&CFB_MAGIC) {
            return Err(EngineError::UnsupportedFormat(
                "legacy binary or encrypted Word document".to_string(),
            ));
        }
        if !bytes.starts_with(&ZIP_MAGIC) {
            return Err(EngineError::UnsupportedFormat(
                "not an Office Open XML package".to_string(),
            ));
        }

        let lines = docx::read_lines(Cursor::new(bytes))?;
        Ok(Self {
            path: path.to_path_buf(),
            lines,
        })
    }

    /// Every word of the document in reading order.
    pub fn words(&self) -> Vec<WordSpan> {
        self.lines.iter().flat_map(line_words).collect()
    }
}

/// Split one line into words, keeping their document offsets.
pub fn line_words(line: &TextLine) -> Vec<WordSpan> {
    let mut words = Vec::new();
    let mut offset = line.start;
    let mut consumed = 0;

    for (idx, token) in line.text.split_word_bound_indices() {
        offset += utf16_len(&line.text[consumed..idx]);
        consumed = idx;

        if token.chars().any(char::is_alphabetic) {
            words.push(WordSpan {
                text: token.to_string(),
                page: line.page,
                line: line.line,
                position: offset,
                column: idx,
            });
        }
    }

    words
}

pub fn utf16_len(text: &str) -> u64 {
    text.chars().map(|c| c.len_utf16() as u64).sum()
}
