pub mod cli;
pub mod config;
pub mod dict;
pub mod document;
pub mod engine;
pub mod error;
pub mod export;
pub mod scan;

pub use config::Config;
pub use engine::DocumentService;
pub use error::{Error, Result};
pub use scan::pipeline::{BatchReport, Pipeline, Progress};

use serde::{Deserialize, Serialize};

/// One flagged span in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellError {
    pub document_file_name: String,
    pub misspelled_text: String,
    pub page_number: u32,
    pub line_number: u32,
    pub position: u64,
    pub suggested_words: String,
}

impl SpellError {
    /// Column names, in field order, used for every tabular rendering.
    pub const COLUMNS: [&'static str; 6] = [
        "documentFileName",
        "misspelledText",
        "pageNumber",
        "lineNumber",
        "position",
        "suggestedWords",
    ];
}
