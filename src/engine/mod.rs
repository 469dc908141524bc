pub mod dictionary;
pub mod hunspell;
pub mod native;
pub mod suggestions;

use crate::Config;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Opaque id of a document opened by a [`DocumentService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(pub u32);

/// A span the engine flagged, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedSpan {
    /// Index of the span within its document
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanLocation {
    pub page: u32,
    pub line: u32,
    pub start: u64,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("damaged document package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed document XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("dictionary error: {0}")]
    Dictionary(String),

    #[error("engine process error: {0}")]
    Process(String),

    #[error("unexpected engine response: {0}")]
    Protocol(String),

    #[error("no open document with handle {0:?}")]
    UnknownDocument(DocumentHandle),

    #[error("engine not started")]
    NotStarted,
}

/// A spell-checking engine that opens documents and reports flagged spans.
///
/// One instance serves one batch run: `start` once, any number of
/// `open`/`close` pairs, then `shutdown` once. Documents are only ever
/// read; `close` never persists anything.
pub trait DocumentService {
    fn name(&self) -> &'static str;

    fn start(&mut self) -> Result<(), EngineError>;

    fn open(&mut self, path: &Path) -> Result<DocumentHandle, EngineError>;

    fn flagged_spans(&mut self, doc: DocumentHandle) -> Result<Vec<FlaggedSpan>, EngineError>;

    fn span_location(
        &mut self,
        doc: DocumentHandle,
        span: &FlaggedSpan,
    ) -> Result<SpanLocation, EngineError>;

    fn suggestions(
        &mut self,
        doc: DocumentHandle,
        span: &FlaggedSpan,
    ) -> Result<Vec<String>, EngineError>;

    fn close(&mut self, doc: DocumentHandle);

    fn shutdown(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Built-in engine backed by an installed word list
    #[default]
    Native,
    /// External `hunspell -a` process
    Hunspell,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Native => write!(f, "native"),
            EngineKind::Hunspell => write!(f, "hunspell"),
        }
    }
}

/// Build the engine selected by `config`. Nothing is started yet.
pub fn create(config: &Config) -> Box<dyn DocumentService> {
    match config.engine {
        EngineKind::Native => Box::new(native::NativeEngine::new(config)),
        EngineKind::Hunspell => Box::new(hunspell::HunspellEngine::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_selects_engine() {
        let config = Config::default();
        assert_eq!(create(&config).name(), "native");

        let config = Config {
            engine: EngineKind::Hunspell,
            ..Default::default()
        };
        assert_eq!(create(&config).name(), "hunspell");
    }
}
