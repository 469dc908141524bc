//! Folder scan: find documents, check each one, collect the records.

pub mod adapter;
pub mod enumerate;
pub mod pipeline;

pub use adapter::scan_document;
pub use enumerate::find_documents;
pub use pipeline::{BatchReport, BatchState, FileFailure, Pipeline, Progress};
