use super::adapter::scan_document;
use super::enumerate::find_documents;
use crate::engine::{DocumentHandle, DocumentService};
use crate::{Error, Result, SpellError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Enumerating,
    SessionStarting,
    ProcessingFile,
    SessionClosing,
    Done,
    Aborted,
}

/// Sent after each file, whether it was checked or skipped.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub current: usize,
    pub total: usize,
    pub file: &'a Path,
}

#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub records: Vec<SpellError>,
    pub files_total: usize,
    pub files_processed: usize,
    pub failures: Vec<FileFailure>,
    pub cancelled: bool,
}

/// Runs one batch against one engine session.
///
/// The pipeline borrows the engine mutably for its whole life, so a
/// session can never serve two runs at once.
pub struct Pipeline<'s> {
    service: &'s mut dyn DocumentService,
    extensions: Vec<String>,
    cancel: Option<Arc<AtomicBool>>,
    state: BatchState,
}

impl<'s> Pipeline<'s> {
    pub fn new(service: &'s mut dyn DocumentService, extensions: &[String]) -> Self {
        Self {
            service,
            extensions: extensions.to_vec(),
            cancel: None,
            state: BatchState::Idle,
        }
    }

    /// Remaining files are skipped once `flag` is set; checked between files.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn run<F>(&mut self, root: &Path, mut on_progress: F) -> Result<BatchReport>
    where
        F: FnMut(Progress<'_>),
    {
        set_state(&mut self.state, BatchState::Enumerating);
        let files = match find_documents(root, &self.extensions) {
            Ok(files) => files,
            Err(e) => {
                set_state(&mut self.state, BatchState::Aborted);
                return Err(e);
            }
        };
        tracing::info!("Found {} document(s) under {}", files.len(), root.display());

        set_state(&mut self.state, BatchState::SessionStarting);
        let engine = self.service.name();
        if let Err(source) = self.service.start() {
            set_state(&mut self.state, BatchState::Aborted);
            return Err(Error::ServiceUnavailable { engine, source });
        }

        let mut report = BatchReport {
            files_total: files.len(),
            ..Default::default()
        };

        {
            let mut session = Session::new(&mut *self.service);

            for (idx, path) in files.iter().enumerate() {
                if self.cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed)) {
                    tracing::info!("Cancelled, skipping {} remaining file(s)", files.len() - idx);
                    report.cancelled = true;
                    break;
                }

                set_state(&mut self.state, BatchState::ProcessingFile);
                process_file(session.service(), path, &mut report);
                report.files_processed += 1;

                on_progress(Progress {
                    current: idx + 1,
                    total: files.len(),
                    file: path,
                });
            }

            set_state(&mut self.state, BatchState::SessionClosing);
        }

        set_state(&mut self.state, BatchState::Done);
        Ok(report)
    }
}

fn set_state(state: &mut BatchState, next: BatchState) {
    if *state != next {
        tracing::debug!("Batch {:?} -> {:?}", state, next);
        *state = next;
    }
}

/// Open, scan and close one file. Failures are logged and recorded, never returned.
fn process_file(service: &mut dyn DocumentService, path: &Path, report: &mut BatchReport) {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let handle = match service.open(path) {
        Ok(handle) => handle,
        Err(source) => {
            tracing::warn!("Error opening file {}: {}", file_name, source);
            report.failures.push(FileFailure {
                path: path.to_path_buf(),
                error: Error::DocumentOpen {
                    path: path.to_path_buf(),
                    source,
                },
            });
            return;
        }
    };

    let mut document = OpenDocument::new(service, handle);
    let before = report.records.len();
    match scan_document(document.service(), handle, &file_name, &mut report.records) {
        Ok(count) => tracing::debug!("{}: {} misspelling(s)", file_name, count),
        Err(source) => {
            tracing::warn!(
                "Error checking file {}: {} (kept {} record(s))",
                file_name,
                source,
                report.records.len() - before
            );
            report.failures.push(FileFailure {
                path: path.to_path_buf(),
                error: Error::Scan {
                    path: path.to_path_buf(),
                    source,
                },
            });
        }
    }
}

/// Shuts the engine down when dropped, including during unwinding.
struct Session<'a> {
    service: &'a mut dyn DocumentService,
}

impl<'a> Session<'a> {
    fn new(service: &'a mut dyn DocumentService) -> Self {
        Self { service }
    }

    fn service(&mut self) -> &mut dyn DocumentService {
        &mut *self.service
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        tracing::debug!("Shutting down {} engine", self.service.name());
        self.service.shutdown();
    }
}

/// Closes the document, without saving, when dropped.
struct OpenDocument<'a> {
    service: &'a mut dyn DocumentService,
    handle: DocumentHandle,
}

impl<'a> OpenDocument<'a> {
    fn new(service: &'a mut dyn DocumentService, handle: DocumentHandle) -> Self {
        Self { service, handle }
    }

    fn service(&mut self) -> &mut dyn DocumentService {
        &mut *self.service
    }
}

impl Drop for OpenDocument<'_> {
    fn drop(&mut self) {
        self.service.close(self.handle);
    }
}
