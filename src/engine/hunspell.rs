//! Engine backed by an external `hunspell -a` process.
//!
//! Hunspell speaks the ispell pipe protocol: after a version banner it
//! reads one line at a time and answers with one response line per word,
//! followed by an empty line. In terse mode (`!`) correct words produce no
//! output, so each answer only lists misspellings:
//!
//! ```text
//! & wrold 3 6: world, would, wold
//! # zxqv 12
//! ```
//!
//! Every line is sent with a leading `^` so text starting with `*`, `@`,
//! `#` and friends is never taken for a command.

use super::{DocumentHandle, DocumentService, EngineError, FlaggedSpan, SpanLocation};
use crate::document::docx::is_line_separator;
use crate::document::{utf16_len, LoadedDocument, TextLine};
use crate::Config;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const BANNER_PREFIX: &str = "@(#)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipeResponse {
    Correct,
    Misspelled {
        word: String,
        offset: usize,
        suggestions: Vec<String>,
    },
}

/// Parse one response line. Returns `None` for the empty terminator line.
pub fn parse_response(line: &str) -> Result<Option<PipeResponse>, EngineError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(tag) = line.chars().next() else {
        return Ok(None);
    };

    match tag {
        '*' | '+' | '-' => Ok(Some(PipeResponse::Correct)),
        '&' | '?' => {
            let (head, tail) = line
                .split_once(':')
                .ok_or_else(|| EngineError::Protocol(line.to_string()))?;
            let mut fields = head[1..].split_whitespace();
            let word = fields.next();
            let _count = fields.next();
            let offset = fields.next().and_then(|o| o.parse().ok());
            match (word, offset) {
                (Some(word), Some(offset)) => Ok(Some(PipeResponse::Misspelled {
                    word: word.to_string(),
                    offset,
                    suggestions: tail
                        .split(", ")
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect(),
                })),
                _ => Err(EngineError::Protocol(line.to_string())),
            }
        }
        '#' => {
            let mut fields = line[1..].split_whitespace();
            match (fields.next(), fields.next().and_then(|o| o.parse().ok())) {
                (Some(word), Some(offset)) => Ok(Some(PipeResponse::Misspelled {
                    word: word.to_string(),
                    offset,
                    suggestions: Vec::new(),
                })),
                _ => Err(EngineError::Protocol(line.to_string())),
            }
        }
        _ => Err(EngineError::Protocol(line.to_string())),
    }
}

/// Byte column of `word` in `text`, closest to the reported character
/// offset and not before `from`.
///
/// Hunspell versions disagree on whether offsets count the `^` prefix and
/// whether they count bytes or characters, so the reported offset is only
/// used to pick among occurrences.
pub fn resolve_column(text: &str, word: &str, reported: usize, from: usize) -> Option<usize> {
    text.match_indices(word)
        .map(|(idx, _)| idx)
        .filter(|&idx| idx >= from)
        .min_by_key(|&idx| text[..idx].chars().count().abs_diff(reported))
}

struct Process {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Process {
    fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(EngineError::Process("hunspell exited unexpectedly".to_string()));
        }
        Ok(line)
    }

    /// Send one line and collect its answer up to the empty terminator.
    ///
    /// The whole answer is consumed even when part of it cannot be parsed,
    /// so the next line starts on a clean pipe.
    fn check_line(&mut self, text: &str) -> Result<Vec<PipeResponse>, EngineError> {
        let text: String = text
            .chars()
            .map(|c| if is_line_separator(c) { ' ' } else { c })
            .collect();
        writeln!(self.stdin, "^{}", text)?;
        self.stdin.flush()?;

        let mut responses = Vec::new();
        let mut failure = None;
        loop {
            match parse_response(&self.read_line()?) {
                Ok(Some(response)) => responses.push(response),
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!("Unparsable hunspell output: {}", e);
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(responses),
        }
    }
}

struct Miss {
    text: String,
    location: SpanLocation,
    suggestions: Vec<String>,
}

struct OpenDocument {
    document: LoadedDocument,
    misses: Option<Vec<Miss>>,
}

pub struct HunspellEngine {
    command: PathBuf,
    args: Vec<String>,
    language: String,
    personal_dictionary: Option<PathBuf>,
    max_suggestions: usize,
    shutdown_timeout: Duration,
    process: Option<Process>,
    documents: HashMap<DocumentHandle, OpenDocument>,
    next_handle: u32,
}

impl HunspellEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            command: config.hunspell_command.clone(),
            args: config.hunspell_args.clone(),
            language: config.language.clone(),
            personal_dictionary: config.personal_dictionary.clone(),
            max_suggestions: config.max_suggestions,
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
            process: None,
            documents: HashMap::new(),
            next_handle: 1,
        }
    }

    fn spawn(&self) -> Result<Process, EngineError> {
        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .arg("-a")
            .arg("-i")
            .arg("utf-8")
            .arg("-d")
            .arg(&self.language);
        if let Some(personal) = self.personal_dictionary.as_ref().filter(|p| p.exists()) {
            command.arg("-p").arg(personal);
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                EngineError::Process(format!("cannot run {}: {}", self.command.display(), e))
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EngineError::Process("hunspell pipes unavailable".to_string()));
        };

        Ok(Process {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    fn handshake(process: &mut Process) -> Result<(), EngineError> {
        let banner = process.read_line()?;
        if !banner.starts_with(BANNER_PREFIX) {
            return Err(EngineError::Protocol(banner.trim_end().to_string()));
        }
        tracing::debug!("hunspell ready: {}", banner.trim_end());

        // Terse mode: only misspellings are reported
        writeln!(process.stdin, "!")?;
        process.stdin.flush()?;
        Ok(())
    }

    fn stop(process: Process, timeout: Duration) {
        let Process {
            mut child,
            stdin,
            stdout,
        } = process;
        // EOF on stdin makes hunspell exit on its own
        drop(stdin);
        drop(stdout);

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!("hunspell exited with {}", status);
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to poll hunspell: {}", e);
                    break;
                }
            }
        }

        tracing::warn!("hunspell did not exit in {:?}, killing it", timeout);
        if let Err(e) = child.kill() {
            tracing::warn!("Failed to kill hunspell: {}", e);
        }
        let _ = child.wait();
    }

    fn check_document(
        process: &mut Process,
        lines: &[TextLine],
    ) -> Result<Vec<Miss>, EngineError> {
        let mut misses = Vec::new();

        for line in lines {
            let mut from = 0;
            for response in process.check_line(&line.text)? {
                let PipeResponse::Misspelled {
                    word,
                    offset,
                    suggestions,
                } = response
                else {
                    continue;
                };

                let column = resolve_column(&line.text, &word, offset, from).ok_or_else(|| {
                    EngineError::Protocol(format!("'{}' not found in checked line", word))
                })?;
                from = column + word.len();

                misses.push(Miss {
                    location: SpanLocation {
                        page: line.page,
                        line: line.line,
                        start: line.start + utf16_len(&line.text[..column]),
                    },
                    text: word,
                    suggestions,
                });
            }
        }

        Ok(misses)
    }

    fn miss(&self, doc: DocumentHandle, span: &FlaggedSpan) -> Result<&Miss, EngineError> {
        self.documents
            .get(&doc)
            .ok_or(EngineError::UnknownDocument(doc))?
            .misses
            .as_ref()
            .and_then(|misses| misses.get(span.index))
            .ok_or_else(|| EngineError::Protocol(format!("no flagged span #{}", span.index)))
    }
}

impl DocumentService for HunspellEngine {
    fn name(&self) -> &'static str {
        "hunspell"
    }

    fn start(&mut self) -> Result<(), EngineError> {
        if self.process.is_some() {
            return Ok(());
        }

        let mut process = self.spawn()?;
        if let Err(e) = Self::handshake(&mut process) {
            Self::stop(process, self.shutdown_timeout);
            return Err(e);
        }

        self.process = Some(process);
        Ok(())
    }

    fn open(&mut self, path: &Path) -> Result<DocumentHandle, EngineError> {
        if self.process.is_none() {
            return Err(EngineError::NotStarted);
        }

        let document = LoadedDocument::load(path)?;
        let handle = DocumentHandle(self.next_handle);
        self.next_handle += 1;
        self.documents.insert(
            handle,
            OpenDocument {
                document,
                misses: None,
            },
        );
        Ok(handle)
    }

    fn flagged_spans(&mut self, doc: DocumentHandle) -> Result<Vec<FlaggedSpan>, EngineError> {
        let process = self.process.as_mut().ok_or(EngineError::NotStarted)?;
        let open = self
            .documents
            .get_mut(&doc)
            .ok_or(EngineError::UnknownDocument(doc))?;

        if open.misses.is_none() {
            open.misses = Some(Self::check_document(process, &open.document.lines)?);
        }

        Ok(open
            .misses
            .iter()
            .flatten()
            .enumerate()
            .map(|(index, miss)| FlaggedSpan {
                index,
                text: miss.text.clone(),
            })
            .collect())
    }

    fn span_location(
        &mut self,
        doc: DocumentHandle,
        span: &FlaggedSpan,
    ) -> Result<SpanLocation, EngineError> {
        Ok(self.miss(doc, span)?.location)
    }

    fn suggestions(
        &mut self,
        doc: DocumentHandle,
        span: &FlaggedSpan,
    ) -> Result<Vec<String>, EngineError> {
        let max = self.max_suggestions;
        Ok(self
            .miss(doc, span)?
            .suggestions
            .iter()
            .take(max)
            .cloned()
            .collect())
    }

    fn close(&mut self, doc: DocumentHandle) {
        self.documents.remove(&doc);
    }

    fn shutdown(&mut self) {
        self.documents.clear();
        if let Some(process) = self.process.take() {
            Self::stop(process, self.shutdown_timeout);
        }
    }
}

impl Drop for HunspellEngine {
    fn drop(&mut self) {
        if self.process.is_some() {
            tracing::warn!("hunspell engine dropped without shutdown");
            self.shutdown();
        }
    }
}
