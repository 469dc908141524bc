use super::dictionary::Dictionary;
use super::{
    suggestions, DocumentHandle, DocumentService, EngineError, FlaggedSpan, SpanLocation,
};
use crate::document::{line_words, LoadedDocument, WordSpan};
use crate::Config;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffixes accepted after an apostrophe when the stem is a known word.
const CONTRACTION_SUFFIXES: [&str; 7] = ["s", "t", "d", "m", "ll", "re", "ve"];

/// In-process engine: FST word list, personal dictionary, ignore patterns.
pub struct NativeEngine {
    dictionary_path: Option<PathBuf>,
    personal_dictionary: Option<PathBuf>,
    ignore_patterns: Vec<String>,
    max_suggestions: usize,
    case_sensitive: bool,
    session: Option<Session>,
}

struct Session {
    dictionary: Dictionary,
    personal_words: HashSet<String>,
    ignore_patterns: Vec<Regex>,
    documents: HashMap<DocumentHandle, OpenDocument>,
    next_handle: u32,
}

struct OpenDocument {
    document: LoadedDocument,
    flagged: Vec<WordSpan>,
}

impl NativeEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            dictionary_path: config.dictionary_path(),
            personal_dictionary: config.personal_dictionary.clone(),
            ignore_patterns: config.ignore_patterns.clone(),
            max_suggestions: config.max_suggestions,
            case_sensitive: config.is_case_sensitive(),
            session: None,
        }
    }

    fn session(&mut self) -> Result<&mut Session, EngineError> {
        self.session.as_mut().ok_or(EngineError::NotStarted)
    }

    fn document(&mut self, doc: DocumentHandle) -> Result<&mut OpenDocument, EngineError> {
        self.session()?
            .documents
            .get_mut(&doc)
            .ok_or(EngineError::UnknownDocument(doc))
    }

    fn flagged_word(
        &mut self,
        doc: DocumentHandle,
        span: &FlaggedSpan,
    ) -> Result<WordSpan, EngineError> {
        self.document(doc)?
            .flagged
            .get(span.index)
            .cloned()
            .ok_or_else(|| EngineError::Protocol(format!("no flagged span #{}", span.index)))
    }
}

impl Session {
    fn is_known(&self, word: &str, case_sensitive: bool) -> bool {
        let lower = word.to_lowercase();
        if self.personal_words.contains(&lower) {
            return true;
        }

        let known = |w: &str| {
            if case_sensitive {
                self.dictionary.contains(w)
                    || (is_title_case(w) && self.dictionary.contains(&w.to_lowercase()))
            } else {
                self.dictionary.contains(&w.to_lowercase())
            }
        };

        if known(word) {
            return true;
        }

        // don't, we're, John's
        let normalized = word.replace('\u{2019}', "'");
        if let Some((stem, suffix)) = normalized.split_once('\'') {
            return !stem.is_empty()
                && CONTRACTION_SUFFIXES.contains(&suffix.to_lowercase().as_str())
                && known(stem);
        }

        false
    }

    fn should_ignore(&self, word: &str) -> bool {
        // Skip single characters
        if word.chars().count() <= 1 {
            return true;
        }

        // Skip anything carrying digits
        word.chars().any(|c| c.is_numeric())
    }

    fn flag(&self, document: &LoadedDocument, case_sensitive: bool) -> Vec<WordSpan> {
        let mut flagged = Vec::new();

        for line in &document.lines {
            let ignored: Vec<(usize, usize)> = self
                .ignore_patterns
                .iter()
                .flat_map(|re| re.find_iter(&line.text).map(|m| (m.start(), m.end())))
                .collect();

            for word in line_words(line) {
                let end = word.column + word.text.len();
                if ignored.iter().any(|&(s, e)| word.column < e && s < end) {
                    continue;
                }
                if self.should_ignore(&word.text) || self.is_known(&word.text, case_sensitive) {
                    continue;
                }
                flagged.push(word);
            }
        }

        flagged
    }
}

fn is_title_case(word: &str) -> bool {
    let mut chars = word.chars();
    chars.next().is_some_and(char::is_uppercase) && chars.all(|c| !c.is_uppercase())
}

fn load_personal_words(path: &Path) -> Result<HashSet<String>, EngineError> {
    let content = fs::read_to_string(path).map_err(|e| {
        EngineError::Dictionary(format!(
            "cannot read personal dictionary {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|word| !word.is_empty() && !word.starts_with('#'))
        .map(str::to_lowercase)
        .collect())
}

impl DocumentService for NativeEngine {
    fn name(&self) -> &'static str {
        "native"
    }

    fn start(&mut self) -> Result<(), EngineError> {
        if self.session.is_some() {
            return Ok(());
        }

        let path = self.dictionary_path.clone().ok_or_else(|| {
            EngineError::Dictionary("no dictionary location could be determined".to_string())
        })?;
        if !path.exists() {
            return Err(EngineError::Dictionary(format!(
                "{} is not installed (run `spellguard dict download`)",
                path.display()
            )));
        }
        let dictionary = Dictionary::load_from_path(&path)?;

        let personal_words = match &self.personal_dictionary {
            Some(path) if path.exists() => load_personal_words(path)?,
            _ => HashSet::new(),
        };

        let mut ignore_patterns = Vec::new();
        for pattern in &self.ignore_patterns {
            match Regex::new(pattern) {
                Ok(re) => ignore_patterns.push(re),
                Err(e) => tracing::warn!("Invalid ignore pattern '{}': {}", pattern, e),
            }
        }

        tracing::debug!(
            "Native engine loaded {} words from {}",
            dictionary.len(),
            path.display()
        );

        self.session = Some(Session {
            dictionary,
            personal_words,
            ignore_patterns,
            documents: HashMap::new(),
            next_handle: 1,
        });
        Ok(())
    }

    fn open(&mut self, path: &Path) -> Result<DocumentHandle, EngineError> {
        let case_sensitive = self.case_sensitive;
        let session = self.session()?;

        let document = LoadedDocument::load(path)?;
        let flagged = session.flag(&document, case_sensitive);

        let handle = DocumentHandle(session.next_handle);
        session.next_handle += 1;
        session
            .documents
            .insert(handle, OpenDocument { document, flagged });

        Ok(handle)
    }

    fn flagged_spans(&mut self, doc: DocumentHandle) -> Result<Vec<FlaggedSpan>, EngineError> {
        let open = self.document(doc)?;
        Ok(open
            .flagged
            .iter()
            .enumerate()
            .map(|(index, word)| FlaggedSpan {
                index,
                text: word.text.clone(),
            })
            .collect())
    }

    fn span_location(
        &mut self,
        doc: DocumentHandle,
        span: &FlaggedSpan,
    ) -> Result<SpanLocation, EngineError> {
        let word = self.flagged_word(doc, span)?;
        Ok(SpanLocation {
            page: word.page,
            line: word.line,
            start: word.position,
        })
    }

    fn suggestions(
        &mut self,
        doc: DocumentHandle,
        span: &FlaggedSpan,
    ) -> Result<Vec<String>, EngineError> {
        let word = self.flagged_word(doc, span)?;
        let max = self.max_suggestions;
        let session = self.session()?;
        Ok(suggestions::generate(
            &word.text.to_lowercase(),
            &session.dictionary,
            max,
        ))
    }

    fn close(&mut self, doc: DocumentHandle) {
        if let Some(session) = self.session.as_mut() {
            if let Some(open) = session.documents.remove(&doc) {
                tracing::trace!("Closed {}", open.document.path.display());
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            if !session.documents.is_empty() {
                tracing::warn!(
                    "Native engine shut down with {} document(s) still open",
                    session.documents.len()
                );
            }
        }
    }
}
