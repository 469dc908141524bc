use super::EngineError;
use fst::{Automaton, IntoStreamer, Set, SetBuilder, Streamer};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// Sorted word list stored as an FST set.
pub struct Dictionary {
    set: Set<Vec<u8>>,
}

impl Dictionary {
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let bytes = fs::read(path).map_err(|e| {
            EngineError::Dictionary(format!("cannot read {}: {}", path.display(), e))
        })?;
        let set = Set::new(bytes).map_err(|e| {
            EngineError::Dictionary(format!("cannot parse {}: {}", path.display(), e))
        })?;

        Ok(Self { set })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.set.contains(word.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Get all words with a given prefix
    pub fn words_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut results = Vec::new();
        let mut stream = self
            .set
            .search(fst::automaton::Str::new(prefix).starts_with())
            .into_stream();

        while let Some(key) = stream.next() {
            if let Ok(word) = String::from_utf8(key.to_vec()) {
                results.push(word);
            }
        }

        results
    }

    /// Every word whose length is within one of `len`.
    ///
    /// Streams the whole set; only used for very short words.
    pub fn words_near_length(&self, len: usize, limit: usize) -> Vec<String> {
        let mut words = Vec::new();
        let mut stream = self.set.stream();

        while let Some(key) = stream.next() {
            if key.len().abs_diff(len) > 1 {
                continue;
            }
            if let Ok(word) = String::from_utf8(key.to_vec()) {
                words.push(word);
                if words.len() >= limit {
                    break;
                }
            }
        }

        words
    }

    /// Build dictionary from word list
    pub fn build_from_words(words: &[String], output_path: &Path) -> Result<(), EngineError> {
        let mut sorted_words = words.to_vec();
        sorted_words.sort();
        sorted_words.dedup();

        let file = File::create(output_path)?;
        let writer = BufWriter::new(file);
        let mut builder = SetBuilder::new(writer).map_err(dictionary_error)?;

        for word in sorted_words {
            builder.insert(word.as_bytes()).map_err(dictionary_error)?;
        }

        builder.finish().map_err(dictionary_error)?;

        Ok(())
    }
}

fn dictionary_error(err: fst::Error) -> EngineError {
    EngineError::Dictionary(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn build(words: &[&str]) -> (tempfile::TempDir, Dictionary) {
        let dir = tempdir().unwrap();
        let dict_path = dir.path().join("test.dict");
        let words: Vec<String> = words.iter().map(|s| s.to_string()).collect();
        Dictionary::build_from_words(&words, &dict_path).unwrap();
        let dict = Dictionary::load_from_path(&dict_path).unwrap();
        (dir, dict)
    }

    #[test]
    fn test_build_and_load_dictionary() {
        let (_dir, dict) = build(&["hello", "world", "test", "hello"]);
        assert!(dict.contains("hello"));
        assert!(dict.contains("world"));
        assert!(!dict.contains("notfound"));
        assert_eq!(dict.len(), 3);
    }

    #[test]
    fn test_prefix_and_length_queries() {
        let (_dir, dict) = build(&["cat", "catalog", "cattle", "dog", "a"]);
        assert_eq!(dict.words_with_prefix("cat"), vec!["cat", "catalog", "cattle"]);
        assert_eq!(dict.words_near_length(3, 10), vec!["cat", "dog"]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = Dictionary::load_from_path(&dir.path().join("none.dict"));
        assert!(matches!(result, Err(EngineError::Dictionary(_))));
    }
}
