use crate::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Prefix of the owner/lock files Word leaves next to open documents
const LOCK_FILE_PREFIX: &str = "~$";

/// Every document under `root` whose extension is in `extensions`, sorted.
pub fn find_documents(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::NotFound(root.to_path_buf()));
    }

    let extensions: Vec<String> = extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();

    let mut documents = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() && is_document(entry.path(), &extensions) {
            documents.push(entry.into_path());
        }
    }

    if documents.is_empty() {
        return Err(Error::NoMatchingFiles(root.to_path_buf()));
    }

    documents.sort();
    Ok(documents)
}

fn is_document(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with(LOCK_FILE_PREFIX) {
        return false;
    }

    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_extensions;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_finds_documents_recursively() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("b.docx"));
        touch(&dir.path().join("a.DOC"));
        touch(&dir.path().join("nested/deeper/c.docm"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("sheet.xlsx"));
        touch(&dir.path().join("~$b.docx"));

        let found = find_documents(dir.path(), &default_extensions()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            names,
            vec![
                PathBuf::from("a.DOC"),
                PathBuf::from("b.docx"),
                PathBuf::from("nested/deeper/c.docm"),
            ]
        );
    }

    #[test]
    fn test_missing_root() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            find_documents(&missing, &default_extensions()),
            Err(Error::NotFound(p)) if p == missing
        ));
    }

    #[test]
    fn test_root_is_a_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.docx");
        touch(&file);
        assert!(matches!(
            find_documents(&file, &default_extensions()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_no_matching_files() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("readme.md"));
        assert!(matches!(
            find_documents(dir.path(), &default_extensions()),
            Err(Error::NoMatchingFiles(_))
        ));
    }

    #[test]
    fn test_custom_extensions_accept_dots() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.odt"));
        touch(&dir.path().join("b.docx"));

        let found = find_documents(dir.path(), &[".odt".to_string()]).unwrap();
        assert_eq!(found, vec![dir.path().join("a.odt")]);
    }
}
