use crate::engine::dictionary::Dictionary;
use crate::Config;
use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

// Pinned commit so a given version always yields the same word list
const WORDLIST_BASE_URL: &str =
    "https://raw.githubusercontent.com/dwyl/english-words/6e4bc58ad764c3e6df8b5be4048671962c9d6a23";
const WORDLIST_VERSION: &str = "2023.12";

fn data_dir() -> Result<PathBuf> {
    Config::data_dir().context("Failed to get data directory")
}

fn installed_languages(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut languages = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) != Some("dict") {
            continue;
        }
        if let Some(language) = path.file_stem().and_then(|s| s.to_str()) {
            languages.push((language.to_string(), path.clone()));
        }
    }
    languages.sort();
    Ok(languages)
}

pub fn list_dictionaries() -> Result<()> {
    let data_dir = data_dir()?;
    let languages = if data_dir.exists() {
        installed_languages(&data_dir)?
    } else {
        Vec::new()
    };

    if languages.is_empty() {
        println!("{}", "No dictionaries installed.".yellow());
        println!(
            "Run {} to download a dictionary.",
            "spellguard dict download en_US".cyan()
        );
        return Ok(());
    }

    println!("{}", "Installed dictionaries:".bold());
    println!();
    for (language, path) in languages {
        let size_kb = fs::metadata(&path)?.len() / 1024;
        println!(
            "  {} {} ({})",
            "✓".green(),
            language.cyan().bold(),
            format!("{}KB", size_kb).dimmed()
        );
    }
    println!();
    println!("Data directory: {}", data_dir.display().to_string().dimmed());

    Ok(())
}

/// Normalize a raw word list: one lowercase word per line, no blanks or
/// single letters.
pub fn parse_wordlist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|word| word.chars().count() > 1 && !word.starts_with('#'))
        .collect()
}

fn default_source(language: &str) -> Result<String> {
    match language {
        "en_US" | "en_GB" => Ok(format!("{}/words_alpha.txt", WORDLIST_BASE_URL)),
        other => anyhow::bail!(
            "No built-in word list for '{}'. Pass --from with a URL or file.",
            other
        ),
    }
}

fn fetch(source: &str) -> Result<String> {
    if !(source.starts_with("http://") || source.starts_with("https://")) {
        return fs::read_to_string(source)
            .with_context(|| format!("Failed to read word list: {}", source));
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Downloading...");

    let response = reqwest::blocking::get(source).context("Failed to download dictionary")?;
    if !response.status().is_success() {
        pb.finish_and_clear();
        anyhow::bail!("Failed to download dictionary: HTTP {}", response.status());
    }
    let content = response.text()?;
    pb.finish_with_message("Download complete");

    Ok(content)
}

/// Build `<dir>/<language>.dict` from a word list. Returns the word count.
pub fn install_wordlist(content: &str, language: &str, dir: &Path) -> Result<(PathBuf, usize)> {
    let words = parse_wordlist(content);
    if words.is_empty() {
        anyhow::bail!("Word list for '{}' is empty", language);
    }

    fs::create_dir_all(dir).context("Failed to create data directory")?;
    let dict_path = dir.join(format!("{}.dict", language));
    Dictionary::build_from_words(&words, &dict_path)?;

    Ok((dict_path, words.len()))
}

pub fn download_dictionary(language: &str, source: Option<&str>) -> Result<()> {
    let source = match source {
        Some(source) => source.to_string(),
        None => default_source(language)?,
    };

    println!(
        "{} dictionary for {} (version: {})...",
        "Installing".cyan().bold(),
        language.yellow(),
        WORDLIST_VERSION.dimmed()
    );
    println!("Source: {}", source.dimmed());

    let content = fetch(&source)?;
    println!("{}", "Building dictionary...".cyan());
    let (dict_path, count) = install_wordlist(&content, language, &data_dir()?)?;

    println!("Found {} words", count.to_string().yellow());
    println!(
        "{} Dictionary installed: {}",
        "✓".green().bold(),
        dict_path.display().to_string().cyan()
    );

    Ok(())
}

pub fn update_dictionaries() -> Result<()> {
    let data_dir = data_dir()?;
    let languages = if data_dir.exists() {
        installed_languages(&data_dir)?
    } else {
        Vec::new()
    };

    if languages.is_empty() {
        println!("{}", "No dictionaries to update.".yellow());
        return Ok(());
    }

    let mut skipped = 0;
    for (language, _) in &languages {
        // Custom word lists have no known source to refresh from
        if default_source(language).is_err() {
            println!("{} {} (custom word list)", "Skipping".dimmed(), language);
            skipped += 1;
            continue;
        }
        download_dictionary(language, None)?;
        println!();
    }

    println!(
        "{} {} of {} dictionaries updated",
        "✓".green().bold(),
        languages.len() - skipped,
        languages.len()
    );

    Ok(())
}

pub fn show_info(language: &str, dictionary: Option<&Path>) -> Result<()> {
    let dict_path = match dictionary {
        Some(path) => path.to_path_buf(),
        None => data_dir()?.join(format!("{}.dict", language)),
    };

    if !dict_path.exists() {
        println!(
            "{} Dictionary for {} not found.",
            "✗".red().bold(),
            language.yellow()
        );
        println!(
            "Run {} to download it.",
            format!("spellguard dict download {}", language).cyan()
        );
        return Ok(());
    }

    let metadata = fs::metadata(&dict_path)?;

    println!("{}", format!("Dictionary: {}", language).bold());
    println!("  Path: {}", dict_path.display());
    println!("  Size: {} KB", metadata.len() / 1024);
    println!("  Format: FST (Finite State Transducer)");

    match Dictionary::load_from_path(&dict_path) {
        Ok(dict) => println!("  Words: {}", dict.len()),
        Err(e) => println!("  {}: {}", "Error loading dictionary".red(), e),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_wordlist() {
        let words = parse_wordlist("Hello\n\n  world \nA\n# comment\nÜber\n");
        assert_eq!(words, vec!["hello", "world", "über"]);
    }

    #[test]
    fn test_install_wordlist_builds_loadable_dictionary() {
        let dir = tempdir().unwrap();
        let (path, count) = install_wordlist("zebra\napple\napple\n", "xx_XX", dir.path()).unwrap();

        assert_eq!(path, dir.path().join("xx_XX.dict"));
        assert_eq!(count, 3);
        let dict = Dictionary::load_from_path(&path).unwrap();
        assert!(dict.contains("apple"));
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_empty_wordlist_is_rejected() {
        let dir = tempdir().unwrap();
        assert!(install_wordlist("\n\n", "xx_XX", dir.path()).is_err());
    }

    #[test]
    fn test_only_english_has_builtin_source() {
        assert!(default_source("en_US").unwrap().ends_with("words_alpha.txt"));
        assert!(default_source("fr_FR").is_err());
    }

    #[test]
    fn test_fetch_local_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.txt");
        fs::write(&path, "one\ntwo\n").unwrap();
        assert_eq!(fetch(&path.display().to_string()).unwrap(), "one\ntwo\n");
    }
}
