use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::EngineKind;

pub const LOCAL_CONFIG_FILE: &str = ".spellguard.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineKind,
    pub language: String,

    /// Word list for the native engine; defaults to `<data_dir>/<language>.dict`
    pub dictionary: Option<PathBuf>,
    pub personal_dictionary: Option<PathBuf>,
    pub ignore_patterns: Vec<String>,
    pub max_suggestions: usize,
    /// Unset means case-insensitive; kept optional so a config file that
    /// omits it does not override one that sets it
    pub case_sensitive: Option<bool>,

    /// File extensions (without the dot) picked up by the folder scan
    pub extensions: Vec<String>,

    pub hunspell_command: PathBuf,
    /// Extra arguments placed before `-a`
    pub hunspell_args: Vec<String>,
    pub shutdown_timeout_ms: u64,
}

fn default_max_suggestions() -> usize {
    5
}

pub fn default_extensions() -> Vec<String> {
    ["doc", "docx", "docm"].iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineKind::Native,
            language: "en_US".to_string(),
            dictionary: None,
            personal_dictionary: None,
            ignore_patterns: vec![
                r"\b[A-Z0-9_]{2,}\b".to_string(),    // ALL_CAPS
                r"https?://\S+".to_string(),         // URLs
                r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}".to_string(), // Emails
            ],
            max_suggestions: default_max_suggestions(),
            case_sensitive: None,
            extensions: default_extensions(),
            hunspell_command: PathBuf::from("hunspell"),
            hunspell_args: Vec::new(),
            shutdown_timeout_ms: 2000,
        }
    }
}

/// Values given on the command line. `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub engine: Option<EngineKind>,
    pub language: Option<String>,
    pub dictionary: Option<PathBuf>,
    pub personal_dictionary: Option<PathBuf>,
    pub ignore_patterns: Vec<String>,
    pub max_suggestions: Option<usize>,
    pub hunspell_command: Option<PathBuf>,
}

impl Config {
    /// Load configuration with priority: CLI args > local config > global config > defaults
    pub fn load(overrides: Overrides) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global_config = Self::from_file(&global_path)?;
                config = config.merge(global_config);
            }
        }

        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            let local_config = Self::from_file(&local_path)?;
            config = config.merge(local_config);
        }

        config = config.apply(overrides);

        if config.personal_dictionary.is_none() {
            config.personal_dictionary =
                Self::default_personal_dict_path().filter(|path| path.exists());
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn merge(mut self, other: Self) -> Self {
        // other's values override self's if they differ from defaults
        let defaults = Self::default();
        if other.engine != defaults.engine {
            self.engine = other.engine;
        }
        if other.language != defaults.language {
            self.language = other.language;
        }
        if other.dictionary.is_some() {
            self.dictionary = other.dictionary;
        }
        if other.personal_dictionary.is_some() {
            self.personal_dictionary = other.personal_dictionary;
        }
        if other.ignore_patterns != defaults.ignore_patterns {
            self.ignore_patterns = other.ignore_patterns;
        }
        if other.max_suggestions != defaults.max_suggestions {
            self.max_suggestions = other.max_suggestions;
        }
        if !other.extensions.is_empty() && other.extensions != defaults.extensions {
            self.extensions = other.extensions;
        }
        if other.hunspell_command != defaults.hunspell_command {
            self.hunspell_command = other.hunspell_command;
        }
        if !other.hunspell_args.is_empty() {
            self.hunspell_args = other.hunspell_args;
        }
        if other.shutdown_timeout_ms != defaults.shutdown_timeout_ms {
            self.shutdown_timeout_ms = other.shutdown_timeout_ms;
        }
        if other.case_sensitive.is_some() {
            self.case_sensitive = other.case_sensitive;
        }
        self
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(engine) = overrides.engine {
            self.engine = engine;
        }
        if let Some(language) = overrides.language {
            self.language = language;
        }
        if let Some(dict) = overrides.dictionary {
            self.dictionary = Some(dict);
        }
        if let Some(dict) = overrides.personal_dictionary {
            self.personal_dictionary = Some(dict);
        }
        self.ignore_patterns.extend(overrides.ignore_patterns);
        if let Some(max) = overrides.max_suggestions {
            self.max_suggestions = max;
        }
        if let Some(command) = overrides.hunspell_command {
            self.hunspell_command = command;
        }
        self
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.extensions.iter().all(|ext| ext.trim_start_matches('.').is_empty()) {
            return Err(crate::Error::Config(
                "at least one document extension is required".to_string(),
            ));
        }
        for pattern in &self.ignore_patterns {
            regex::Regex::new(pattern).map_err(|e| {
                crate::Error::Config(format!("invalid ignore pattern '{}': {}", pattern, e))
            })?;
        }
        Ok(())
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive.unwrap_or(false)
    }

    /// Word list the native engine loads for this configuration.
    pub fn dictionary_path(&self) -> Option<PathBuf> {
        self.dictionary.clone().or_else(|| {
            Self::data_dir().map(|dir| dir.join(format!("{}.dict", self.language)))
        })
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spellguard").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn default_personal_dict_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spellguard").map(|dirs| dirs.config_dir().join("personal.txt"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spellguard").map(|dirs| dirs.data_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.language, "en_US");
        assert_eq!(config.engine, EngineKind::Native);
        assert_eq!(config.max_suggestions, 5);
        assert_eq!(config.extensions, vec!["doc", "docx", "docm"]);
    }

    #[test]
    fn test_merge_configs() {
        let base = Config::default();
        let override_config = Config {
            language: "en_GB".to_string(),
            engine: EngineKind::Hunspell,
            ..Default::default()
        };

        let merged = base.merge(override_config);
        assert_eq!(merged.language, "en_GB");
        assert_eq!(merged.engine, EngineKind::Hunspell);
        assert_eq!(merged.max_suggestions, 5);
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = Config::default().apply(Overrides {
            language: Some("de_DE".to_string()),
            max_suggestions: Some(2),
            ignore_patterns: vec!["foo".to_string()],
            ..Default::default()
        });
        assert_eq!(config.language, "de_DE");
        assert_eq!(config.max_suggestions, 2);
        assert_eq!(config.ignore_patterns.last().map(String::as_str), Some("foo"));
    }

    #[test]
    fn test_case_sensitivity_survives_file_that_omits_it() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let local = dir.path().join("local.toml");
        fs::write(&global, "case_sensitive = true\n").unwrap();
        fs::write(&local, "max_suggestions = 3\n").unwrap();

        let config = Config::default()
            .merge(Config::from_file(&global).unwrap())
            .merge(Config::from_file(&local).unwrap());
        assert!(config.is_case_sensitive());
        assert_eq!(config.max_suggestions, 3);

        fs::write(&local, "case_sensitive = false\n").unwrap();
        let config = Config::default()
            .merge(Config::from_file(&global).unwrap())
            .merge(Config::from_file(&local).unwrap());
        assert!(!config.is_case_sensitive());
    }

    #[test]
    fn test_partial_toml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "engine = \"hunspell\"\nmax_suggestions = 3\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.engine, EngineKind::Hunspell);
        assert_eq!(config.max_suggestions, 3);
        assert_eq!(config.language, "en_US");
    }

    #[test]
    fn test_validate_rejects_bad_pattern() {
        let config = Config::default().apply(Overrides {
            ignore_patterns: vec!["([unclosed".to_string()],
            ..Default::default()
        });
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_explicit_dictionary_path() {
        let config = Config {
            dictionary: Some(PathBuf::from("/tmp/words.dict")),
            ..Default::default()
        };
        assert_eq!(config.dictionary_path(), Some(PathBuf::from("/tmp/words.dict")));
    }
}
