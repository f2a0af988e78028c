use nota_engine::{
    FsStore, Grammar, GrammarError, ParseOptions, Parser, StoreError,
    io::DEFAULT_EXTENSION,
    parsing::{DEFAULT_LOOKAHEAD, DEFAULT_TAB_WIDTH},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the default notes directory.
pub const NOTES_HOME_VAR: &str = "NOTA_HOME";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub notes_path: PathBuf,
    /// Extension of note files, with or without the leading dot.
    pub extension: String,
    pub parser: ParserSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Scanner window in bytes.
    pub lookahead: usize,
    /// Columns per tab stop.
    pub tab_width: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            lookahead: DEFAULT_LOOKAHEAD,
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notes_path: Self::default_notes_path(),
            extension: DEFAULT_EXTENSION.to_string(),
            parser: ParserSettings::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded notes path
        config.notes_path = Self::expand_path(&config.notes_path).unwrap_or(config.notes_path);
        config.validate()?;

        log::debug!("loaded config from {}", config_path.display());
        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Loads the config file, falling back to defaults when there is none.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/nota");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// `$NOTA_HOME` if set, otherwise `~/.nota`.
    pub fn default_notes_path() -> PathBuf {
        match std::env::var(NOTES_HOME_VAR) {
            Ok(home) if !home.is_empty() => PathBuf::from(home),
            _ => PathBuf::from(shellexpand::tilde("~/.nota").as_ref()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parser.lookahead == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "parser.lookahead",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.parser.tab_width == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "parser.tab_width",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::InvalidSetting {
                field: "extension",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            lookahead: self.parser.lookahead,
            tab_width: self.parser.tab_width,
        }
    }

    /// A Nota parser running with these settings.
    pub fn parser(&self) -> Result<Parser, GrammarError> {
        Parser::new(Grammar::nota()?, self.parse_options())
    }

    /// Opens the configured notes directory.
    pub fn open_store(&self) -> Result<FsStore, StoreError> {
        FsStore::open(&self.notes_path, &self.extension)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
