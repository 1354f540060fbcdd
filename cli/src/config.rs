//! `shelfmark.toml`: settings for the command-line front end.
//!
//! Every key is optional:
//!
//! ```toml
//! data_file = "shelfmark.json"   # JSON snapshot of the store
//! actor     = "system"           # recorded on every audit entry
//! page_size = 10                 # default --limit for list and search
//! log_level = "warn"             # used when RUST_LOG is unset
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use shelfmark_contracts::{
    error::{LedgerError, LedgerResult},
    search::DEFAULT_PAGE_SIZE,
};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "shelfmark.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub data_file: PathBuf,
    pub actor: String,
    pub page_size: usize,
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("shelfmark.json"),
            actor: "system".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            log_level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    /// Returns `LedgerError::Config` for malformed TOML or unknown keys.
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        let config: CliConfig = toml::from_str(s).map_err(|e| LedgerError::Config {
            reason: format!("failed to parse config TOML: {}", e),
        })?;
        if config.actor.trim().is_empty() {
            return Err(LedgerError::Config {
                reason: "actor must not be empty".to_string(),
            });
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::Config {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load `explicit` if given (it must exist), else `shelfmark.toml` if
    /// present, else the defaults.
    pub fn load(explicit: Option<&Path>) -> LedgerResult<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)
                } else {
                    debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, data_file: Option<PathBuf>, actor: Option<String>) -> Self {
        if let Some(data_file) = data_file {
            self.data_file = data_file;
        }
        if let Some(actor) = actor {
            self.actor = actor;
        }
        self
    }
}
