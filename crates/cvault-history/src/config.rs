use std::path::Path;

use cvault_codec::{Obfuscator, DEFAULT_OBFUSCATION_KEY};
use serde::{Deserialize, Serialize};

use crate::error::{HistoryError, HistoryResult};

/// Storage key the version list lives under.
pub const DEFAULT_STORAGE_KEY: &str = "cv_versions";

/// Number of versions kept before the oldest is evicted.
pub const MAX_VERSIONS: usize = 5;

/// Settings for a [`CvHistory`](crate::CvHistory).
///
/// Every field is optional in TOML; missing ones take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub storage_key: String,
    /// Static obfuscation key. Shared by every user of a build that ships
    /// with it, so it only deters casual inspection.
    pub obfuscation_key: String,
    pub max_versions: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.into(),
            obfuscation_key: DEFAULT_OBFUSCATION_KEY.into(),
            max_versions: MAX_VERSIONS,
        }
    }
}

impl HistoryConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> HistoryResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| HistoryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> HistoryResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> HistoryResult<()> {
        if self.storage_key.trim().is_empty() {
            return Err(HistoryError::Config("storage_key must not be empty".into()));
        }
        if self.max_versions == 0 {
            return Err(HistoryError::Config("max_versions must be at least 1".into()));
        }
        self.obfuscator()?;
        Ok(())
    }

    /// Build the obfuscator for the configured key.
    pub fn obfuscator(&self) -> HistoryResult<Obfuscator> {
        Ok(Obfuscator::new(&self.obfuscation_key)?)
    }
}
