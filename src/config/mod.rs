mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

impl Default for Config {
    fn default() -> Self {
        Self {
            parsers: default_parsers(),
            diagnostic_preview_chars: default_preview_chars(),
            provider: ProviderConfig::default(),
            retry: RetryConfig::default(),
            prompt: PromptConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load and validate, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            Self::load(path)?
        } else {
            debug!("Config file {} not found, using defaults", path.display());
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parsers.is_empty() {
            return Err(ConfigError::EmptyParserChain);
        }

        let mut seen = HashSet::new();
        for kind in &self.parsers {
            if !seen.insert(kind) {
                return Err(ConfigError::DuplicateParser(kind.to_string()));
            }
        }

        if self.provider.command.trim().is_empty() {
            return Err(ConfigError::MissingProviderCommand);
        }

        Ok(())
    }
}
