//! Configuration loading for agent-forge.
//!
//! One YAML file plus environment overrides on top of compiled defaults.
//!
//! # Usage
//!
//! ```rust,no_run
//! use forgeconf::ForgeConfig;
//!
//! let (config, sources) = ForgeConfig::load_with_sources_from(None).expect("config");
//! config.validate().expect("DEEPSEEK_API_KEY must be set");
//!
//! println!("Listening on {}:{}", config.server.host, config.server.port);
//! if sources.file.is_none() {
//!     eprintln!("No config.yaml found, running on defaults");
//! }
//! ```
//!
//! # Config File Locations
//!
//! The first file found wins:
//! 1. `<exe_dir>/config.yaml`
//! 2. `<exe_dir>/config/config.yaml`
//! 3. `./config.yaml`
//! 4. `./config/config.yaml`
//!
//! An explicit `--config` path replaces the search. Environment variables
//! (`AGENT_FORGE_<SECTION>_<KEY>`, then `DEEPSEEK_API_KEY`) apply last.
//!
//! # Example Config
//!
//! ```yaml
//! server:
//!   host: localhost
//!   port: 8080
//!
//! deepseek:
//!   base_url: https://api.deepseek.com
//!   model: deepseek-chat
//!   temperature: 0.7
//!   timeout: 30
//!
//! log:
//!   enabled: true
//!   level: info
//!   file: /var/log/agent-forge/agent-forge.log
//!   max_size: 100
//!   max_backups: 3
//!   max_age: 28
//!   compress: true
//! ```

pub mod loader;
pub mod sections;

pub use loader::{ConfigSources, API_KEY_ENV, ENV_PREFIX};
pub use sections::{DeepseekConfig, LogConfig, ServerConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("DeepSeek API key is not set; export DEEPSEEK_API_KEY or set deepseek.api_key")]
    MissingApiKey,
}

/// Complete agent-forge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ForgeConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub deepseek: DeepseekConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl ForgeConfig {
    /// Load configuration from the default search path and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration and return information about sources.
    ///
    /// With `config_path`, that file must exist and no search happens.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();

        let file = match config_path {
            Some(path) => {
                sources.searched.push(path.to_path_buf());
                Some(path.to_path_buf())
            }
            None => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                sources.searched = loader::candidate_paths(loader::exe_dir().as_deref(), &cwd);
                loader::discover_config_file(&sources.searched)
            }
        };

        let mut config = match &file {
            Some(path) => loader::load_from_file(path)?,
            None => ForgeConfig::default(),
        };
        sources.file = file;

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Check settings the server cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deepseek.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    /// Serialize to YAML with the API key masked.
    pub fn to_yaml(&self) -> String {
        let mut redacted = self.clone();
        if !redacted.deepseek.api_key.is_empty() {
            redacted.deepseek.api_key = "<redacted>".to_string();
        }

        serde_yaml::to_string(&redacted).unwrap_or_else(|e| format!("# failed to render config: {}\n", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ForgeConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.deepseek.model, "deepseek-chat");
        assert!(!config.log.enabled);
    }

    #[test]
    fn test_validate_requires_api_key() {
        let mut config = ForgeConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::MissingApiKey)));

        config.deepseek.api_key = "   ".to_string();
        assert!(config.validate().is_err());

        config.deepseek.api_key = "sk-test".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_message_names_env() {
        let message = ConfigError::MissingApiKey.to_string();
        assert!(message.contains("DEEPSEEK_API_KEY"));
    }

    #[test]
    fn test_to_yaml_redacts_key() {
        let mut config = ForgeConfig::default();
        config.deepseek.api_key = "sk-very-secret".to_string();

        let yaml = config.to_yaml();
        assert!(!yaml.contains("sk-very-secret"));
        assert!(yaml.contains("<redacted>"));
        assert!(yaml.contains("port: 8080"));
    }

    #[test]
    fn test_yaml_reparses() {
        let config = ForgeConfig::default();
        let parsed: ForgeConfig = serde_yaml::from_str(&config.to_yaml()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  rate_limit: 5").unwrap();

        let (config, sources) = ForgeConfig::load_with_sources_from(Some(file.path())).unwrap();

        assert_eq!(config.server.rate_limit, 5);
        assert_eq!(sources.file.as_deref(), Some(file.path()));
        assert_eq!(sources.searched, vec![file.path().to_path_buf()]);
    }

    #[test]
    fn test_explicit_path_missing() {
        let result =
            ForgeConfig::load_with_sources_from(Some(Path::new("/nonexistent/forge.yaml")));
        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }
}
