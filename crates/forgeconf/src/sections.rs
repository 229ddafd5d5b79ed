//! Config sections: `server`, `deepseek` and `log`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Listener settings for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Default: localhost
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,

    /// Default: 8080
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,

    /// Requests per minute. Accepted and logged, not enforced.
    #[serde(default = "ServerConfig::default_rate_limit")]
    pub rate_limit: u32,

    #[serde(default = "ServerConfig::default_rate_limit_burst")]
    pub rate_limit_burst: u32,

    /// Seconds to wait for in-flight HTTP requests on shutdown.
    #[serde(default = "ServerConfig::default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

impl ServerConfig {
    fn default_host() -> String {
        "localhost".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_rate_limit() -> u32 {
        60
    }

    fn default_rate_limit_burst() -> u32 {
        10
    }

    fn default_shutdown_timeout() -> u64 {
        30
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            rate_limit: Self::default_rate_limit(),
            rate_limit_burst: Self::default_rate_limit_burst(),
            shutdown_timeout: Self::default_shutdown_timeout(),
        }
    }
}

/// Upstream chat-completion API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepseekConfig {
    /// Bearer key. Usually supplied through `DEEPSEEK_API_KEY`.
    #[serde(default)]
    pub api_key: String,

    /// OpenAI-compatible base URL; `/chat/completions` is appended.
    #[serde(default = "DeepseekConfig::default_base_url")]
    pub base_url: String,

    #[serde(default = "DeepseekConfig::default_model")]
    pub model: String,

    #[serde(default = "DeepseekConfig::default_temperature")]
    pub temperature: f32,

    /// Per-call timeout in seconds.
    #[serde(default = "DeepseekConfig::default_timeout")]
    pub timeout: u64,
}

impl DeepseekConfig {
    fn default_base_url() -> String {
        "https://api.deepseek.com".to_string()
    }

    fn default_model() -> String {
        "deepseek-chat".to_string()
    }

    fn default_temperature() -> f32 {
        0.7
    }

    fn default_timeout() -> u64 {
        30
    }
}

impl Default for DeepseekConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::default_base_url(),
            model: Self::default_model(),
            temperature: Self::default_temperature(),
            timeout: Self::default_timeout(),
        }
    }
}

/// File logging. When disabled, logs go to stderr only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Filter directive, e.g. `info` or `agent_forge=debug,info`.
    #[serde(default = "LogConfig::default_level")]
    pub level: String,

    /// Default: `<exe_dir>/logs/agent-forge.log`
    #[serde(default = "LogConfig::default_file")]
    pub file: PathBuf,

    /// Megabytes per file before rotating.
    #[serde(default = "LogConfig::default_max_size")]
    pub max_size: u64,

    #[serde(default = "LogConfig::default_max_backups")]
    pub max_backups: usize,

    /// Days to keep rotated files.
    #[serde(default = "LogConfig::default_max_age")]
    pub max_age: u64,

    #[serde(default = "LogConfig::default_compress")]
    pub compress: bool,
}

impl LogConfig {
    fn default_level() -> String {
        "info".to_string()
    }

    fn default_file() -> PathBuf {
        crate::loader::exe_dir()
            .map(|dir| dir.join("logs/agent-forge.log"))
            .unwrap_or_else(|| PathBuf::from("logs/agent-forge.log"))
    }

    fn default_max_size() -> u64 {
        100
    }

    fn default_max_backups() -> usize {
        3
    }

    fn default_max_age() -> u64 {
        28
    }

    fn default_compress() -> bool {
        true
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: Self::default_level(),
            file: Self::default_file(),
            max_size: Self::default_max_size(),
            max_backups: Self::default_max_backups(),
            max_age: Self::default_max_age(),
            compress: Self::default_compress(),
        }
    }
}
