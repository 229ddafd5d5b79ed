//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, ForgeConfig};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix for per-key environment overrides: `AGENT_FORGE_<SECTION>_<KEY>`.
pub const ENV_PREFIX: &str = "AGENT_FORGE";

/// Applied after every other override.
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

const CONFIG_FILE: &str = "config.yaml";

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config file that was loaded, if any
    pub file: Option<PathBuf>,
    /// Locations that were searched, in order
    pub searched: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Directory holding the running executable.
pub fn exe_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Candidate config locations in search order.
///
/// `<exe_dir>/config.yaml`, `<exe_dir>/config/config.yaml`, then the same
/// two relative to `cwd`.
pub fn candidate_paths(exe_dir: Option<&Path>, cwd: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(4);
    if let Some(dir) = exe_dir {
        paths.push(dir.join(CONFIG_FILE));
        paths.push(dir.join("config").join(CONFIG_FILE));
    }
    paths.push(cwd.join(CONFIG_FILE));
    paths.push(cwd.join("config").join(CONFIG_FILE));
    paths
}

/// First existing file among `candidates`.
pub fn discover_config_file(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.is_file()).cloned()
}

/// Load config from a YAML file. Missing sections and keys take defaults.
pub fn load_from_file(path: &Path) -> Result<ForgeConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_yaml(&contents, path)
}

fn parse_yaml(contents: &str, path: &Path) -> Result<ForgeConfig, ConfigError> {
    if contents.trim().is_empty() {
        return Ok(ForgeConfig::default());
    }

    serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Apply process environment overrides to config.
pub fn apply_env_overrides(config: &mut ForgeConfig, sources: &mut ConfigSources) {
    apply_overrides_with(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from an arbitrary lookup.
///
/// Values that fail to parse for numeric or boolean keys are ignored.
pub fn apply_overrides_with<F>(config: &mut ForgeConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let mut overlay = Overlay {
        lookup,
        sources,
    };

    let server = &mut config.server;
    overlay.string("SERVER_HOST", &mut server.host);
    overlay.parsed("SERVER_PORT", &mut server.port);
    overlay.parsed("SERVER_RATE_LIMIT", &mut server.rate_limit);
    overlay.parsed("SERVER_RATE_LIMIT_BURST", &mut server.rate_limit_burst);
    overlay.parsed("SERVER_SHUTDOWN_TIMEOUT", &mut server.shutdown_timeout);

    let deepseek = &mut config.deepseek;
    overlay.string("DEEPSEEK_API_KEY", &mut deepseek.api_key);
    overlay.string("DEEPSEEK_BASE_URL", &mut deepseek.base_url);
    overlay.string("DEEPSEEK_MODEL", &mut deepseek.model);
    overlay.parsed("DEEPSEEK_TEMPERATURE", &mut deepseek.temperature);
    overlay.parsed("DEEPSEEK_TIMEOUT", &mut deepseek.timeout);

    let log = &mut config.log;
    overlay.flag("LOG_ENABLED", &mut log.enabled);
    overlay.string("LOG_LEVEL", &mut log.level);
    if let Some(file) = overlay.take("LOG_FILE") {
        log.file = PathBuf::from(file);
    }
    overlay.parsed("LOG_MAX_SIZE", &mut log.max_size);
    overlay.parsed("LOG_MAX_BACKUPS", &mut log.max_backups);
    overlay.parsed("LOG_MAX_AGE", &mut log.max_age);
    overlay.flag("LOG_COMPRESS", &mut log.compress);

    // The bare key wins over everything else, matching common DeepSeek tooling.
    if let Some(key) = (overlay.lookup)(API_KEY_ENV).filter(|k| !k.is_empty()) {
        config.deepseek.api_key = key;
        overlay.sources.env_overrides.push(API_KEY_ENV.to_string());
    }
}

struct Overlay<'a, F> {
    lookup: F,
    sources: &'a mut ConfigSources,
}

impl<F> Overlay<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Raw value for `AGENT_FORGE_<suffix>`, recorded as applied.
    fn take(&mut self, suffix: &str) -> Option<String> {
        let name = format!("{}_{}", ENV_PREFIX, suffix);
        let value = (self.lookup)(&name)?;
        self.sources.env_overrides.push(name);
        Some(value)
    }

    fn string(&mut self, suffix: &str, slot: &mut String) {
        if let Some(value) = self.take(suffix) {
            *slot = value;
        }
    }

    fn parsed<T: FromStr>(&mut self, suffix: &str, slot: &mut T) {
        let name = format!("{}_{}", ENV_PREFIX, suffix);
        let Some(raw) = (self.lookup)(&name) else {
            return;
        };
        if let Ok(value) = raw.trim().parse() {
            *slot = value;
            self.sources.env_overrides.push(name);
        }
    }

    fn flag(&mut self, suffix: &str, slot: &mut bool) {
        let name = format!("{}_{}", ENV_PREFIX, suffix);
        let Some(raw) = (self.lookup)(&name) else {
            return;
        };
        if let Some(value) = parse_bool(&raw) {
            *slot = value;
            self.sources.env_overrides.push(name);
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
