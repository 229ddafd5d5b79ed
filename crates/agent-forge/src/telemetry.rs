//! Logging initialization for agent-forge.
//!
//! stdout belongs to the stdio transport, so logs never go there. With file
//! logging disabled they go to stderr as human-readable lines; enabled, they
//! are written as JSON lines to a size-rotated file.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use forgeconf::LogConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
const BYTES_PER_MB: usize = 1024 * 1024;

pub type RotatingWriter = Mutex<FileRotate<AppendCount>>;

/// Install the global subscriber. `RUST_LOG` wins over `log.level`.
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = env_filter(&config.level);

    if config.enabled {
        let writer = rotating_writer(config)?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(writer),
            )
            .try_init()
            .context("Failed to install tracing subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .try_init()
            .context("Failed to install tracing subscriber")?;
    }

    Ok(())
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Open the log file for appending with rotation at `max_size` MB.
///
/// Creates the parent directory and prunes backups older than `max_age` days.
pub fn rotating_writer(config: &LogConfig) -> Result<RotatingWriter> {
    if let Some(parent) = config.file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    if config.max_age > 0 {
        let max_age = Duration::from_secs(config.max_age.saturating_mul(SECONDS_PER_DAY));
        prune_expired_backups(&config.file, max_age)
            .with_context(|| format!("Failed to prune old logs next to {}", config.file.display()))?;
    }

    let limit = (config.max_size.max(1) as usize).saturating_mul(BYTES_PER_MB);
    let compression = if config.compress {
        Compression::OnRotate(0)
    } else {
        Compression::None
    };

    let rotate = FileRotate::new(
        &config.file,
        AppendCount::new(config.max_backups),
        ContentLimit::Bytes(limit),
        compression,
        #[cfg(unix)]
        None,
    );

    Ok(Mutex::new(rotate))
}

/// Remove rotated siblings of `file` (`name.1`, `name.2.gz`, ...) last
/// modified more than `max_age` ago. The live file is never touched.
pub fn prune_expired_backups(file: &Path, max_age: Duration) -> io::Result<usize> {
    let Some(base) = file.file_name().and_then(|n| n.to_str()) else {
        return Ok(0);
    };
    let dir = match file.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir,
        None => Path::new("."),
    };
    let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
        return Ok(0);
    };

    let prefix = format!("{}.", base);
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let is_backup = name
            .strip_prefix(&prefix)
            .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()));
        if !is_backup {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        if modified < cutoff {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }

    Ok(removed)
}
