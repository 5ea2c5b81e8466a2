use crate::config::LoggingConfig;
use anyhow::Result;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs console and per-run file logging. Returns the log file path.
///
/// `RUST_LOG` overrides the default `info` level for both outputs.
pub fn init(config: &LoggingConfig) -> Result<PathBuf> {
    std::fs::create_dir_all(&config.directory).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create log directory {}: {}",
            config.directory.display(),
            e
        )
    })?;

    let path = log_file_path(&config.directory, chrono::Local::now());
    let file = File::create(&path)
        .map_err(|e| anyhow::anyhow!("Failed to create log file {}: {}", path.display(), e))?;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;

    Ok(path)
}

/// `assistant_YYYYMMDD_HHMMSS.log` inside `directory`.
pub fn log_file_path<Tz>(directory: &Path, now: chrono::DateTime<Tz>) -> PathBuf
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    directory.join(format!("assistant_{}.log", now.format("%Y%m%d_%H%M%S")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_file_name_format() {
        let at = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 7, 5, 9).unwrap();
        let path = log_file_path(Path::new("/var/log/scholar"), at);
        assert_eq!(
            path,
            PathBuf::from("/var/log/scholar/assistant_20240301_070509.log")
        );
    }
}
