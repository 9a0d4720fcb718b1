use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::EnvFilter;

fn file_appender(path: &Path) -> Result<RollingFileAppender> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .with_context(|| format!("log path {} has no file name", path.display()))?;
    fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    Ok(rolling::never(dir, file_name))
}

/// Routes `tracing` output to `path`. The writer is blocking so forked children can log.
pub fn init_tracing(path: &Path) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let appender = file_appender(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(appender)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
        .context("installing tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appender_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("proctree.log");

        file_appender(&path).unwrap();
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        assert!(file_appender(Path::new("/")).is_err());
    }
}
