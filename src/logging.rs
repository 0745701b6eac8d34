use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`. With `file` set, output is
/// appended to that file through a background writer; the returned guard
/// must be kept alive until shutdown so buffered lines are flushed.
pub fn init_logging(level: &str, file: Option<&str>) -> Result<Option<WorkerGuard>, String> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| format!("Invalid LOG_LEVEL {level}: {e}"))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match file {
        Some(path) => {
            let (directory, file_name) = split_log_path(Path::new(path))?;
            // Fail early if the file cannot be created.
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("Cannot open log file {path}: {e}"))?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init()
                .map_err(|e| e.to_string())?;
            Ok(Some(guard))
        }
        None => {
            registry
                .with(fmt::layer().with_target(true))
                .try_init()
                .map_err(|e| e.to_string())?;
            Ok(None)
        }
    }
}

fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr), String> {
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("LOG_FILE {} has no file name", path.display()))?;
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    Ok((directory, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_relative_and_absolute_paths() {
        let (dir, name) = split_log_path(Path::new("rooms.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "rooms.log");

        let (dir, name) = split_log_path(Path::new("/var/log/rooms.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log"));
        assert_eq!(name, "rooms.log");
    }

    #[test]
    fn directory_only_path_is_rejected() {
        assert!(split_log_path(Path::new("/")).is_err());
    }
}
