use once_cell::sync::OnceCell;
use std::env;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

static INIT_DOTENV: OnceCell<PathBuf> = OnceCell::new();

/// Resolves the environment file named by the first command line argument.
///
/// Unlike a development `.env` fallback, the file is mandatory: the service
/// refuses to start when no path is given or the file cannot be read.
pub fn env_file_from_args() -> Result<PathBuf, String> {
    let path = env::args()
        .nth(1)
        .ok_or_else(|| "Usage: tiny_live_rooms <env-file>".to_string())?;
    Ok(PathBuf::from(path))
}

/// Loads the given dotenv file into the process environment, once.
///
/// Subsequent calls return the path loaded by the first successful call
/// without touching the environment again.
pub fn ensure_env_file_loaded(path: &Path) -> Result<PathBuf, String> {
    INIT_DOTENV
        .get_or_try_init(|| load_env_file(path).map(|_| path.to_path_buf()))
        .cloned()
}

fn load_env_file(path: &Path) -> Result<(), String> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| format!("Config file {} not readable: {e}", path.display()))?;
    if !metadata.is_file() {
        return Err(format!("Config file {} is not a file", path.display()));
    }
    dotenv::from_filename(path).map_err(|e| format!("Failed to load {}: {e}", path.display()))?;
    Ok(())
}

/// Current wall-clock time in Unix seconds.
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn env_file_is_loaded_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "TINY_LIVE_ROOMS_UTILS_TEST=loaded").unwrap();

        let loaded = ensure_env_file_loaded(file.path()).unwrap();
        assert_eq!(loaded, file.path());
        assert_eq!(env::var("TINY_LIVE_ROOMS_UTILS_TEST").unwrap(), "loaded");

        // A second call is a no-op and reports the first file.
        let again = ensure_env_file_loaded(Path::new("/does/not/exist")).unwrap();
        assert_eq!(again, file.path());
    }

    #[test]
    fn missing_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_env_file(&dir.path().join("absent.env")).unwrap_err();
        assert!(err.contains("not readable"));

        let err = load_env_file(dir.path()).unwrap_err();
        assert!(err.contains("is not a file"));
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now_unix() > 1_577_836_800);
    }
}
