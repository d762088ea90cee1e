use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use vitals_core::TrackerError;

/// Environment variable naming the database file.
pub const DB_ENV: &str = "VITALS_DB";

const DB_FILE: &str = "vitals.db";

#[derive(Debug)]
pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Resolve the database location: `--db`, then `VITALS_DB`, then the
    /// platform data directory. The parent directory is created if missing.
    pub fn load(db_override: Option<&Path>) -> Result<Self, TrackerError> {
        let env_value = std::env::var_os(DB_ENV);
        let db_path = resolve(db_override, env_value.as_deref().map(Path::new), default_path)?;

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                TrackerError::Configuration(format!(
                    "Failed to create data directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        tracing::debug!(db = %db_path.display(), "Resolved configuration");
        Ok(Config { db_path })
    }
}

fn default_path() -> Result<PathBuf, TrackerError> {
    let proj_dirs = ProjectDirs::from("", "", "vitals").ok_or_else(|| {
        TrackerError::Configuration("Could not determine home directory".to_string())
    })?;
    Ok(proj_dirs.data_dir().join(DB_FILE))
}

fn resolve(
    db_override: Option<&Path>,
    env_value: Option<&Path>,
    fallback: impl FnOnce() -> Result<PathBuf, TrackerError>,
) -> Result<PathBuf, TrackerError> {
    if let Some(path) = db_override {
        return Ok(path.to_path_buf());
    }
    match env_value {
        Some(path) if path.as_os_str().is_empty() => Err(TrackerError::Configuration(format!(
            "{DB_ENV} is set but empty"
        ))),
        Some(path) => Ok(path.to_path_buf()),
        None => fallback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback() -> Result<PathBuf, TrackerError> {
        Ok(PathBuf::from("/data/vitals.db"))
    }

    #[test]
    fn test_flag_wins() {
        let path = resolve(
            Some(Path::new("cli.db")),
            Some(Path::new("env.db")),
            fallback,
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("cli.db"));
    }

    #[test]
    fn test_env_used_without_flag() {
        let path = resolve(None, Some(Path::new("env.db")), fallback).unwrap();
        assert_eq!(path, PathBuf::from("env.db"));
    }

    #[test]
    fn test_fallback_when_unset() {
        let path = resolve(None, None, fallback).unwrap();
        assert_eq!(path, PathBuf::from("/data/vitals.db"));
    }

    #[test]
    fn test_empty_env_is_fatal() {
        let err = resolve(None, Some(Path::new("")), fallback).unwrap_err();
        assert!(matches!(err, TrackerError::Configuration(_)));
        assert!(err.to_string().contains(DB_ENV));
    }

    #[test]
    fn test_missing_home_is_fatal() {
        let err = resolve(None, None, || {
            Err(TrackerError::Configuration("no home".to_string()))
        })
        .unwrap_err();
        assert!(matches!(err, TrackerError::Configuration(_)));
    }

    #[test]
    fn test_load_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("vitals.db");
        let config = Config::load(Some(&db)).unwrap();
        assert_eq!(config.db_path, db);
        assert!(dir.path().join("nested").is_dir());
    }
}
