//! Application directory helpers anchored to a single `.labelforge` folder.
//!
//! The helpers centralize where the database, trained model artifacts, config
//! and log files live across platforms, defaulting to the OS config directory
//! (e.g., `%APPDATA%` on Windows) and allowing a `LABELFORGE_CONFIG_HOME`
//! override for tests or portable setups.

use std::{
    path::PathBuf,
    sync::{LazyLock, Mutex},
};

use directories::BaseDirs;
use thiserror::Error;

/// Name of the application directory that lives under the OS config root.
pub const APP_DIR_NAME: &str = ".labelforge";

/// Filename of the SQLite database inside the application root.
pub const DATABASE_FILE_NAME: &str = "labelforge.db";

static CONFIG_BASE_OVERRIDE: LazyLock<Mutex<Option<PathBuf>>> = LazyLock::new(|| Mutex::new(None));
static APP_ROOT_OVERRIDE: LazyLock<Mutex<Option<PathBuf>>> = LazyLock::new(|| Mutex::new(None));

/// Point the application root at an explicit directory.
///
/// Used at startup when the settings file names a data directory; everything
/// (database, models, logs) then lives directly under that path.
pub fn set_app_root_override(path: PathBuf) {
    let mut guard = APP_ROOT_OVERRIDE
        .lock()
        .expect("app root override mutex poisoned");
    *guard = Some(path);
}

/// Errors that can occur while resolving or preparing application directories.
#[derive(Debug, Error)]
pub enum AppDirError {
    /// No suitable base config directory could be resolved.
    #[error("No suitable base config directory available for application files")]
    NoBaseDir,
    /// Failed to create the application directory.
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Return the root `.labelforge` directory, creating it if needed.
///
/// A startup override from [`set_app_root_override`] takes precedence over
/// the platform default.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let path = match app_root_override() {
        Some(path) => path,
        None => {
            let base = config_base_dir().ok_or(AppDirError::NoBaseDir)?;
            base.join(APP_DIR_NAME)
        }
    };
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Return the logs directory inside the `.labelforge` root, creating it if needed.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    let path = app_root_dir()?.join("logs");
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Return the directory that holds one artifact folder per trained model.
pub fn models_dir() -> Result<PathBuf, AppDirError> {
    let path = app_root_dir()?.join("models");
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Return the path of the SQLite database file.
pub fn database_path() -> Result<PathBuf, AppDirError> {
    Ok(app_root_dir()?.join(DATABASE_FILE_NAME))
}

fn app_root_override() -> Option<PathBuf> {
    APP_ROOT_OVERRIDE.lock().ok().and_then(|guard| guard.clone())
}

fn config_base_dir() -> Option<PathBuf> {
    if let Some(path) = CONFIG_BASE_OVERRIDE
        .lock()
        .ok()
        .and_then(|guard| guard.clone())
    {
        return Some(path);
    }
    if let Ok(path) = std::env::var("LABELFORGE_CONFIG_HOME") {
        return Some(PathBuf::from(path));
    }
    BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf())
}

#[cfg(test)]
fn set_config_base_override(path: PathBuf) {
    let mut guard = CONFIG_BASE_OVERRIDE
        .lock()
        .expect("config base override mutex poisoned");
    *guard = Some(path);
}

#[cfg(test)]
fn clear_config_base_override() {
    let mut guard = CONFIG_BASE_OVERRIDE
        .lock()
        .expect("config base override mutex poisoned");
    *guard = None;
}

/// Test guard that points the app root at a scratch directory for its lifetime.
#[cfg(test)]
pub(crate) struct ConfigBaseGuard;

#[cfg(test)]
impl ConfigBaseGuard {
    pub(crate) fn set(path: PathBuf) -> Self {
        set_config_base_override(path);
        Self
    }
}

#[cfg(test)]
impl Drop for ConfigBaseGuard {
    fn drop(&mut self) {
        clear_config_base_override();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn uses_override_for_root_and_children() {
        let base = tempdir().unwrap();
        let _guard = ConfigBaseGuard::set(base.path().to_path_buf());
        let root = app_root_dir().unwrap();
        assert_eq!(root, base.path().join(APP_DIR_NAME));
        assert!(root.is_dir());

        let models = models_dir().unwrap();
        assert_eq!(models, root.join("models"));
        assert!(models.is_dir());
        assert_eq!(database_path().unwrap(), root.join(DATABASE_FILE_NAME));
    }
}
