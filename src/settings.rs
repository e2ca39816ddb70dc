//! Server settings loaded from a TOML file in the application root.
//!
//! Missing files yield defaults so a first launch needs no setup. The file is
//! user-edited only; the application never writes it back.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::app_dirs;

/// Filename of the settings file inside the application root.
pub const SETTINGS_FILE_NAME: &str = "config.toml";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Errors returned while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The application root could not be resolved.
    #[error("App directory error: {0}")]
    AppDirs(#[from] app_dirs::AppDirError),
    /// The settings file exists but could not be read.
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The settings file exists but is not valid TOML.
    #[error("Failed to parse settings file {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// The configured bind address is not a valid socket address.
    #[error("Invalid bind address {value:?}: {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
}

/// Application settings as stored on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,
    /// Optional override for the data directory holding the database and models.
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            data_dir: None,
        }
    }
}

impl Settings {
    /// Parse the configured bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.bind_addr
            .parse()
            .map_err(|source| SettingsError::InvalidBindAddr {
                value: self.bind_addr.clone(),
                source,
            })
    }
}

/// Resolve the settings file path inside the application root.
pub fn settings_path() -> Result<PathBuf, SettingsError> {
    Ok(app_dirs::app_root_dir()?.join(SETTINGS_FILE_NAME))
}

/// Load settings from the application root, returning defaults if missing.
pub fn load_or_default() -> Result<Settings, SettingsError> {
    load_from(&settings_path()?)
}

/// Load settings from a specific path, returning defaults if missing.
pub fn load_from(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| SettingsError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_from(&dir.path().join(SETTINGS_FILE_NAME)).unwrap();
        assert_eq!(settings.bind_addr, DEFAULT_BIND_ADDR);
        assert!(settings.data_dir.is_none());
        assert!(settings.socket_addr().is_ok());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "bind_addr = \"0.0.0.0:9000\"\ndata_dir = \"/tmp/lf\"\n").unwrap();
        let settings = load_from(&path).unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:9000");
        assert_eq!(settings.data_dir.as_deref(), Some(Path::new("/tmp/lf")));
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let settings = Settings {
            bind_addr: "not-an-addr".to_string(),
            data_dir: None,
        };
        let err = settings.socket_addr().unwrap_err();
        assert!(matches!(err, SettingsError::InvalidBindAddr { .. }));
    }

    #[test]
    fn unknown_keys_fail_parse() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "bind_adr = \"oops\"\n").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(matches!(err, SettingsError::ParseToml { .. }));
    }
}
