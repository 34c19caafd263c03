//! Locating and reading the TOML configuration file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use buildfmt::{BuildfmtError, config::AppConfig};

/// Project-local configuration, relative to the working directory.
const LOCAL_CONFIG: &str = "buildfmt/config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("configuration file {0} does not exist")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for BuildfmtError {
    fn from(err: ConfigError) -> Self {
        BuildfmtError::Config(err.to_string())
    }
}

/// Load the configuration.
///
/// An explicit path must exist. Otherwise the first existing file among
/// `buildfmt/config.toml` and `config.toml` in the platform configuration
/// directory is used, and the defaults when there is none.
///
/// # Errors
///
/// Fails when the explicit file is missing, or when the chosen file cannot be
/// read or is not valid configuration.
pub fn load_config(explicit: Option<impl AsRef<Path>>) -> Result<AppConfig, BuildfmtError> {
    if let Some(path) = explicit {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::MissingFile(path.to_path_buf()).into());
        }
        return read_config(path);
    }

    match candidates().into_iter().find(|path| path.is_file()) {
        Some(path) => read_config(&path),
        None => {
            debug!("No configuration file found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

fn candidates() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
    match ProjectDirs::from("com", "buildfmt", "buildfmt") {
        Some(dirs) => paths.push(dirs.config_dir().join("config.toml")),
        None => debug!("No platform configuration directory"),
    }
    paths
}

fn read_config(path: &Path) -> Result<AppConfig, BuildfmtError> {
    info!(path = path.display().to_string(); "Loading configuration");
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|err| {
        ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.message().to_string(),
        }
        .into()
    })
}
