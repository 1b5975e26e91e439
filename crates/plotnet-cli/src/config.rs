//! Locating and loading the `[document]` / `[compiler]` configuration.
//!
//! A configuration is looked up, in order, at the path given with `--config`,
//! as `plotnet.toml` next to the architecture file, and as `config.toml` in
//! the user's configuration directory. Without any of them the defaults
//! apply. A file that is found is validated before anything is rendered, so a
//! bad palette entry or a clean-up list that would delete the document is
//! reported against the file that holds it.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use plotnet::{PlotnetError, config::AppConfig};

/// File name of a configuration kept next to the architecture files.
pub const PROJECT_CONFIG: &str = "plotnet.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file `{0}` does not exist")]
    Missing(PathBuf),

    #[error("cannot read configuration `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed configuration `{path}`: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration `{path}`: {message}")]
    Invalid { path: PathBuf, message: String },
}

impl From<ConfigError> for PlotnetError {
    fn from(err: ConfigError) -> Self {
        PlotnetError::Config(err.to_string())
    }
}

/// Where the configuration of a run comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given on the command line; it must exist.
    Explicit(PathBuf),
    /// `plotnet.toml` beside the architecture file.
    Project(PathBuf),
    /// `config.toml` in the user's configuration directory.
    User(PathBuf),
    Defaults,
}

impl ConfigSource {
    /// Picks the configuration for the architecture at `input`.
    pub fn discover(explicit: Option<&Path>, input: &Path) -> Self {
        if let Some(path) = explicit {
            return Self::Explicit(path.to_path_buf());
        }

        let project = input_directory(input).join(PROJECT_CONFIG);
        if project.is_file() {
            return Self::Project(project);
        }
        debug!(path:? = project; "No project configuration");

        match ProjectDirs::from("", "", "plotnet") {
            Some(dirs) => {
                let user = dirs.config_dir().join("config.toml");
                if user.is_file() {
                    return Self::User(user);
                }
                debug!(path:? = user; "No user configuration");
            }
            None => debug!("No user configuration directory on this platform"),
        }

        Self::Defaults
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::Project(path) | Self::User(path) => Some(path),
            Self::Defaults => None,
        }
    }

    /// Reads and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PlotnetError::Config`], naming the file, when it is missing,
    /// unreadable, malformed or fails [`AppConfig::validate`].
    pub fn load(&self) -> Result<AppConfig, PlotnetError> {
        let Some(path) = self.path() else {
            info!("Using the default configuration");
            return Ok(AppConfig::default());
        };
        info!(source:? = self; "Loading configuration");

        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::Missing(path.to_path_buf()),
            _ => ConfigError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let config: AppConfig = toml::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.message().to_string(),
        })?;
        config.validate().map_err(|message| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        })?;

        debug!(config:?; "Configuration loaded");
        Ok(config)
    }
}

fn input_directory(input: &Path) -> &Path {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
