//! TOML configuration: servers and profiles.
//!
//! The orchestration engine never reads this module; it consumes
//! already-resolved `ServerRecord` values. Only the CLI loads config.

use crate::server::ServerRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("no server named '{0}' in config")]
    UnknownServer(String),
    #[error("no profile named '{0}' in config")]
    UnknownProfile(String),
    #[error("profile '{profile}' references unknown server '{server}'")]
    UnresolvedProfileServer { profile: String, server: String },
    #[error("could not determine a config directory for this platform")]
    NoConfigDir,
}

/// A named, ordered group of server names. Order is meaningful: it
/// fixes the window index of each server in a group session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub servers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub servers: Vec<ServerRecord>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("sshmux").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from an explicit path. A missing file is an empty config,
    /// not an error: first run has nothing saved yet.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn server(&self, name: &str) -> Result<&ServerRecord, ConfigError> {
        self.servers
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ConfigError::UnknownServer(name.to_string()))
    }

    /// Resolve a profile to its server records, preserving the declared
    /// order. Any unknown server name fails the whole profile.
    pub fn resolve_profile(&self, name: &str) -> Result<Vec<ServerRecord>, ConfigError> {
        let profile = self
            .profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))?;
        profile
            .servers
            .iter()
            .map(|server_name| {
                self.server(server_name).map(Clone::clone).map_err(|_| {
                    ConfigError::UnresolvedProfileServer {
                        profile: profile.name.clone(),
                        server: server_name.clone(),
                    }
                })
            })
            .collect()
    }
}
