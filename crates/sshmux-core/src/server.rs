use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_SSH_PORT: u16 = 22;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server name cannot be empty")]
    EmptyName,
    #[error("server '{0}': hostname cannot be empty")]
    EmptyHostname(String),
    #[error("server '{0}': username cannot be empty")]
    EmptyUsername(String),
    #[error("server '{0}': key authentication requires a key path")]
    MissingKeyPath(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    Password,
    Key,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Password => "password",
            AuthMethod::Key => "key",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "password" => Ok(AuthMethod::Password),
            "key" => Ok(AuthMethod::Key),
            other => Err(format!("Unknown auth method: {other}")),
        }
    }
}

/// A configured remote host. Read-only from the engine's point of view:
/// the orchestrator consumes records, it never writes them back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub name: String,
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub auth: AuthMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

impl ServerRecord {
    /// Check the record is complete enough to build a connection command.
    /// Key auth without a key path is the one cross-field constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.hostname.trim().is_empty() {
            return Err(ValidationError::EmptyHostname(self.name.clone()));
        }
        if self.username.trim().is_empty() {
            return Err(ValidationError::EmptyUsername(self.name.clone()));
        }
        if self.auth == AuthMethod::Key
            && self.key_path.as_deref().map_or(true, |p| p.trim().is_empty())
        {
            return Err(ValidationError::MissingKeyPath(self.name.clone()));
        }
        Ok(())
    }
}
