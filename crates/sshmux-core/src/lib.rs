pub mod command;
pub mod config;
pub mod naming;
pub mod server;

pub use command::build_ssh_command;
pub use config::{Config, ConfigError, Profile};
pub use naming::{normalize_session_name, resolve_unique_name};
pub use server::{AuthMethod, ServerRecord, ValidationError, DEFAULT_SSH_PORT};
