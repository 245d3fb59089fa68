//! The connection state machine: reattach to an existing session or
//! create and populate a new one.
//!
//! Per invocation: availability gate, fresh inventory snapshot,
//! reattach on an exact normalized-name match, otherwise create. A
//! reattach deliberately re-sends nothing: the SSH session already
//! running inside is assumed live, and injecting a second connect
//! command would corrupt its shell.

use crate::gateway::{GatewayError, Multiplexer};
use crate::inventory::SessionInventory;
use sshmux_core::{
    build_ssh_command, normalize_session_name, resolve_unique_name, ServerRecord, ValidationError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("tmux is not available on this system")]
    MuxUnavailable,
    #[error("profile '{0}' has no servers")]
    EmptyProfile(String),
    #[error("server '{server}' is invalid: {source}")]
    InvalidServer {
        server: String,
        #[source]
        source: ValidationError,
    },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// What the caller gets back: the session to attach to, and whether it
/// already existed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionResult {
    pub session_name: String,
    pub was_existing: bool,
}

pub struct ConnectionOrchestrator<'a, M: Multiplexer + ?Sized> {
    mux: &'a M,
}

impl<'a, M: Multiplexer + ?Sized> ConnectionOrchestrator<'a, M> {
    pub fn new(mux: &'a M) -> Self {
        Self { mux }
    }

    /// Open (or find) a session for one server, named after it.
    pub fn connect_to_server(&self, server: &ServerRecord) -> Result<ConnectionResult, EngineError> {
        self.ensure_available()?;
        let requested = normalize_session_name(&server.name);
        let live = SessionInventory::new(self.mux).snapshot()?;
        if live.iter().any(|name| name == &requested) {
            return Ok(ConnectionResult {
                session_name: requested,
                was_existing: true,
            });
        }

        validate(server)?;
        let command = build_ssh_command(server);
        let session_name = self.create_with_retry(&server.name, &live)?;
        self.mux.send_keys(&session_name, &command)?;
        Ok(ConnectionResult {
            session_name,
            was_existing: false,
        })
    }

    /// Open (or find) one session for a whole profile: window `i` runs
    /// `servers[i]`, in declared order. Window 0 is the default window
    /// the session is created with, so it is renamed rather than
    /// created.
    pub fn connect_to_profile(
        &self,
        profile_name: &str,
        servers: &[ServerRecord],
    ) -> Result<ConnectionResult, EngineError> {
        self.ensure_available()?;
        let requested = normalize_session_name(profile_name);
        let live = SessionInventory::new(self.mux).snapshot()?;
        if live.iter().any(|name| name == &requested) {
            return Ok(ConnectionResult {
                session_name: requested,
                was_existing: true,
            });
        }

        if servers.is_empty() {
            return Err(EngineError::EmptyProfile(profile_name.to_string()));
        }
        // All records are checked before the session exists: a bad one
        // aborts the profile with nothing live to clean up.
        for server in servers {
            validate(server)?;
        }

        let session_name = self.create_with_retry(profile_name, &live)?;
        for (index, server) in servers.iter().enumerate() {
            let command = build_ssh_command(server);
            if index == 0 {
                self.mux.rename_window(&session_name, 0, &server.name)?;
            } else {
                self.mux.create_window(&session_name, &server.name)?;
            }
            self.mux
                .send_keys(&format!("{session_name}:{index}"), &command)?;
        }
        Ok(ConnectionResult {
            session_name,
            was_existing: false,
        })
    }

    fn ensure_available(&self) -> Result<(), EngineError> {
        if self.mux.is_available() {
            Ok(())
        } else {
            Err(EngineError::MuxUnavailable)
        }
    }

    /// Create a session under a collision-free name.
    ///
    /// The snapshot/create pair is not atomic: another client can take
    /// the resolved name in between. On a duplicate-session failure the
    /// inventory is re-queried and the name re-resolved exactly once;
    /// a second failure propagates.
    fn create_with_retry(
        &self,
        requested: &str,
        live: &[String],
    ) -> Result<String, EngineError> {
        let candidate = resolve_unique_name(requested, live);
        match self.mux.create_session(&candidate) {
            Ok(()) => Ok(candidate),
            Err(err) if is_duplicate_session(&err) => {
                let fresh = SessionInventory::new(self.mux).snapshot()?;
                let retry = resolve_unique_name(requested, &fresh);
                self.mux.create_session(&retry)?;
                Ok(retry)
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn validate(server: &ServerRecord) -> Result<(), EngineError> {
    server.validate().map_err(|source| EngineError::InvalidServer {
        server: server.name.clone(),
        source,
    })
}

fn is_duplicate_session(err: &GatewayError) -> bool {
    matches!(
        err,
        GatewayError::CommandFailed { stderr, .. } if stderr.contains("duplicate session")
    )
}
