//! Session orchestration engine: drives an external tmux process to
//! create, find, and repopulate SSH sessions.
//!
//! Layering, bottom up: [`gateway`] is the only process I/O boundary,
//! [`inventory`] reads live session state through it, and
//! [`orchestrator`] decides between reattaching and creating. All
//! naming and command construction is delegated to `sshmux-core`.

pub mod gateway;
pub mod inventory;
pub mod orchestrator;

pub use gateway::{
    GatewayError, Multiplexer, ProcessRunner, RunOutput, SystemProcessRunner, TmuxGateway,
};
pub use inventory::{SessionInfo, SessionInventory};
pub use orchestrator::{ConnectionOrchestrator, ConnectionResult, EngineError};
