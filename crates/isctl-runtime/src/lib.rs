//! Subprocess plumbing for the Caché/IRIS administration tools.
//!
//! This crate implements the invocation layer: the `Toolchain` configuration
//! (tool locations and execution settings), command discovery on the search
//! path (`AvailableCommands`), the pluggable `ControlBackend` trait with a
//! process-spawning backend and a scripted mock, session command construction,
//! privilege switching for spawned tools (`Credential`), and the
//! `ImportDescription` glob that renders into an `ImportDir` call.

pub mod backend;
pub mod discovery;
pub mod import;
pub mod mock;
pub mod privilege;
pub mod session;
pub mod toolchain;

pub use backend::{select_backend, ControlBackend, SessionRequest, SystemBackend, ToolOutput};
pub use discovery::{discover, AvailableCommands};
pub use import::{ImportDescription, ImportError};
pub use mock::{MockBackend, MockCall};
pub use privilege::{credential_for, current_user_name, Credential};
pub use session::SessionCommand;
pub use toolchain::Toolchain;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend '{0}' is not available on this system")]
    BackendUnavailable(String),
    #[error("tool execution failed: {0}")]
    ExecFailed(String),
    #[error("invalid toolchain config: {0}")]
    ToolchainConfig(String),
    #[error("switching to user '{user}' requires running as root")]
    NotSuperuser { user: String },
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("user lookup failed: {0}")]
    IdentityLookup(String),
    #[error(transparent)]
    Import(#[from] ImportError),
}
