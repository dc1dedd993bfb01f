//! Instance control and code execution for Caché, Ensemble and IRIS.
//!
//! This crate ties the file formats of `isctl-schema` and the tool backends of
//! `isctl-runtime` into the `Controller`, the central API for listing,
//! starting, stopping and waiting on instances and for executing ObjectScript
//! inside them. The `Instance` snapshot is decoded from `qlist` records and
//! carries the optional credential used for every tool it spawns.

pub mod cancel;
pub mod controller;
pub mod dat;
pub mod execute;
pub mod identity;
pub mod instance;
pub mod qlist;

pub use cancel::{install_signal_handler, CancelToken};
pub use controller::Controller;
pub use dat::DatFile;
pub use execute::LOAD_SUCCESS_MARKER;
pub use instance::Instance;

use isctl_schema::InstanceStatus;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config file error: {0}")]
    Schema(#[from] isctl_schema::SchemaError),
    #[error("runtime error: {0}")]
    Runtime(#[from] isctl_runtime::RuntimeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed qlist record ({reason}): {record}")]
    MalformedRecord { record: String, reason: String },
    #[error("instance not found: {0}")]
    InstanceNotFound(String),
    #[error("error running {action} for instance {name}: {output}")]
    ActionFailed {
        action: &'static str,
        name: String,
        output: String,
    },
    #[error("failed to {action} instance {name}, status: {status}")]
    StateVerification {
        action: &'static str,
        name: String,
        status: InstanceStatus,
    },
    #[error("instance {name} not ready after {timeout:?}")]
    DeadlineExceeded { name: String, timeout: Duration },
    #[error("wait for instance {0} was cancelled")]
    Cancelled(String),
    #[error("{key} not found in {}", path.display())]
    MissingIdentity { key: &'static str, path: PathBuf },
    #[error("routine load failed: {output}")]
    LoadFailed { output: String },
    #[error("execution in namespace {namespace} failed with {}", describe_exit(*code))]
    ExecFailed {
        namespace: String,
        code: Option<i32>,
    },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code (killed by signal)".to_owned(),
    }
}

impl From<isctl_runtime::ImportError> for CoreError {
    fn from(e: isctl_runtime::ImportError) -> Self {
        Self::Runtime(e.into())
    }
}
