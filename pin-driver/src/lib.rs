//! Host-side driver
//!
//! Owns the host's native module, walks the host pipeline and runs a
//! plugin session at each injection point it reaches.

mod session;
mod pipeline;
mod connect;

pub use session::{ErrorPolicy, HostConfig, HostSession, ReachOutcome};
pub use pipeline::{run_pipeline, PipelineReport};
pub use connect::{connect_child, connect_in_process, ServerHandle, ServerProcess};

use pin_common::PluginError;
use pin_native::NativeIoError;
use pin_protocol::ProtocolError;
use pin_server::{ConfigError, RegistryError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A plugin failure that the error policy made fatal
    #[error(transparent)]
    Plugin(PluginError),

    #[error("server refused the session: {0}")]
    Refused(String),

    #[error("session already ended after a protocol failure")]
    SessionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Native(#[from] NativeIoError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
