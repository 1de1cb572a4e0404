//! Pass server
//!
//! Hosts the injection-point registry, the pass contract and the batch
//! scheduler, and serves host sessions over any [`pin_protocol::Transport`].
//!
//! ## Architecture
//!
//! - `pass` - The `Pass` trait and its contexts
//! - `registry` - Pass registration and the frozen registry
//! - `scheduler` - Atomic batch execution per injection point
//! - `session` - One host connection
//! - `server` - Session entry points
//! - `config` - Server configuration
//! - `passes` - Built-in passes

pub mod pass;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod server;
pub mod config;
pub mod passes;

pub use pass::{GateContext, Pass, PassContext, PassError, PassOutcome};
pub use registry::{FrozenRegistry, OrderKey, PassFactory, PassRecord, PassRegistry, RegistryError};
pub use scheduler::{BatchOutcome, Scheduler, SchedulerError, SchedulerState};
pub use session::{Session, SessionEnd};
pub use server::{PassServer, SERVER_NAME};
pub use config::{ConfigError, InlineConfig, ServerConfig};
pub use passes::{builtin_registry, InlineFunctionPass};

#[cfg(test)]
mod tests;
