//! Plugin Pass Engine - Common Types and Errors
//!
//! This crate contains the identifiers, injection points, error taxonomy
//! and diagnostic reporting shared by the host side and the pass server.

pub mod error;
pub mod types;
pub mod source_loc;

pub use error::{Diagnostic, ErrorCode, ErrorReporter, PluginError, Severity};
pub use types::*;
pub use source_loc::SourceLocation;
