//! Translation Layer
//!
//! Bidirectional mapping between the host compiler's native IR and the
//! plugin dialect. Both directions are structural and lossless for every
//! construct the dialect covers:
//!
//! ```text
//! from_dialect(&to_dialect(&m)?)? == m
//! ```
//!
//! Anything the dialect cannot express is refused with
//! [`TranslateError::UnsupportedConstruct`]; nothing is dropped on the way.
//! Translation keeps no state between calls, so different modules can be
//! translated concurrently.

mod types;
mod to_dialect;
mod from_dialect;

pub use to_dialect::to_dialect;
pub use from_dialect::from_dialect;

use pin_common::{InjectPoint, PluginError};
use pin_dialect::VerifyError;
use thiserror::Error;

/// `to_dialect` only ever fails with `UnsupportedConstruct`: every native
/// type and operand it accepts has a dialect form. The other variants come
/// from `from_dialect`, i.e. from IR a pass handed back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslateError {
    #[error("unsupported construct in '{function}': {construct}")]
    UnsupportedConstruct { function: String, construct: String },

    #[error("malformed dialect module: {0}")]
    Malformed(#[from] VerifyError),

    /// Dialect integer width with no native counterpart
    #[error("integer width {bits} has no native type")]
    InvalidType { bits: u8 },

    #[error("invalid {op} in '{function}': {reason}")]
    InvalidOperation {
        function: String,
        op: &'static str,
        reason: String,
    },
}

impl TranslateError {
    pub(crate) fn unsupported(function: &str, construct: impl Into<String>) -> Self {
        TranslateError::UnsupportedConstruct {
            function: function.to_string(),
            construct: construct.into(),
        }
    }

    /// Classify for the host. Since only `UnsupportedConstruct` arises on the
    /// way out, every other variant describes returned IR and is a malformed
    /// result.
    pub fn into_plugin_error(self, inject_point: InjectPoint) -> PluginError {
        match self {
            TranslateError::UnsupportedConstruct { function, construct } => {
                PluginError::UnsupportedConstruct { function, construct }
            }
            other => PluginError::MalformedResult {
                inject_point,
                reason: other.to_string(),
            },
        }
    }
}
