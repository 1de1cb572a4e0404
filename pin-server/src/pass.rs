//! The pass contract
//!
//! A pass answers two questions at its injection point: whether it wants
//! to run on this module (`gate`) and what it does to it (`optimize`).

use pin_common::InjectPoint;
use pin_dialect::{DialectModule, VerifyError};
use thiserror::Error;

/// What `gate` may look at. The module is read-only here.
pub struct GateContext<'a> {
    pub inject_point: InjectPoint,
    pub module: &'a DialectModule,
}

pub struct PassContext {
    pub inject_point: InjectPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Changed,
    NoChange,
}

#[derive(Error, Debug)]
pub enum PassError {
    #[error("{0}")]
    Failed(String),

    #[error("left the module invalid: {0}")]
    Invalid(#[from] VerifyError),
}

impl PassError {
    pub fn failed(message: impl Into<String>) -> Self {
        PassError::Failed(message.into())
    }
}

/// A server-side pass. One instance is created per session, so passes may
/// keep per-session state behind `&mut self`.
pub trait Pass: Send {
    fn name(&self) -> &str;

    fn gate(&self, ctx: &GateContext<'_>) -> bool;

    fn optimize(
        &mut self,
        module: &mut DialectModule,
        ctx: &PassContext,
    ) -> Result<PassOutcome, PassError>;
}
