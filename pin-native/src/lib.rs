//! Host compiler native IR
//!
//! This is the in-memory representation the host compiler optimizes and
//! lowers. The pass server never sees it directly: at every injection
//! point it is translated into the plugin dialect and back.
//!
//! ## Architecture
//!
//! - `types` - Type system (IrType)
//! - `values` - Value representations
//! - `ops` - Binary and unary operations
//! - `instructions` - IR instructions
//! - `blocks` - Basic block management
//! - `function` - Function definitions and attributes
//! - `module` - Module and global variables
//! - `builder` - IR construction utilities

pub use self::types::IrType;
pub use self::values::Value;
pub use self::ops::{IrBinaryOp, IrUnaryOp};
pub use self::instructions::{Instruction, AsmOperand};
pub use self::blocks::BasicBlock;
pub use self::function::{Function, InlineHint};
pub use self::module::{Module, GlobalVariable, Linkage};
pub use self::builder::IrBuilder;

mod types;
mod values;
mod ops;
mod instructions;
mod blocks;
mod function;
mod module;
mod builder;

use thiserror::Error;

/// Failure to load or store a native module snapshot
#[derive(Error, Debug)]
pub enum NativeIoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid module JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Module {
    /// Read a module previously written with [`Module::to_json`]
    pub fn from_json(text: &str) -> Result<Self, NativeIoError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, NativeIoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &std::path::Path) -> Result<Self, NativeIoError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests;
