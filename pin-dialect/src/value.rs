//! Value and block identities, and operands
//!
//! Values and blocks are referred to by id only. A value id names exactly
//! one definition site inside its function: a parameter or an op result.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueId(pub u32);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "^bb{}", self.0)
    }
}

/// Operand of an operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    /// SSA value defined in the same function
    Value(ValueId),
    /// Raw integer constant
    Const(i64),
    /// Address of a global variable
    Global(String),
    /// Address of a function
    Func(String),
    Undef,
}

impl Operand {
    pub fn as_value(&self) -> Option<ValueId> {
        match self {
            Operand::Value(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(id) => write!(f, "{id}"),
            Operand::Const(c) => write!(f, "{c}"),
            Operand::Global(name) => write!(f, "@{name}"),
            Operand::Func(name) => write!(f, "&@{name}"),
            Operand::Undef => write!(f, "undef"),
        }
    }
}
