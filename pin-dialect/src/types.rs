//! Dialect type system

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Bool,
    /// Integer of 8, 16, 32 or 64 bits
    Int { bits: u8 },
    Ptr(Box<Type>),
    Array { len: u64, elem: Box<Type> },
    Func {
        ret: Box<Type>,
        params: Vec<Type>,
        vararg: bool,
    },
    Struct {
        name: Option<String>,
        fields: Vec<Type>,
        packed: bool,
    },
    Label,
}

impl Type {
    pub fn int(bits: u8) -> Self {
        Type::Int { bits }
    }

    pub fn ptr_to(pointee: Type) -> Self {
        Type::Ptr(Box::new(pointee))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "none"),
            Type::Bool => write!(f, "bool"),
            Type::Int { bits } => write!(f, "i{bits}"),
            Type::Ptr(pointee) => write!(f, "!ptr<{pointee}>"),
            Type::Array { len, elem } => write!(f, "!array<{len} x {elem}>"),
            Type::Func { ret, params, vararg } => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{p}")?;
                }
                if *vararg { write!(f, ", ...")?; }
                write!(f, ") -> {ret}")
            }
            Type::Struct { name: Some(name), .. } => write!(f, "!struct<{name}>"),
            Type::Struct { name: None, fields, packed } => {
                write!(f, "!struct<{}{{", if *packed { "packed " } else { "" })?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{field}")?;
                }
                write!(f, "}}>")
            }
            Type::Label => write!(f, "!label"),
        }
    }
}
