//! Dialect module: functions, globals and named types of one translation unit

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use crate::{FuncOp, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Linkage {
    External,
    Internal,
    Private,
}

/// Static initializer of a global
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalInit {
    Int(i64),
    Array(Vec<i64>),
    /// Address of another global
    Global(String),
    /// Address of a function
    Func(String),
    Undef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalOp {
    pub symbol: String,
    pub ty: Type,
    pub constant: bool,
    pub init: Option<GlobalInit>,
    pub linkage: Linkage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialectModule {
    pub name: String,
    pub functions: Vec<FuncOp>,
    pub globals: Vec<GlobalOp>,
    pub type_defs: BTreeMap<String, Type>,
}

impl DialectModule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            functions: Vec::new(),
            globals: Vec::new(),
            type_defs: BTreeMap::new(),
        }
    }

    /// Lookup table from function symbol to its index in `functions`.
    ///
    /// Call edges are resolved through this table, never through references.
    pub fn symbol_table(&self) -> HashMap<&str, usize> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (f.symbol.as_str(), i))
            .collect()
    }

    pub fn function(&self, symbol: &str) -> Option<&FuncOp> {
        self.functions.iter().find(|f| f.symbol == symbol)
    }

}

impl fmt::Display for DialectModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module @{} {{", self.name)?;
        for (name, ty) in &self.type_defs {
            writeln!(f, "  pin.type @{name} = {ty}")?;
        }
        for global in &self.globals {
            write!(
                f,
                "  pin.global {:?} @{} : {}",
                global.linkage, global.symbol, global.ty
            )?;
            if global.constant {
                write!(f, " constant")?;
            }
            if let Some(init) = &global.init {
                write!(f, " = {init:?}")?;
            }
            writeln!(f)?;
        }
        for function in &self.functions {
            write!(f, "{function}")?;
        }
        writeln!(f, "}}")
    }
}
