//! Source positions attached to host IR
//!
//! Debug-location statements and function attributes carry these through
//! the pass server untouched so line info survives transformation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `file:line:col`, line and column 1-based; 0 means unknown
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self { filename: filename.to_string(), line, column }
    }

    pub fn is_known(&self) -> bool {
        self.line != 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "{}:{}:{}", self.filename, self.line, self.column)
        } else {
            write!(f, "{}:?", self.filename)
        }
    }
}
