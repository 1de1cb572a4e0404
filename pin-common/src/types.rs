//! Common types used on both sides of the plugin boundary
//!
//! Identifiers for native IR entities and the fixed set of injection
//! points at which the host compiler hands control to the pass server.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label identifier for native basic blocks
pub type LabelId = u32;

/// Temporary variable identifier for native IR
pub type TempId = u32;

/// A location in the host compiler's pipeline where registered passes may run.
///
/// The set is closed: the host only ever pauses at one of these points, and
/// every point has a stable wire code so both ends agree on its meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InjectPoint {
    /// After a type has been parsed
    ParseType,
    /// After a declaration has been parsed
    ParseDecl,
    /// While pragmas are registered
    Pragmas,
    /// After a function body has been parsed
    ParseFunction,
    /// Before interprocedural analysis starts
    BeforeIpa,
    /// After the early tree inliner has run
    AfterInline,
    /// After interprocedural analysis
    AfterIpa,
    /// Before every optimization pass of the host
    BeforeEveryPass,
    /// After every optimization pass of the host
    AfterEveryPass,
    /// Before the host's optimization pipeline
    BeforeAllPasses,
    /// After the host's optimization pipeline
    AfterAllPasses,
    /// At the end of the translation unit
    CompileEnd,
    /// When the host's pass manager is being set up
    PassManagerSetup,
}

impl InjectPoint {
    /// Every injection point, in host pipeline order
    pub const ALL: [InjectPoint; 13] = [
        InjectPoint::ParseType,
        InjectPoint::ParseDecl,
        InjectPoint::Pragmas,
        InjectPoint::ParseFunction,
        InjectPoint::PassManagerSetup,
        InjectPoint::BeforeAllPasses,
        InjectPoint::BeforeEveryPass,
        InjectPoint::AfterInline,
        InjectPoint::BeforeIpa,
        InjectPoint::AfterIpa,
        InjectPoint::AfterEveryPass,
        InjectPoint::AfterAllPasses,
        InjectPoint::CompileEnd,
    ];

    /// Stable wire code
    pub fn code(self) -> u8 {
        match self {
            InjectPoint::ParseType => 0,
            InjectPoint::ParseDecl => 1,
            InjectPoint::Pragmas => 2,
            InjectPoint::ParseFunction => 3,
            InjectPoint::BeforeIpa => 4,
            InjectPoint::AfterIpa => 5,
            InjectPoint::BeforeEveryPass => 6,
            InjectPoint::AfterEveryPass => 7,
            InjectPoint::BeforeAllPasses => 8,
            InjectPoint::AfterAllPasses => 9,
            InjectPoint::CompileEnd => 10,
            InjectPoint::PassManagerSetup => 11,
            InjectPoint::AfterInline => 12,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.code() == code)
    }

    /// Stable textual name, as used on the command line and in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            InjectPoint::ParseType => "parse-type",
            InjectPoint::ParseDecl => "parse-decl",
            InjectPoint::Pragmas => "pragmas",
            InjectPoint::ParseFunction => "parse-function",
            InjectPoint::BeforeIpa => "before-ipa",
            InjectPoint::AfterInline => "after-inline",
            InjectPoint::AfterIpa => "after-ipa",
            InjectPoint::BeforeEveryPass => "before-every-pass",
            InjectPoint::AfterEveryPass => "after-every-pass",
            InjectPoint::BeforeAllPasses => "before-all-passes",
            InjectPoint::AfterAllPasses => "after-all-passes",
            InjectPoint::CompileEnd => "compile-end",
            InjectPoint::PassManagerSetup => "pass-manager-setup",
        }
    }
}

impl fmt::Display for InjectPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for InjectPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("unknown injection point '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<u8> = InjectPoint::ALL.iter().map(|p| p.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), InjectPoint::ALL.len());
        for point in InjectPoint::ALL {
            assert_eq!(InjectPoint::from_code(point.code()), Some(point));
        }
        assert_eq!(InjectPoint::from_code(200), None);
    }

    #[test]
    fn test_names_parse_back() {
        for point in InjectPoint::ALL {
            assert_eq!(point.name().parse::<InjectPoint>(), Ok(point));
        }
        assert!("after-lunch".parse::<InjectPoint>().is_err());
        assert_eq!(InjectPoint::BeforeIpa.to_string(), "before-ipa");
    }
}
