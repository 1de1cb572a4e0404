//! Error handling for the plugin pass engine
//!
//! This module defines the error taxonomy shared by host and server and
//! the diagnostic reporting used to surface failures to the host.

use crate::types::InjectPoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Top-level error type for everything that can go wrong around an injection point
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    #[error("unsupported construct in '{function}': {construct}")]
    UnsupportedConstruct {
        function: String,
        construct: String,
    },

    #[error("malformed result at {inject_point}: {reason}")]
    MalformedResult {
        inject_point: InjectPoint,
        reason: String,
    },

    #[error("pass '{pass}' failed at {inject_point}: {message}")]
    PassFailure {
        inject_point: InjectPoint,
        pass: String,
        message: String,
    },

    #[error("protocol error: {message}")]
    Protocol { message: String },
}

impl PluginError {
    /// Whether compilation can continue without the optimization that failed.
    ///
    /// Protocol errors leave the two IR copies out of sync and end the session.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PluginError::Protocol { .. })
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            PluginError::UnsupportedConstruct { .. } => ErrorCode::UnsupportedConstruct,
            PluginError::MalformedResult { .. } => ErrorCode::MalformedResult,
            PluginError::PassFailure { .. } => ErrorCode::PassFailure,
            PluginError::Protocol { .. } => ErrorCode::Protocol,
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        PluginError::Protocol { message: message.into() }
    }

    /// Build a diagnostic for this error, attributed to an injection point
    pub fn to_diagnostic(
        &self,
        severity: Severity,
        inject_point: Option<InjectPoint>,
    ) -> Diagnostic {
        let (inject_point, pass) = match self {
            PluginError::MalformedResult { inject_point, .. } => (Some(*inject_point), None),
            PluginError::PassFailure { inject_point, pass, .. } => {
                (Some(*inject_point), Some(pass.clone()))
            }
            _ => (inject_point, None),
        };
        Diagnostic {
            severity,
            code: self.code(),
            message: self.to_string(),
            inject_point,
            pass,
            notes: Vec::new(),
        }
    }
}

/// Wire form of the error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    UnsupportedConstruct,
    MalformedResult,
    PassFailure,
    Protocol,
}

impl ErrorCode {
    pub fn is_recoverable(self) -> bool {
        self != ErrorCode::Protocol
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::UnsupportedConstruct => "unsupported-construct",
            ErrorCode::MalformedResult => "malformed-result",
            ErrorCode::PassFailure => "pass-failure",
            ErrorCode::Protocol => "protocol",
        };
        write!(f, "{name}")
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic naming the injection point and pass responsible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    pub inject_point: Option<InjectPoint>,
    pub pass: Option<String>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: ErrorCode, message: String) -> Self {
        Self {
            severity,
            code,
            message,
            inject_point: None,
            pass: None,
            notes: Vec::new(),
        }
    }

    pub fn at(mut self, inject_point: InjectPoint) -> Self {
        self.inject_point = Some(inject_point);
        self
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity, self.code)?;
        match (&self.inject_point, &self.pass) {
            (Some(point), Some(pass)) => write!(f, " at {point} in pass '{pass}'")?,
            (Some(point), None) => write!(f, " at {point}")?,
            (None, Some(pass)) => write!(f, " in pass '{pass}'")?,
            (None, None) => {}
        }
        write!(f, ": {}", self.message)?;

        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }

        Ok(())
    }
}

/// Error reporter for collecting and displaying diagnostics
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            error_count: 0,
            warning_count: 0,
        }
    }

    /// Record a diagnostic and return it for further decoration
    pub fn report(&mut self, diagnostic: Diagnostic) -> &mut Diagnostic {
        match diagnostic.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Note => {}
        }
        self.diagnostics.push(diagnostic);
        let last = self.diagnostics.len() - 1;
        &mut self.diagnostics[last]
    }

    /// Check if any errors have been reported
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self) {
        for diagnostic in &self.diagnostics {
            eprintln!("{}", diagnostic);
        }
    }

    /// Create a summary string
    pub fn summary(&self) -> String {
        match (self.error_count, self.warning_count) {
            (0, 0) => "No errors or warnings".to_string(),
            (0, w) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (e, 0) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (e, w) => format!(
                "{} error{} and {} warning{}",
                e,
                if e == 1 { "" } else { "s" },
                w,
                if w == 1 { "" } else { "s" }
            ),
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
