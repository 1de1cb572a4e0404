//! Host side of a plugin session
//!
//! The host keeps the authoritative native module. At each injection point
//! it ships a dialect copy to the server and merges back whatever the server
//! returns, provided it verifies. Recoverable failures leave the module as
//! it was and become diagnostics; protocol failures end the session.

use log::{debug, info, warn};
use pin_common::{ErrorCode, ErrorReporter, InjectPoint, PluginError, Severity};
use pin_dialect::DIALECT_VERSION;
use pin_native::Module;
use pin_protocol::{Message, ProtocolError, ResultPayload, Transport};
use pin_translate::{from_dialect, to_dialect};
use std::time::Duration;
use crate::DriverError;

/// What happens to recoverable plugin failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Report a warning and keep compiling
    #[default]
    Warn,
    /// Report an error and stop
    Fatal,
}

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub client: String,
    /// Wall-clock limit for each Invoke
    pub budget: Duration,
    pub policy: ErrorPolicy,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            client: concat!("pinc ", env!("CARGO_PKG_VERSION")).to_string(),
            budget: Duration::from_secs(30),
            policy: ErrorPolicy::Warn,
        }
    }
}

/// Result of reaching one injection point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReachOutcome {
    /// Server made no change
    Unchanged,
    /// Server's module was verified and applied
    Applied,
    /// Server reported a failure or returned unusable IR; module kept
    Rejected,
    /// Module could not be expressed in the dialect; no Invoke was sent
    Skipped,
}

pub struct HostSession<T: Transport> {
    transport: T,
    module: Module,
    config: HostConfig,
    reporter: ErrorReporter,
    passes: Vec<String>,
    closed: bool,
}

impl<T: Transport> HostSession<T> {
    /// Handshake with the server
    pub fn connect(
        mut transport: T,
        module: Module,
        config: HostConfig,
    ) -> Result<Self, DriverError> {
        transport.send_message(Message::Hello {
            client: config.client.clone(),
            dialect_version: DIALECT_VERSION,
        })?;
        let passes = match transport.recv(Some(config.budget))?.body {
            Message::Welcome { server, passes } => {
                info!("connected to {server} ({} pass(es))", passes.len());
                passes
            }
            Message::Abort { reason } => return Err(DriverError::Refused(reason)),
            other => return Err(ProtocolError::unexpected("welcome", &other).into()),
        };

        Ok(Self {
            transport,
            module,
            config,
            reporter: ErrorReporter::new(),
            passes,
            closed: false,
        })
    }

    /// Passes the server announced, as `point:name`
    pub fn passes(&self) -> &[String] {
        &self.passes
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// The host pipeline has reached `point`: run the server's batch there
    pub fn reach(&mut self, point: InjectPoint) -> Result<ReachOutcome, DriverError> {
        if self.closed {
            return Err(DriverError::SessionClosed);
        }

        let dialect = match to_dialect(&self.module) {
            Ok(dialect) => dialect,
            Err(e) => {
                self.recover(point, e.into_plugin_error(point))?;
                return Ok(ReachOutcome::Skipped);
            }
        };

        let payload = match self.invoke(point, dialect) {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(point, e)),
        };

        match payload {
            ResultPayload::NoChange => {
                debug!("no change at {point}");
                Ok(ReachOutcome::Unchanged)
            }
            ResultPayload::Module(returned) => match from_dialect(&returned) {
                Ok(native) => {
                    debug!("applied result at {point}");
                    self.module = native;
                    Ok(ReachOutcome::Applied)
                }
                Err(e) => {
                    self.recover(point, e.into_plugin_error(point))?;
                    Ok(ReachOutcome::Rejected)
                }
            },
            ResultPayload::Error { code, message, pass } => {
                let error = match code {
                    ErrorCode::PassFailure => PluginError::PassFailure {
                        inject_point: point,
                        pass: pass.unwrap_or_default(),
                        message,
                    },
                    ErrorCode::MalformedResult => PluginError::MalformedResult {
                        inject_point: point,
                        reason: message,
                    },
                    ErrorCode::UnsupportedConstruct => PluginError::UnsupportedConstruct {
                        function: pass.unwrap_or_default(),
                        construct: message,
                    },
                    ErrorCode::Protocol => {
                        let error = PluginError::Protocol { message };
                        self.report(point, &error, Severity::Error);
                        self.closed = true;
                        return Err(DriverError::Plugin(error));
                    }
                };
                self.recover(point, error)?;
                Ok(ReachOutcome::Rejected)
            }
        }
    }

    /// One Invoke and its matching Result
    fn invoke(
        &mut self,
        point: InjectPoint,
        module: pin_dialect::DialectModule,
    ) -> Result<ResultPayload, ProtocolError> {
        self.transport.send_message(Message::Invoke { inject_point: point, module })?;
        match self.transport.recv(Some(self.config.budget))?.body {
            Message::Result { inject_point, payload } if inject_point == point => Ok(payload),
            Message::Result { inject_point, .. } => Err(ProtocolError::UnexpectedMessage {
                expected: "result",
                found: format!("result for {inject_point}"),
            }),
            other => Err(ProtocolError::unexpected("result", &other)),
        }
    }

    fn report(&mut self, point: InjectPoint, error: &PluginError, severity: Severity) {
        let diagnostic = error.to_diagnostic(severity, Some(point));
        warn!("{diagnostic}");
        self.reporter.report(diagnostic);
    }

    /// Apply the error policy to a recoverable failure
    fn recover(&mut self, point: InjectPoint, error: PluginError) -> Result<(), DriverError> {
        match self.config.policy {
            ErrorPolicy::Warn => {
                self.report(point, &error, Severity::Warning);
                Ok(())
            }
            ErrorPolicy::Fatal => {
                self.report(point, &error, Severity::Error);
                Err(DriverError::Plugin(error))
            }
        }
    }

    /// Protocol failures leave the two copies out of sync: tell the server
    /// to drop its state and refuse further work
    fn fail(&mut self, point: InjectPoint, error: ProtocolError) -> DriverError {
        self.closed = true;
        let plugin_error = PluginError::protocol(error.to_string());
        self.report(point, &plugin_error, Severity::Error);
        if !matches!(error, ProtocolError::Disconnected) {
            let reason = format!("host gave up at {point}: {error}");
            if let Err(e) = self.transport.send_message(Message::Abort { reason }) {
                debug!("could not send abort: {e}");
            }
        }
        DriverError::Protocol(error)
    }

    /// End the session, handing back the module and diagnostics
    pub fn finish(mut self) -> (Module, ErrorReporter) {
        if !self.closed {
            if let Err(e) = self.transport.send_message(Message::Goodbye) {
                debug!("could not send goodbye: {e}");
            }
        }
        (self.module, self.reporter)
    }
}
