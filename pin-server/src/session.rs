//! One host connection
//!
//! A session owns its transport and a scheduler with freshly created
//! passes. Nothing here outlives the connection.

use log::{debug, info, warn};
use pin_common::{ErrorCode, PluginError};
use pin_dialect::DIALECT_VERSION;
use pin_protocol::{Message, ProtocolError, ResultPayload, Transport};
use crate::{BatchOutcome, FrozenRegistry, Scheduler, SchedulerError};

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Host said goodbye
    Closed,
    /// Host cancelled with `Abort`
    Aborted,
    /// Host went away without a goodbye
    Disconnected,
}

pub struct Session<T: Transport> {
    transport: T,
    scheduler: Scheduler,
    server: String,
    passes: Vec<String>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, registry: &FrozenRegistry, server: &str) -> Self {
        Self {
            transport,
            scheduler: Scheduler::new(registry),
            server: server.to_string(),
            passes: registry.describe(),
        }
    }

    pub fn run(mut self) -> Result<SessionEnd, ProtocolError> {
        match self.serve() {
            Err(ProtocolError::Disconnected) => {
                info!("host disconnected; dropping session");
                Ok(SessionEnd::Disconnected)
            }
            other => other,
        }
    }

    fn serve(&mut self) -> Result<SessionEnd, ProtocolError> {
        self.handshake()?;

        loop {
            let envelope = self.transport.recv(None)?;
            match envelope.body {
                Message::Invoke { inject_point, module } => {
                    debug!("invoke at {inject_point} on module @{}", module.name);
                    let payload = match self.scheduler.dispatch(inject_point, &module) {
                        Ok(BatchOutcome::NoChange) => ResultPayload::NoChange,
                        Ok(BatchOutcome::Changed(module)) => ResultPayload::Module(module),
                        Ok(BatchOutcome::Failed { pass, error }) => {
                            error_payload(error, Some(pass))
                        }
                        Err(e @ SchedulerError::MalformedInput { .. }) => ResultPayload::Error {
                            code: ErrorCode::MalformedResult,
                            message: e.to_string(),
                            pass: None,
                        },
                        Err(e @ SchedulerError::Aborted) => ResultPayload::Error {
                            code: ErrorCode::Protocol,
                            message: e.to_string(),
                            pass: None,
                        },
                    };
                    self.transport.send_message(Message::Result { inject_point, payload })?;
                }
                Message::Abort { reason } => {
                    warn!("host aborted the session: {reason}");
                    self.scheduler.abort();
                    return Ok(SessionEnd::Aborted);
                }
                Message::Goodbye => {
                    info!("session closed");
                    return Ok(SessionEnd::Closed);
                }
                other => return Err(ProtocolError::unexpected("invoke", &other)),
            }
        }
    }

    fn handshake(&mut self) -> Result<(), ProtocolError> {
        let envelope = self.transport.recv(None)?;
        let (client, dialect_version) = match envelope.body {
            Message::Hello { client, dialect_version } => (client, dialect_version),
            other => return Err(ProtocolError::unexpected("hello", &other)),
        };
        if dialect_version != DIALECT_VERSION {
            let reason = format!(
                "dialect version {dialect_version} is not supported \
                 (server speaks {DIALECT_VERSION})"
            );
            self.transport.send_message(Message::Abort { reason })?;
            return Err(ProtocolError::VersionMismatch {
                expected: DIALECT_VERSION,
                found: dialect_version,
            });
        }

        info!("session opened by '{client}'");
        self.transport.send_message(Message::Welcome {
            server: self.server.clone(),
            passes: self.passes.clone(),
        })
    }
}

fn error_payload(error: PluginError, pass: Option<String>) -> ResultPayload {
    let code = error.code();
    let message = match error {
        PluginError::PassFailure { message, .. } => message,
        other => other.to_string(),
    };
    ResultPayload::Error { code, message, pass }
}
