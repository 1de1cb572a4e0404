//! Protocol messages

use pin_common::{ErrorCode, InjectPoint};
use pin_dialect::{DialectModule, DIALECT_VERSION};
use serde::{Deserialize, Serialize};

/// Envelope revision in the high half, dialect version in the low half.
/// Either side changing bumps the schema.
pub const SCHEMA_VERSION: u32 = (1 << 16) | DIALECT_VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub schema_version: u32,
    pub body: Message,
}

impl Envelope {
    pub fn new(body: Message) -> Self {
        Self { schema_version: SCHEMA_VERSION, body }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Message {
    /// Host opens a session
    Hello { client: String, dialect_version: u32 },
    /// Server accepts, listing its registered passes as `point:name`
    Welcome { server: String, passes: Vec<String> },
    /// Run the batch bound to `inject_point` on `module`
    Invoke { inject_point: InjectPoint, module: DialectModule },
    Result { inject_point: InjectPoint, payload: ResultPayload },
    /// Host cancels the session
    Abort { reason: String },
    Goodbye,
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Hello { .. } => "hello",
            Message::Welcome { .. } => "welcome",
            Message::Invoke { .. } => "invoke",
            Message::Result { .. } => "result",
            Message::Abort { .. } => "abort",
            Message::Goodbye => "goodbye",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResultPayload {
    NoChange,
    Module(DialectModule),
    Error {
        code: ErrorCode,
        message: String,
        pass: Option<String>,
    },
}
