//! Transport Protocol
//!
//! Messages exchanged between the host compiler and the pass server,
//! the frame codec that puts them on a byte stream, and the transports
//! that carry the frames.
//!
//! ```text
//! host                         server
//!  | -- Hello ------------------> |
//!  | <------------------ Welcome -- |
//!  | -- Invoke(point, module) --> |
//!  | <------- Result(point, ..) -- |
//!  | -- Goodbye / Abort --------> |
//! ```
//!
//! Every frame is a 4-byte big-endian length followed by a JSON
//! [`Envelope`]. At most one `Invoke` is in flight per session.

mod message;
mod codec;
mod transport;

pub use message::{Envelope, Message, ResultPayload, SCHEMA_VERSION};
pub use codec::{decode_body, encode_frame, read_frame, write_frame, MAX_FRAME_LEN};
pub use transport::{MemoryTransport, StreamTransport, Transport};

use pin_common::PluginError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("schema version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("no response within the invoke budget")]
    Timeout,

    #[error("peer disconnected")]
    Disconnected,

    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error("expected {expected}, got {found}")]
    UnexpectedMessage { expected: &'static str, found: String },
}

impl ProtocolError {
    pub fn unexpected(expected: &'static str, found: &Message) -> Self {
        ProtocolError::UnexpectedMessage { expected, found: found.kind().to_string() }
    }

    /// Protocol failures always end the session
    pub fn into_plugin_error(self) -> PluginError {
        PluginError::protocol(self.to_string())
    }
}

#[cfg(test)]
mod tests;
