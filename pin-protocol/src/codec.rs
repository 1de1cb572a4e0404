//! Length-prefixed JSON frames

use log::trace;
use std::io::{self, Read, Write};
use crate::{Envelope, ProtocolError, SCHEMA_VERSION};

/// Largest body accepted in either direction
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Serialize an envelope into a complete frame, header included
pub fn encode_frame(envelope: &Envelope) -> Result<Vec<u8>, ProtocolError> {
    let body = serde_json::to_vec(envelope)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge { len: body.len(), max: MAX_FRAME_LEN });
    }
    let len = u32::try_from(body.len())
        .map_err(|_| ProtocolError::FrameTooLarge { len: body.len(), max: MAX_FRAME_LEN })?;

    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

pub fn write_frame<W: Write>(writer: &mut W, envelope: &Envelope) -> Result<(), ProtocolError> {
    let frame = encode_frame(envelope)?;
    trace!("sending {} frame ({} bytes)", envelope.body.kind(), frame.len());
    writer.write_all(&frame).map_err(disconnect_or_io)?;
    writer.flush().map_err(disconnect_or_io)?;
    Ok(())
}

/// Read one frame body. `Ok(None)` means the stream ended cleanly between
/// frames; ending inside a frame is an I/O error.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, ProtocolError> {
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        match reader.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge { len, max: MAX_FRAME_LEN });
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Ok(Some(body))
}

/// Decode a frame body, checking the schema version before anything else
pub fn decode_body(body: &[u8]) -> Result<Envelope, ProtocolError> {
    let raw: serde_json::Value = serde_json::from_slice(body)?;
    let found = raw
        .get("schema_version")
        .and_then(serde_json::Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0);
    if found != SCHEMA_VERSION {
        return Err(ProtocolError::VersionMismatch { expected: SCHEMA_VERSION, found });
    }
    Ok(serde_json::from_value(raw)?)
}

fn disconnect_or_io(err: io::Error) -> ProtocolError {
    match err.kind() {
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => ProtocolError::Disconnected,
        _ => ProtocolError::Io(err),
    }
}
