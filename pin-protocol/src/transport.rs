//! Frame transports

use log::debug;
use std::io::{Cursor, Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use crate::{decode_body, encode_frame, read_frame, write_frame, Envelope, Message, ProtocolError};

/// A bidirectional, ordered channel of envelopes
pub trait Transport: Send {
    fn send(&mut self, envelope: &Envelope) -> Result<(), ProtocolError>;

    /// Wait for the next envelope. `None` waits forever.
    fn recv(&mut self, timeout: Option<Duration>) -> Result<Envelope, ProtocolError>;

    fn send_message(&mut self, message: Message) -> Result<(), ProtocolError> {
        self.send(&Envelope::new(message))
    }
}

fn recv_from<T>(rx: &Receiver<T>, timeout: Option<Duration>) -> Result<T, ProtocolError> {
    match timeout {
        Some(limit) => rx.recv_timeout(limit).map_err(|e| match e {
            RecvTimeoutError::Timeout => ProtocolError::Timeout,
            RecvTimeoutError::Disconnected => ProtocolError::Disconnected,
        }),
        None => rx.recv().map_err(|_| ProtocolError::Disconnected),
    }
}

type Incoming = Result<Envelope, ProtocolError>;

/// Transport over a reader/writer pair such as child process pipes or stdio.
///
/// Frames are read on a dedicated thread so `recv` can give up after a
/// timeout without leaving a half-read frame behind.
pub struct StreamTransport<W: Write + Send> {
    writer: W,
    incoming: Receiver<Incoming>,
}

impl<W: Write + Send> StreamTransport<W> {
    pub fn new<R: Read + Send + 'static>(reader: R, writer: W) -> Result<Self, ProtocolError> {
        let (tx, incoming) = mpsc::channel();
        thread::Builder::new()
            .name("pin-frame-reader".to_string())
            .spawn(move || read_loop(reader, tx))?;
        Ok(Self { writer, incoming })
    }
}

fn read_loop<R: Read>(mut reader: R, tx: Sender<Incoming>) {
    loop {
        let item = match read_frame(&mut reader) {
            Ok(Some(body)) => decode_body(&body),
            Ok(None) => {
                debug!("peer closed the stream");
                return;
            }
            Err(e) => Err(e),
        };
        let failed = item.is_err();
        if tx.send(item).is_err() || failed {
            return;
        }
    }
}

impl<W: Write + Send> Transport for StreamTransport<W> {
    fn send(&mut self, envelope: &Envelope) -> Result<(), ProtocolError> {
        write_frame(&mut self.writer, envelope)
    }

    fn recv(&mut self, timeout: Option<Duration>) -> Result<Envelope, ProtocolError> {
        recv_from(&self.incoming, timeout)?
    }
}

/// In-process transport. Frames still go through the byte codec so both
/// ends behave exactly as they would across a process boundary.
pub struct MemoryTransport {
    outgoing: Sender<Vec<u8>>,
    incoming: Receiver<Vec<u8>>,
}

impl MemoryTransport {
    /// Two connected ends
    pub fn pair() -> (MemoryTransport, MemoryTransport) {
        let (a_tx, b_rx) = mpsc::channel();
        let (b_tx, a_rx) = mpsc::channel();
        (
            MemoryTransport { outgoing: a_tx, incoming: a_rx },
            MemoryTransport { outgoing: b_tx, incoming: b_rx },
        )
    }

    /// Push an already encoded frame, bypassing envelope serialization
    pub fn send_raw(&mut self, frame: Vec<u8>) -> Result<(), ProtocolError> {
        self.outgoing.send(frame).map_err(|_| ProtocolError::Disconnected)
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, envelope: &Envelope) -> Result<(), ProtocolError> {
        let frame = encode_frame(envelope)?;
        self.send_raw(frame)
    }

    fn recv(&mut self, timeout: Option<Duration>) -> Result<Envelope, ProtocolError> {
        let frame = recv_from(&self.incoming, timeout)?;
        let body = read_frame(&mut Cursor::new(frame))?.ok_or(ProtocolError::Disconnected)?;
        decode_body(&body)
    }
}
