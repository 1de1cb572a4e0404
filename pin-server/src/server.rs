//! Pass server: accepts sessions against a frozen registry

use log::debug;
use pin_protocol::{MemoryTransport, ProtocolError, Transport};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use crate::{FrozenRegistry, Session, SessionEnd};

pub const SERVER_NAME: &str = concat!("pin-server ", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct PassServer {
    registry: Arc<FrozenRegistry>,
}

impl PassServer {
    pub fn new(registry: Arc<FrozenRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FrozenRegistry {
        &self.registry
    }

    /// Run one session to completion on the calling thread
    pub fn serve<T: Transport>(&self, transport: T) -> Result<SessionEnd, ProtocolError> {
        Session::new(transport, &self.registry, SERVER_NAME).run()
    }

    /// Start a session on its own thread, returning the host's end of the
    /// connection
    pub fn spawn_in_process(
        &self,
    ) -> Result<(MemoryTransport, JoinHandle<Result<SessionEnd, ProtocolError>>), ProtocolError> {
        let (host, server_end) = MemoryTransport::pair();
        let server = self.clone();
        let handle = thread::Builder::new()
            .name("pin-session".to_string())
            .spawn(move || server.serve(server_end))?;
        debug!("spawned in-process session");
        Ok((host, handle))
    }
}
