//! Ways of reaching a pass server

use log::{debug, warn};
use pin_native::Module;
use pin_protocol::{MemoryTransport, ProtocolError, StreamTransport};
use pin_server::{builtin_registry, PassServer, ServerConfig, SessionEnd};
use std::io;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use crate::{DriverError, HostConfig, HostSession};

pub type ServerHandle = JoinHandle<Result<SessionEnd, ProtocolError>>;

/// A server child process. Dropping it without [`ServerProcess::wait`]
/// kills the child, so a server stuck in a pass never outlives the host.
pub struct ServerProcess {
    child: Option<Child>,
}

impl ServerProcess {
    pub fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Wait for an orderly exit after the session ended
    pub fn wait(mut self) -> io::Result<Option<ExitStatus>> {
        match self.child.take() {
            Some(mut child) => child.wait().map(Some),
            None => Ok(None),
        }
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Ok(Some(status)) = child.try_wait() {
            debug!("server already exited: {status}");
            return;
        }
        warn!("killing server process {}", child.id());
        if let Err(e) = child.kill() {
            debug!("could not kill server: {e}");
        }
        if let Err(e) = child.wait() {
            debug!("could not reap server: {e}");
        }
    }
}

/// Run the built-in passes on a thread of this process
pub fn connect_in_process(
    module: Module,
    config: HostConfig,
    server_config: &ServerConfig,
) -> Result<(HostSession<MemoryTransport>, ServerHandle), DriverError> {
    let registry = builtin_registry(server_config)?.freeze();
    let (transport, handle) = PassServer::new(registry).spawn_in_process()?;
    let session = HostSession::connect(transport, module, config)?;
    Ok((session, handle))
}

/// Start `server` as a child process speaking the protocol on its stdio
pub fn connect_child(
    server: &Path,
    server_config: Option<&Path>,
    module: Module,
    config: HostConfig,
) -> Result<(HostSession<StreamTransport<ChildStdin>>, ServerProcess), DriverError> {
    let mut command = Command::new(server);
    if let Some(path) = server_config {
        command.arg("--config").arg(path);
    }
    command.arg("serve").stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::inherit());
    debug!("spawning {:?}", command);

    let mut child = command.spawn()?;
    let (stdin, stdout) = (child.stdin.take(), child.stdout.take());
    // From here on every early return kills the child
    let process = ServerProcess::new(child);
    let (Some(stdin), Some(stdout)) = (stdin, stdout) else {
        return Err(DriverError::Refused("server stdio was not captured".to_string()));
    };
    let transport = StreamTransport::new(stdout, stdin)?;
    let session = HostSession::connect(transport, module, config)?;
    Ok((session, process))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_dropping_a_live_server_kills_it() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let process = ServerProcess::new(child);
        assert!(process.id().is_some());

        let start = Instant::now();
        drop(process);
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
