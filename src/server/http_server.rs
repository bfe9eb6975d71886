use may::coroutine::JoinHandle;
use may_minihttp::HttpService;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// How long [`ServerHandle::wait_ready`] polls the listener
pub const READY_TIMEOUT: Duration = Duration::from_secs(1);

const READY_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Wrapper around `may_minihttp`'s HTTP server
pub struct HttpServer<T>(pub T);

/// Handle to a running listener.
///
/// Dropping the handle stops the listener; call [`ServerHandle::join`] to
/// serve until the process exits.
pub struct ServerHandle {
    addr: SocketAddr,
    listener: Option<JoinHandle<()>>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait up to [`READY_TIMEOUT`] for the listener to accept connections.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the listener never accepts.
    pub fn wait_ready(&self) -> io::Result<()> {
        self.wait_ready_for(READY_TIMEOUT)
    }

    /// Wait up to `timeout` for the listener to accept connections.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the listener never accepts.
    pub fn wait_ready_for(&self, timeout: Duration) -> io::Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("listener on {} not ready after {timeout:?}", self.addr),
                ));
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
    }

    /// Stop accepting connections and wait for the listener to exit.
    /// Connections already accepted finish on their own coroutines.
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Block until the listener coroutine completes.
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the listener panicked.
    pub fn join(mut self) -> thread::Result<()> {
        match self.listener.take() {
            Some(listener) => listener.join(),
            None => Ok(()),
        }
    }

    fn shutdown(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        // SAFETY: the listener coroutine is unwound at its next yield point
        // (the pending accept). It owns only the listening socket, and its
        // handle is taken here so nothing observes it afterwards.
        #[allow(unsafe_code)]
        unsafe {
            listener.coroutine().cancel();
        }
        if listener.join().is_err() {
            debug!(addr = %self.addr, "Listener coroutine ended by cancellation");
        }
        debug!(addr = %self.addr, "Listener stopped");
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Start listening on the first address `addr` resolves to.
    ///
    /// # Errors
    ///
    /// Returns an error if the address does not resolve or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "address resolves to nothing"))?;
        let listener = may_minihttp::HttpServer(self.0).start(addr)?;
        Ok(ServerHandle {
            addr,
            listener: Some(listener),
        })
    }
}
