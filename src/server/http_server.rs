//! Coroutine-based connection handling.
//!
//! One coroutine accepts connections; each connection gets its own coroutine
//! that reads bytes into a [`RequestParser`], routes every parsed request,
//! and writes response bytes back through a [`ResponseSink`] wrapping the
//! stream. Coroutines make the blocking read/write style cheap enough to run
//! one per connection.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use may::coroutine::JoinHandle;
use may::net::{TcpListener, TcpStream};

use crate::parser::{ParseStatus, RequestParser};
use crate::request::Request;
use crate::response::{Response, ResponseSink};
use crate::router::Router;
use crate::runtime_config::RuntimeConfig;

/// An embeddable HTTP/1.1 server around a [`Router`].
pub struct HttpServer {
    router: Arc<Router>,
    config: RuntimeConfig,
}

/// Handle to a running server.
///
/// Provides the bound address, readiness polling for tests, graceful stop,
/// and joining the accept coroutine.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// The address the server actually bound, with the OS-assigned port
    /// resolved when binding to port 0.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to accept connections.
    ///
    /// Polls the bound address with plain TCP connects. Useful in tests to
    /// avoid racing the accept loop.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the server is not reachable within ~250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if std::net::TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop the server by cancelling the accept coroutine.
    pub fn stop(self) {
        // SAFETY: cancelling the accept coroutine is the intended shutdown
        // path; the handle is owned here and joined immediately after.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
    }

    /// Block until the accept coroutine finishes. The server runs until
    /// stopped externally.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept coroutine panicked.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

impl HttpServer {
    /// Create a server with configuration taken from the environment.
    pub fn new(router: Arc<Router>) -> Self {
        Self::with_config(router, RuntimeConfig::from_env())
    }

    pub fn with_config(router: Arc<Router>, config: RuntimeConfig) -> Self {
        HttpServer { router, config }
    }

    /// Bind `addr` and start serving.
    ///
    /// Binding port 0 picks a free port; read the real one from
    /// [`ServerHandle::addr`].
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;

        may::config().set_stack_size(self.config.stack_size);

        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;
        let router = self.router;
        let read_buf_size = self.config.read_buf_size;

        tracing::info!(%addr, "listening");

        let handle = may::go!(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => {
                        let router = Arc::clone(&router);
                        may::go!(move || {
                            handle_connection(stream, router, read_buf_size);
                        });
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "accept failed");
                    }
                }
            }
        });

        Ok(ServerHandle { addr, handle })
    }
}

/// Writes response bytes straight to the connection.
///
/// A write failure marks the sink unhealthy so the connection loop can stop
/// reading; later emissions on the same response are dropped silently.
struct ConnectionSink {
    stream: TcpStream,
    healthy: Arc<AtomicBool>,
}

impl ResponseSink for ConnectionSink {
    fn on_data(&mut self, _res: &mut Response, data: &[u8]) {
        if !self.healthy.load(Ordering::Relaxed) {
            return;
        }
        if let Err(err) = self.stream.write_all(data) {
            tracing::debug!(error = %err, "write failed, dropping connection");
            self.healthy.store(false, Ordering::Relaxed);
        }
    }

    fn on_end(&mut self, res: &mut Response) {
        tracing::debug!(code = res.code(), "response complete");
    }
}

fn handle_connection(mut stream: TcpStream, router: Arc<Router>, read_buf_size: usize) {
    let peer = stream.peer_addr().ok();
    tracing::debug!(?peer, "connection open");

    let mut parser = RequestParser::new();
    let mut buf = vec![0u8; read_buf_size];

    'conn: loop {
        let n = match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) => {
                tracing::debug!(?peer, error = %err, "read failed");
                break;
            }
        };

        // Feed the new bytes, then keep draining in case several requests
        // were pipelined into one read.
        let mut input: &[u8] = &buf[..n];
        loop {
            match parser.feed(input) {
                Ok(ParseStatus::Complete(req)) => {
                    input = &[];
                    let wants_close = req
                        .headers
                        .get("Connection")
                        .is_some_and(|v| v.eq_ignore_ascii_case("close"));
                    let upgrade = req.upgrade;

                    if !serve_request(&stream, &router, req) {
                        break 'conn;
                    }
                    if wants_close || upgrade {
                        break 'conn;
                    }
                }
                Ok(ParseStatus::NeedMoreData) => continue 'conn,
                Err(err) => {
                    tracing::debug!(?peer, error = %err, "rejecting malformed request");
                    send_bad_request(&stream);
                    break 'conn;
                }
            }
        }
    }

    tracing::debug!(?peer, "connection closed");
}

/// Route one request and make sure a response goes out. Returns `false` if
/// the connection is no longer usable.
fn serve_request(stream: &TcpStream, router: &Router, req: Request) -> bool {
    let sink_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(err) => {
            tracing::debug!(error = %err, "stream clone failed");
            return false;
        }
    };
    let healthy = Arc::new(AtomicBool::new(true));

    let req = Arc::new(req);
    let mut res = Response::for_request(Arc::clone(&req));
    res.set_sink(Box::new(ConnectionSink {
        stream: sink_stream,
        healthy: Arc::clone(&healthy),
    }));

    if let Err(err) = router.route(&req, &mut res) {
        tracing::error!(error = %err, "routing failed");
        return false;
    }

    // A handler (or a missing status page) may leave the response open;
    // finish it so the client is not left hanging.
    if !res.ended() {
        if let Err(err) = res.end() {
            tracing::error!(error = %err, "failed to end response");
            return false;
        }
    }

    healthy.load(Ordering::Relaxed)
}

/// Minimal 400 reply for bytes the parser rejected outright.
fn send_bad_request(stream: &TcpStream) {
    let mut res = Response::new();
    let message = res
        .begin(400)
        .and_then(|r| r.header("Content-Length", "0"))
        .and_then(|r| r.header("Connection", "close"))
        .map(|r| r.to_http(false));

    if let Ok(message) = message {
        if let Ok(mut stream) = stream.try_clone() {
            if let Err(err) = stream.write_all(&message) {
                tracing::debug!(error = %err, "failed to send 400");
            }
        }
    }
}
