//! The TCP transport: a coroutine-per-connection HTTP server.

mod http_server;

pub use http_server::{HttpServer, ServerHandle};
