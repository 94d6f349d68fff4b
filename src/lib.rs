//! # Rafale
//!
//! **Rafale** is an embeddable HTTP/1.1 server library for Rust built on the
//! `may` coroutine runtime. It gives the embedding application full control
//! over responses through a small generator-style API: handlers drive a
//! [`Response`] with builder calls and it emits wire-formatted bytes through
//! a pluggable sink, so the same core works buffered or streaming.
//!
//! ## Architecture
//!
//! - **[`parser`]** - Incremental HTTP/1.1 request parsing on top of `httparse`
//! - **[`response`]** - The response state machine, chunked transfer encoding
//!   and the status reason table
//! - **[`router`]** - Trie-based path routing with status-code fallback pages
//! - **[`server`]** - Coroutine-per-connection TCP transport
//! - **[`runtime_config`]** - Environment variable based runtime tuning
//!
//! The layers are separable: the parser, response generator and router have
//! no I/O of their own, so an embedder with its own transport can use them
//! directly and skip [`server`] entirely.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use http::Method;
//! use rafale::{HttpServer, Router};
//!
//! let mut router = Router::new();
//!
//! router.on(Method::GET, "/", |_req, res| {
//!     res.begin(200)?
//!         .header("Content-Type", "text/plain")?
//!         .write("hello from rafale")?
//!         .end()
//! });
//!
//! router.on_error(404, |_req, res| {
//!     res.begin(0)?.write("nothing here")?.end()
//! });
//!
//! let server = HttpServer::new(Arc::new(router));
//! let handle = server.start("127.0.0.1:8080").expect("bind failed");
//! handle.join().expect("server panicked");
//! ```

pub mod error;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use error::Error;
pub use headers::HeaderMap;
pub use parser::{ParseStatus, RequestParser};
pub use request::Request;
pub use response::{Chunk, Response, ResponseSink};
pub use router::Router;
pub use runtime_config::RuntimeConfig;
pub use server::{HttpServer, ServerHandle};
