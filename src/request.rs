//! Incoming HTTP request.

use crate::headers::HeaderMap;
use http::Method;

/// A completed HTTP request, as produced by [`RequestParser`](crate::parser::RequestParser).
///
/// This is a plain data holder: the response side of the library is where
/// the state machinery lives. Fields are public so tests and embedders can
/// construct requests directly; by convention a request is not mutated once
/// built.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// The raw request target: path plus any query/fragment, unparsed.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// Set when the request carries an `Upgrade` header (e.g. WebSocket
    /// handshakes). The library does not implement any upgraded protocol;
    /// the flag merely lets embedders detect and take over the connection.
    pub upgrade: bool,
}

impl Request {
    /// Convenience constructor for a bodyless request, mostly for tests
    /// and for routing synthetic requests.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Request {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            upgrade: false,
        }
    }
}
