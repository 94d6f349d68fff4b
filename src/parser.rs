//! Incremental HTTP/1.1 request parsing.
//!
//! The parser accepts bytes in whatever pieces the transport produces and
//! yields a complete [`Request`] once the head and the `Content-Length`-sized
//! body have both arrived. Bytes beyond the first request stay buffered, so
//! pipelined requests come out one per [`feed`](RequestParser::feed) call
//! (feed an empty slice to drain without new input).

use http::Method;
use httparse::Status;

use crate::error::Error;
use crate::headers::HeaderMap;
use crate::request::Request;

const MAX_HEADERS: usize = 32;

/// Outcome of feeding bytes to the parser.
#[derive(Debug)]
pub enum ParseStatus {
    /// The buffered bytes do not yet form a complete request.
    NeedMoreData,
    /// One complete request was parsed and removed from the buffer.
    Complete(Request),
}

/// Accumulates raw bytes and parses requests out of them.
///
/// One parser per connection; it carries no per-request state between
/// completions other than the leftover bytes.
#[derive(Default)]
pub struct RequestParser {
    buf: Vec<u8>,
}

impl RequestParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently buffered and not yet consumed by a parsed request.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Append `data` and try to parse one request from the front of the
    /// buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseFailure`] on a malformed request head, a header
    /// that is not valid UTF-8, an unrecognizable method, or an unparsable
    /// `Content-Length`. The connection should be dropped after a parse
    /// failure; the buffer contents are unspecified.
    pub fn feed(&mut self, data: &[u8]) -> Result<ParseStatus, Error> {
        self.buf.extend_from_slice(data);

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut head = httparse::Request::new(&mut headers);

        let head_len = match head.parse(&self.buf) {
            Ok(Status::Complete(len)) => len,
            Ok(Status::Partial) => return Ok(ParseStatus::NeedMoreData),
            Err(_) => return Err(Error::ParseFailure("malformed request head")),
        };

        let method = head
            .method
            .and_then(|m| Method::from_bytes(m.as_bytes()).ok())
            .ok_or(Error::ParseFailure("unrecognized request method"))?;
        let url = head
            .path
            .ok_or(Error::ParseFailure("missing request target"))?
            .to_string();

        let mut header_map = HeaderMap::new();
        for h in head.headers.iter() {
            let value = std::str::from_utf8(h.value)
                .map_err(|_| Error::ParseFailure("header value is not valid UTF-8"))?;
            header_map.set(h.name, value);
        }

        let content_length = match header_map.get("Content-Length") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| Error::ParseFailure("invalid Content-Length"))?,
            None => 0,
        };

        let total = head_len + content_length;
        if self.buf.len() < total {
            return Ok(ParseStatus::NeedMoreData);
        }

        let body = self.buf[head_len..total].to_vec();
        let upgrade = header_map.contains("Upgrade");
        self.buf.drain(..total);

        Ok(ParseStatus::Complete(Request {
            method,
            url,
            headers: header_map,
            body,
            upgrade,
        }))
    }
}
