//! The response state machine.
//!
//! A [`Response`] is a generator rather than a container: handlers drive it
//! with builder-style calls and it emits wire-formatted bytes through a
//! [`ResponseSink`]. It tracks whether the head and body have been sent and
//! whether the transfer is chunked, and rejects calls that would corrupt the
//! wire format.
//!
//! A simple response:
//!
//! ```
//! use rafale::response::{Response, ResponseSink};
//!
//! struct Discard;
//! impl ResponseSink for Discard {
//!     fn on_data(&mut self, _res: &mut Response, _data: &[u8]) {}
//!     fn on_end(&mut self, _res: &mut Response) {}
//! }
//!
//! # fn main() -> Result<(), rafale::Error> {
//! let mut res = Response::new();
//! res.set_sink(Box::new(Discard));
//! res.begin(200)?
//!     .header("Content-Type", "text/plain")?
//!     .write("Lorem ipsum dolor sit amet")?
//!     .end()?;
//! # Ok(())
//! # }
//! ```
//!
//! Callers never need to care up front whether a response is chunked:
//! `write()` buffers on a plain response and emits a chunk on a chunked one,
//! and ending a [`Chunk`](super::Chunk) upgrades the response to chunked
//! transfer automatically, flushing anything already buffered.

use std::sync::Arc;

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use super::chunk::{encode_chunk, Chunk};
use super::status::reason_phrase;
use crate::error::Error;
use crate::headers::HeaderMap;
use crate::request::Request;

/// RFC 1123 fixed-date layout used by the `Date` header.
const IMF_FIXDATE: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

fn http_date() -> String {
    OffsetDateTime::now_utc()
        .format(&IMF_FIXDATE)
        .unwrap_or_else(|_| String::from("Thu, 01 Jan 1970 00:00:00 GMT"))
}

/// The response's boundary to the transport.
///
/// The core never performs I/O; it hands formatted bytes to whatever sink is
/// registered. Both callbacks run synchronously in the calling stack frame.
///
/// The sink is taken out of the response for the duration of each callback,
/// so a callback may legally call back into the response — including
/// installing a different sink, which is how the router's status interceptor
/// unwraps itself. If the callback leaves the slot empty, the taken sink is
/// put back afterwards.
pub trait ResponseSink {
    /// Bytes are ready to be written to the transport, in order.
    fn on_data(&mut self, res: &mut Response, data: &[u8]);
    /// The response has ended; no further data will be produced.
    fn on_end(&mut self, res: &mut Response);
}

/// Builds and emits a single HTTP/1.1 response.
///
/// One `Response` exists per outgoing message. All methods must be called
/// from a single logical sequence; there is no internal locking.
pub struct Response {
    request: Option<Arc<Request>>,
    code: u16,
    reason: String,
    headers: HeaderMap,
    body: Vec<u8>,
    chunked: bool,
    head_sent: bool,
    body_sent: bool,
    ended: bool,
    sink: Option<Box<dyn ResponseSink + Send>>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// Create a response with no request context and no sink.
    pub fn new() -> Self {
        Response {
            request: None,
            code: 0,
            reason: String::new(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            chunked: false,
            head_sent: false,
            body_sent: false,
            ended: false,
            sink: None,
        }
    }

    /// Create a response bound to the request it answers.
    pub fn for_request(request: Arc<Request>) -> Self {
        Response {
            request: Some(request),
            ..Self::new()
        }
    }

    /// The request this response answers, if any.
    pub fn request(&self) -> Option<&Arc<Request>> {
        self.request.as_ref()
    }

    /// Install the data sink. Replaces any previous sink.
    pub fn set_sink(&mut self, sink: Box<dyn ResponseSink + Send>) {
        self.sink = Some(sink);
    }

    /// Take the current sink out of the response, leaving none installed.
    ///
    /// Used by the router to wrap a response's emission; embedders composing
    /// their own interceptors can do the same.
    pub fn take_sink(&mut self) -> Option<Box<dyn ResponseSink + Send>> {
        self.sink.take()
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Begin (or restart) the response with a status code.
    ///
    /// With `code != 0` this resets the response completely — headers, body
    /// and all send-state flags — then resolves the reason phrase from the
    /// standard table (unknown codes render as `"???"`).
    ///
    /// `begin(0)` is a soft reset: it clears only headers and body and
    /// re-arms the send-state flags while preserving the code and reason.
    /// Status handlers use this to reuse the original status without
    /// re-specifying it. Soft-resetting a chunked response is an error —
    /// part of a chunked transfer is already on the wire.
    pub fn begin(&mut self, code: u16) -> Result<&mut Self, Error> {
        self.begin_with_reason(code, "")
    }

    /// Like [`begin`](Self::begin), but with a custom reason phrase.
    /// An empty `custom_reason` falls back to the standard table.
    pub fn begin_with_reason(
        &mut self,
        code: u16,
        custom_reason: &str,
    ) -> Result<&mut Self, Error> {
        if code != 0 {
            self.code = code;
            self.reason = if custom_reason.is_empty() {
                reason_phrase(code).unwrap_or("???").to_string()
            } else {
                custom_reason.to_string()
            };
            self.chunked = false;
        } else if self.chunked {
            return Err(Error::InvalidState("cannot reuse a chunked response"));
        }

        self.head_sent = false;
        self.body_sent = false;
        self.ended = false;
        self.headers.clear();
        self.body.clear();

        Ok(self)
    }

    /// Set a header, overwriting any previous value.
    pub fn header(&mut self, name: &str, value: &str) -> Result<&mut Self, Error> {
        if self.head_sent {
            return Err(Error::InvalidState(
                "attempted to modify already sent headers",
            ));
        }
        self.headers.set(name, value);
        Ok(self)
    }

    /// Append data to the response body.
    ///
    /// On a plain response the data is buffered until [`end`](Self::end).
    /// On a chunked response every `write` becomes exactly one wire chunk.
    pub fn write<D: AsRef<[u8]>>(&mut self, data: D) -> Result<&mut Self, Error> {
        if self.body_sent {
            return Err(Error::InvalidState(
                "attempted to write to an already sent response",
            ));
        }

        if self.chunked {
            self.begin_chunk()?.write(data)?.end_chunk()?;
        } else {
            self.body.extend_from_slice(data.as_ref());
        }
        Ok(self)
    }

    /// Switch the response to chunked transfer encoding.
    ///
    /// Idempotent. Emits the header section immediately (with
    /// `Transfer-Encoding: chunked`), and flushes any data already buffered
    /// by earlier `write` calls as the first chunk, so nothing is lost when
    /// a caller decides to stream after it has started writing.
    pub fn make_chunked(&mut self) -> Result<&mut Self, Error> {
        if self.chunked {
            return Ok(self);
        }
        if self.sink.is_none() {
            return Err(Error::MissingCollaborator(
                "make_chunked() requires a data sink",
            ));
        }

        self.header("Transfer-Encoding", "chunked")?;
        self.chunked = true;
        self.head_sent = true;

        let head = self.to_http(true);
        self.emit_data(&head)?;

        if !self.body.is_empty() {
            let buffered = std::mem::take(&mut self.body);
            self.begin_chunk()?.write(buffered)?.end_chunk()?;
        }

        Ok(self)
    }

    /// Begin a chunk. End it with [`Chunk::end_chunk`] to put it on the wire.
    ///
    /// A chunk that is dropped without being ended is silently discarded.
    /// The chunk holds an exclusive borrow of the response, so the response
    /// cannot be driven elsewhere while a chunk is open.
    pub fn begin_chunk(&mut self) -> Result<Chunk<'_>, Error> {
        if self.ended {
            return Err(Error::InvalidState(
                "attempted to begin a chunk on an ended response",
            ));
        }
        if self.head_sent && !self.chunked {
            return Err(Error::InvalidState(
                "attempted to begin a chunk on a nonchunked response",
            ));
        }
        Ok(Chunk::new(self))
    }

    /// Finalize the response.
    ///
    /// A no-op if the response has already ended. On a plain response this
    /// sets the exact `Content-Length`, emits the full head+body in a single
    /// data event, and fires the end event. On a chunked response it emits
    /// the zero-length terminator chunk and fires the end event.
    pub fn end(&mut self) -> Result<(), Error> {
        if self.ended {
            return Ok(());
        }
        if self.sink.is_none() {
            return Err(Error::MissingCollaborator("end() requires a data sink"));
        }

        self.ended = true;

        if !self.chunked {
            let length = self.body.len().to_string();
            self.header("Content-Length", &length)?;
            self.head_sent = true;
            self.body_sent = true;

            let message = self.to_http(false);
            self.emit_data(&message)?;
        } else {
            // Chunked transfers are terminated by an empty chunk
            self.emit_data(&encode_chunk(&[]))?;
        }

        self.emit_end()
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The buffered body. Remains populated after a non-chunked `end()`,
    /// which is what lets the router detect empty responses.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Serialize the status line, a freshly generated `Date` header, all
    /// headers in map order, and (unless `headers_only`) the body.
    pub fn to_http(&self, headers_only: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(128 + self.body.len());

        out.extend_from_slice(format!("HTTP/1.1 {} {}\r\n", self.code, self.reason).as_bytes());
        out.extend_from_slice(format!("Date: {}\r\n", http_date()).as_bytes());
        for (name, value) in self.headers.iter() {
            out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        out.extend_from_slice(b"\r\n");

        if !headers_only {
            out.extend_from_slice(&self.body);
        }

        out
    }

    /// Run the sink's data callback with the sink taken out of the response,
    /// so the callback can safely re-enter response methods.
    pub(crate) fn emit_data(&mut self, data: &[u8]) -> Result<(), Error> {
        let mut sink = self
            .sink
            .take()
            .ok_or(Error::MissingCollaborator("no data sink registered"))?;
        sink.on_data(self, data);
        if self.sink.is_none() {
            self.sink = Some(sink);
        }
        Ok(())
    }

    pub(crate) fn emit_end(&mut self) -> Result<(), Error> {
        let mut sink = self
            .sink
            .take()
            .ok_or(Error::MissingCollaborator("no data sink registered"))?;
        sink.on_end(self);
        if self.sink.is_none() {
            self.sink = Some(sink);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("code", &self.code)
            .field("reason", &self.reason)
            .field("chunked", &self.chunked)
            .field("head_sent", &self.head_sent)
            .field("body_sent", &self.body_sent)
            .field("ended", &self.ended)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}
