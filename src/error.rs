//! Library error taxonomy.
//!
//! Three kinds of failure exist in this crate:
//!
//! - [`Error::InvalidState`] — a response or chunk was driven out of order.
//!   These are programmer errors and are surfaced immediately, never retried.
//! - [`Error::MissingCollaborator`] — an operation needed a data sink that
//!   was never registered on the response. This signals a misconfigured
//!   response, not a network condition.
//! - [`Error::ParseFailure`] — the request parser was fed bytes it could not
//!   understand, distinct from "need more data".
//!
//! Transport-level I/O errors (resets, EOF) are deliberately absent: the
//! transport logs them and turns them into disconnects instead of funneling
//! them through this enum.

use thiserror::Error;

/// Errors produced by the response state machine, the router, and the
/// request parser.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A response or chunk was used out of order (e.g. setting a header
    /// after the head was sent, or reusing a chunked response).
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// An operation required a data sink that was never registered.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// The request parser received malformed input.
    #[error("malformed request: {0}")]
    ParseFailure(&'static str),
}
