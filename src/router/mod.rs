//! Path-based request routing.
//!
//! Routes are stored in a per-method trie of path segments and matched
//! exactly, segment by segment. Separately, status handlers registered with
//! [`Router::on_error`] provide default content for empty responses based on
//! their status code — the router intercepts a response's emission to decide,
//! at end time, whether a status page should be substituted.

mod intercept;
mod router;
mod trie;

use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// A route or status handler.
///
/// The router never branches on the returned value; errors are logged and
/// the response is left in whatever state the handler reached.
pub type Handler = Arc<dyn Fn(&Request, &mut Response) -> Result<(), Error> + Send + Sync>;

pub use router::Router;
