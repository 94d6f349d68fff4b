//! The router proper: registration and request routing.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

use super::intercept::StatusInterceptor;
use super::trie::{path_of, split_segments, RouteNode};
use super::Handler;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// Routes requests to handlers by method and path, with status-code
/// fallback pages.
///
/// Registration (`on`, `on_error`) takes `&mut self`; routing takes `&self`,
/// so a router can be shared behind an [`Arc`] across connection coroutines
/// once it is set up.
pub struct Router {
    methods: HashMap<Method, RouteNode>,
    status_handlers: HashMap<u16, Handler>,
    /// Status code applied when no route matches. Defaults to 404.
    pub fallback_code: u16,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Router {
            methods: HashMap::new(),
            status_handlers: HashMap::new(),
            fallback_code: 404,
        }
    }

    /// Register a handler for an endpoint.
    ///
    /// Only one handler exists per endpoint (a unique method+path pair);
    /// registering again overwrites. Trailing slashes are insignificant:
    /// `/path` and `/path/` name the same endpoint.
    pub fn on<F>(&mut self, method: Method, path: &str, handler: F)
    where
        F: Fn(&Request, &mut Response) -> Result<(), Error> + Send + Sync + 'static,
    {
        let root = self.methods.entry(method).or_default();
        let node = root.insert(&split_segments(path));
        node.handler = Some(Arc::new(handler));
    }

    /// Remove an endpoint's handler. The trie node remains, but with an
    /// empty handler slot the endpoint no longer matches.
    pub fn unregister(&mut self, method: &Method, path: &str) {
        if let Some(root) = self.methods.get_mut(method) {
            if let Some(node) = root.find_mut(&split_segments(path)) {
                node.handler = None;
            }
        }
    }

    /// Register a status handler, used to provide content when a route is
    /// not found or a route handler ends an empty, non-chunked response with
    /// this code.
    ///
    /// The response handed to a status handler is the same one the route
    /// handler received, so calling `begin(0)` inside it keeps the status
    /// code and any custom reason phrase intact.
    pub fn on_error<F>(&mut self, code: u16, handler: F)
    where
        F: Fn(&Request, &mut Response) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.status_handlers.insert(code, Arc::new(handler));
    }

    /// Remove a status handler.
    pub fn unregister_error(&mut self, code: u16) {
        self.status_handlers.remove(&code);
    }

    /// Route a request to its handler.
    ///
    /// The response must already carry a data sink; the router cannot
    /// intercept emissions without one. A matching handler runs behind the
    /// status interceptor (see the `intercept` module). If nothing
    /// matches, the response is reset to
    /// [`fallback_code`](Self::fallback_code) and the status handler
    /// registered for that code, if any, runs against the original sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCollaborator`] if the response has no sink.
    /// Handler failures are logged, not returned; the response is left in
    /// whatever state the handler reached.
    pub fn route(&self, req: &Request, res: &mut Response) -> Result<(), Error> {
        let original = res.take_sink().ok_or(Error::MissingCollaborator(
            "routing requires a response with a data sink",
        ))?;

        let path = path_of(&req.url);
        let segments = split_segments(path);
        let handler = self
            .methods
            .get(&req.method)
            .and_then(|root| root.find(&segments))
            .and_then(|node| node.handler.clone());

        match handler {
            Some(handler) => {
                tracing::debug!(method = %req.method, path, "route matched");
                res.set_sink(Box::new(StatusInterceptor::new(
                    original,
                    req.clone(),
                    self.status_handlers.clone(),
                )));
                if let Err(err) = handler(req, res) {
                    tracing::error!(method = %req.method, path, error = %err, "handler failed");
                }
            }
            None => {
                tracing::debug!(
                    method = %req.method,
                    path,
                    code = self.fallback_code,
                    "no route matched"
                );
                // The fallback status handler runs against the original sink
                // directly; routing it through the interceptor would only
                // re-discover the same handler at end time.
                res.set_sink(original);
                res.begin(self.fallback_code)?;
                if let Some(handler) = self.status_handlers.get(&self.fallback_code) {
                    if let Err(err) = handler(req, res) {
                        tracing::error!(
                            code = self.fallback_code,
                            error = %err,
                            "status handler failed"
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
