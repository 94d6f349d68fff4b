//! The status-substitution interceptor.
//!
//! The only reliable signal that a handler intends to return an empty error
//! body is that `end()` was reached with zero bytes written — that cannot be
//! known at header-write time. So the router installs this sink in front of
//! the response's real sink: the first data event decides whether the
//! response could still need substitution (non-chunked, code has a status
//! handler) and buffers if so; the end event then either fires the status
//! handler or flushes the buffer.
//!
//! This is an explicit per-response state machine; the buffer lives inside
//! the interceptor and dies with it, so nothing is shared across requests.

use std::collections::HashMap;
use std::mem;

use super::Handler;
use crate::request::Request;
use crate::response::{Response, ResponseSink};

enum State {
    /// Nothing emitted yet; the next data event decides.
    Armed,
    /// Substitution still possible; data is accumulated instead of forwarded.
    Buffering(Vec<u8>),
    /// Decision made; only reached transiently (the interceptor hands the
    /// original sink back to the response as soon as it disarms).
    Disarmed,
}

pub(crate) struct StatusInterceptor {
    inner: Option<Box<dyn ResponseSink + Send>>,
    request: Request,
    status_handlers: HashMap<u16, Handler>,
    state: State,
}

impl StatusInterceptor {
    pub fn new(
        inner: Box<dyn ResponseSink + Send>,
        request: Request,
        status_handlers: HashMap<u16, Handler>,
    ) -> Self {
        StatusInterceptor {
            inner: Some(inner),
            request,
            status_handlers,
            state: State::Armed,
        }
    }
}

impl ResponseSink for StatusInterceptor {
    fn on_data(&mut self, res: &mut Response, data: &[u8]) {
        match &mut self.state {
            State::Armed => {
                if !res.is_chunked() && self.status_handlers.contains_key(&res.code()) {
                    self.state = State::Buffering(data.to_vec());
                } else {
                    // No substitution possible for this response; reinstall
                    // the original sink permanently. The response's emit
                    // helper sees the slot occupied and drops us.
                    self.state = State::Disarmed;
                    if let Some(mut inner) = self.inner.take() {
                        inner.on_data(res, data);
                        res.set_sink(inner);
                    }
                }
            }
            State::Buffering(buffer) => buffer.extend_from_slice(data),
            State::Disarmed => {}
        }
    }

    fn on_end(&mut self, res: &mut Response) {
        match mem::replace(&mut self.state, State::Disarmed) {
            State::Buffering(buffer) => {
                let Some(mut inner) = self.inner.take() else {
                    return;
                };

                // Only fire a status handler for empty, non-chunked responses.
                if !res.is_chunked() && res.body().is_empty() {
                    if let Some(handler) = self.status_handlers.get(&res.code()).cloned() {
                        // The handler runs against the original sink, so its
                        // own end() cannot re-enter this interceptor.
                        res.set_sink(inner);
                        if let Err(err) = handler(&self.request, res) {
                            tracing::error!(code = res.code(), error = %err, "status handler failed");
                        }
                        return;
                    }
                }

                // No substitution: the buffered bytes were the real response.
                inner.on_data(res, &buffer);
                inner.on_end(res);
                res.set_sink(inner);
            }
            State::Armed | State::Disarmed => {
                if let Some(mut inner) = self.inner.take() {
                    inner.on_end(res);
                    res.set_sink(inner);
                }
            }
        }
    }
}
