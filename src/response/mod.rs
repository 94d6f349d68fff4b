//! Response generation: the state machine, chunked transfer, and the
//! status-code reason table.

mod chunk;
mod response;
mod status;

pub use chunk::Chunk;
pub use response::{Response, ResponseSink};
pub use status::reason_phrase;

#[cfg(test)]
mod tests;
