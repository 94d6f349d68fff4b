//! One chunk of a chunked transfer.

use super::response::Response;
use crate::error::Error;

/// Encode a chunked-encoding frame:
/// `<size, lowercase hex without 0x>\r\n<data>\r\n`.
///
/// The zero-length terminator (`0\r\n\r\n`) is this same format applied to
/// an empty body.
pub(crate) fn encode_chunk(body: &[u8]) -> Vec<u8> {
    let size = format!("{:x}\r\n", body.len());
    let mut out = Vec::with_capacity(size.len() + body.len() + 2);
    out.extend_from_slice(size.as_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(b"\r\n");
    out
}

/// A single chunk of a chunked response, created with
/// [`Response::begin_chunk`].
///
/// The chunk holds an exclusive borrow of its parent response, so the
/// response outlives the chunk and cannot be driven concurrently. `write`
/// and `end_chunk` consume the chunk, which makes writing to an ended chunk
/// and double-ending impossible to express. Dropping a chunk without ending
/// it discards it; nothing reaches the wire.
#[derive(Debug)]
pub struct Chunk<'a> {
    res: &'a mut Response,
    body: Vec<u8>,
}

impl<'a> Chunk<'a> {
    pub(crate) fn new(res: &'a mut Response) -> Self {
        Chunk {
            res,
            body: Vec::new(),
        }
    }

    /// Append data to the chunk's body.
    pub fn write<D: AsRef<[u8]>>(mut self, data: D) -> Result<Self, Error> {
        self.body.extend_from_slice(data.as_ref());
        Ok(self)
    }

    /// Finalize the chunk and put it on the wire.
    ///
    /// Ending an empty chunk is a silent no-op: the empty chunk is reserved
    /// as the transfer terminator and must never be emitted by user code.
    /// Otherwise this upgrades the parent to chunked transfer if needed
    /// (emitting the header section first) and emits the encoded frame.
    ///
    /// Returns the parent response so calls can chain back onto it:
    /// `res.begin_chunk()?.write("...")?.end_chunk()?.end()?`.
    pub fn end_chunk(self) -> Result<&'a mut Response, Error> {
        let Chunk { res, body } = self;

        if body.is_empty() {
            return Ok(res);
        }
        if !res.has_sink() {
            return Err(Error::MissingCollaborator(
                "chunk end_chunk() requires a data sink",
            ));
        }

        res.make_chunked()?;
        res.emit_data(&encode_chunk(&body))?;

        Ok(res)
    }

    /// Wire format of this chunk as it stands.
    pub fn to_http(&self) -> Vec<u8> {
        encode_chunk(&self.body)
    }
}
