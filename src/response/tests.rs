use super::{Response, ResponseSink};
use crate::error::Error;
use std::sync::{Arc, Mutex};

/// Records every emission so tests can assert exact event counts and
/// payloads. Counts survive the sink being moved into the response.
#[derive(Clone, Default)]
struct Recorder {
    data: Arc<Mutex<Vec<Vec<u8>>>>,
    ends: Arc<Mutex<usize>>,
}

impl Recorder {
    fn data_count(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    fn end_count(&self) -> usize {
        *self.ends.lock().unwrap()
    }

    fn emission(&self, idx: usize) -> Vec<u8> {
        self.data.lock().unwrap()[idx].clone()
    }

    fn all_bytes(&self) -> Vec<u8> {
        self.data.lock().unwrap().concat()
    }
}

struct RecordingSink(Recorder);

impl ResponseSink for RecordingSink {
    fn on_data(&mut self, _res: &mut Response, data: &[u8]) {
        self.0.data.lock().unwrap().push(data.to_vec());
    }

    fn on_end(&mut self, _res: &mut Response) {
        *self.0.ends.lock().unwrap() += 1;
    }
}

fn recording_response() -> (Response, Recorder) {
    let recorder = Recorder::default();
    let mut res = Response::new();
    res.set_sink(Box::new(RecordingSink(recorder.clone())));
    (res, recorder)
}

#[test]
fn plain_response_is_one_emission() {
    let (mut res, rec) = recording_response();

    res.begin(200)
        .unwrap()
        .header("Content-Type", "text/plain")
        .unwrap()
        .write("Lorem ipsum ")
        .unwrap()
        .write("dolor sit amet")
        .unwrap()
        .end()
        .unwrap();

    assert_eq!(rec.data_count(), 1);
    assert_eq!(rec.end_count(), 1);

    let message = String::from_utf8(rec.emission(0)).unwrap();
    assert!(message.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(message.contains("Content-Length: 26\r\n"));
    assert!(message.ends_with("\r\n\r\nLorem ipsum dolor sit amet"));
}

#[test]
fn make_chunked_writes_are_one_chunk_each() {
    let (mut res, rec) = recording_response();

    res.begin(200)
        .unwrap()
        .header("Content-Type", "text/plain")
        .unwrap()
        .make_chunked()
        .unwrap()
        .write("Lorem ipsum ")
        .unwrap()
        .write("dolor sit amet")
        .unwrap()
        .end()
        .unwrap();

    // header section + 2 chunks + terminator
    assert_eq!(rec.data_count(), 1 + 2 + 1);
    assert_eq!(rec.end_count(), 1);

    let head = String::from_utf8(rec.emission(0)).unwrap();
    assert!(head.contains("Transfer-Encoding: chunked\r\n"));
    assert!(head.ends_with("\r\n\r\n"));

    assert_eq!(rec.emission(1), b"c\r\nLorem ipsum \r\n".to_vec());
    assert_eq!(rec.emission(2), b"e\r\ndolor sit amet\r\n".to_vec());
    assert_eq!(rec.emission(3), b"0\r\n\r\n".to_vec());
}

#[test]
fn explicit_chunks_then_implicit_write() {
    let (mut res, rec) = recording_response();

    res.begin(200)
        .unwrap()
        .header("Content-Type", "text/plain")
        .unwrap();
    res.begin_chunk()
        .unwrap()
        .write("Lorem ")
        .unwrap()
        .write("ipsum ")
        .unwrap()
        .end_chunk()
        .unwrap();
    res.begin_chunk()
        .unwrap()
        .write("dolor ")
        .unwrap()
        .end_chunk()
        .unwrap()
        .write("sit amet")
        .unwrap()
        .end()
        .unwrap();

    // header + 2 explicit chunks + 1 implicit chunk + terminator
    assert_eq!(rec.data_count(), 1 + 3 + 1);
    assert_eq!(rec.end_count(), 1);
    assert_eq!(rec.emission(1), b"c\r\nLorem ipsum \r\n".to_vec());
}

#[test]
fn ending_an_empty_chunk_is_a_no_op() {
    let (mut res, rec) = recording_response();

    res.begin(200).unwrap();
    res.begin_chunk().unwrap().end_chunk().unwrap();

    // Nothing reached the wire, and the response was not made chunked.
    assert_eq!(rec.data_count(), 0);
    assert!(!res.is_chunked());

    res.end().unwrap();
    assert_eq!(rec.data_count(), 1);
    let bytes = rec.all_bytes();
    assert!(!bytes.windows(5).any(|w| w == b"0\r\n\r\n"));
}

#[test]
fn dropped_chunk_is_discarded() {
    let (mut res, rec) = recording_response();

    res.begin(200).unwrap();
    {
        let chunk = res.begin_chunk().unwrap().write("never sent").unwrap();
        drop(chunk);
    }
    res.end().unwrap();

    assert_eq!(rec.data_count(), 1);
    let message = String::from_utf8(rec.emission(0)).unwrap();
    assert!(message.contains("Content-Length: 0\r\n"));
    assert!(!message.contains("never sent"));
}

#[test]
fn make_chunked_flushes_buffered_body_first() {
    let (mut res, rec) = recording_response();

    res.begin(200)
        .unwrap()
        .write("early")
        .unwrap()
        .make_chunked()
        .unwrap();

    // header section, then the buffered data as the first chunk
    assert_eq!(rec.data_count(), 2);
    assert_eq!(rec.emission(1), b"5\r\nearly\r\n".to_vec());
    assert!(res.body().is_empty());

    res.end().unwrap();
    assert_eq!(rec.data_count(), 3);
}

#[test]
fn make_chunked_is_idempotent() {
    let (mut res, rec) = recording_response();

    res.begin(200).unwrap().make_chunked().unwrap();
    res.make_chunked().unwrap();

    assert_eq!(rec.data_count(), 1);
}

#[test]
fn header_after_head_sent_fails() {
    let (mut res, _rec) = recording_response();

    res.begin(200).unwrap().end().unwrap();
    assert!(matches!(
        res.header("X-Late", "1"),
        Err(Error::InvalidState(_))
    ));
}

#[test]
fn write_after_body_sent_fails() {
    let (mut res, _rec) = recording_response();

    res.begin(200).unwrap().write("done").unwrap().end().unwrap();
    assert!(matches!(res.write("more"), Err(Error::InvalidState(_))));
}

#[test]
fn begin_chunk_on_ended_response_fails() {
    let (mut res, _rec) = recording_response();

    res.begin(200).unwrap().end().unwrap();
    assert!(matches!(res.begin_chunk(), Err(Error::InvalidState(_))));
}

#[test]
fn end_without_sink_fails() {
    let mut res = Response::new();
    res.begin(200).unwrap();
    assert!(matches!(res.end(), Err(Error::MissingCollaborator(_))));
    assert!(matches!(
        res.make_chunked(),
        Err(Error::MissingCollaborator(_))
    ));
}

#[test]
fn end_is_idempotent() {
    let (mut res, rec) = recording_response();

    res.begin(200).unwrap().end().unwrap();
    res.end().unwrap();

    assert_eq!(rec.data_count(), 1);
    assert_eq!(rec.end_count(), 1);
}

#[test]
fn reason_resolution() {
    let mut res = Response::new();

    res.begin(418).unwrap();
    assert_eq!(res.reason(), "I'm a teapot");

    res.begin(299).unwrap();
    assert_eq!(res.reason(), "???");

    res.begin_with_reason(500, "Everything Is Fine").unwrap();
    assert_eq!(res.reason(), "Everything Is Fine");
}

#[test]
fn begin_resets_all_state() {
    let (mut res, _rec) = recording_response();

    res.begin(404)
        .unwrap()
        .header("X-A", "1")
        .unwrap()
        .write("gone")
        .unwrap()
        .end()
        .unwrap();

    res.begin(200).unwrap();
    assert_eq!(res.code(), 200);
    assert!(res.headers().is_empty());
    assert!(res.body().is_empty());
    assert!(!res.ended());
}

#[test]
fn soft_reset_preserves_code_and_reason() {
    let (mut res, rec) = recording_response();

    res.begin(403).unwrap().end().unwrap();

    // A status handler reuses the original code with begin(0).
    res.begin(0).unwrap();
    assert_eq!(res.code(), 403);
    assert_eq!(res.reason(), "Forbidden");
    assert!(!res.ended());

    res.write("Can't let you do that").unwrap().end().unwrap();
    assert_eq!(rec.data_count(), 2);
    assert_eq!(rec.end_count(), 2);
}

#[test]
fn soft_reset_of_chunked_response_fails() {
    let (mut res, _rec) = recording_response();

    res.begin(200).unwrap().make_chunked().unwrap();
    assert!(matches!(res.begin(0), Err(Error::InvalidState(_))));
}

#[test]
fn to_http_wire_format() {
    let (mut res, rec) = recording_response();

    res.begin(200)
        .unwrap()
        .header("Content-Type", "text/plain")
        .unwrap()
        .write("X")
        .unwrap()
        .end()
        .unwrap();

    let message = String::from_utf8(rec.emission(0)).unwrap();
    let (head, body) = message.split_once("\r\n\r\n").unwrap();
    let mut lines = head.lines();

    assert_eq!(lines.next(), Some("HTTP/1.1 200 OK"));
    assert!(lines.next().unwrap().starts_with("Date: "));
    // Header order is insertion order: Content-Length is set by end().
    assert_eq!(lines.next(), Some("Content-Type: text/plain"));
    assert_eq!(lines.next(), Some("Content-Length: 1"));
    assert_eq!(lines.next(), None);
    assert_eq!(body, "X");
}
