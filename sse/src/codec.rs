//! Serialization of events into the `text/event-stream` wire format.
//!
//! Every frame is a run of `field: value` lines, each ending in `\n`, closed by
//! an empty line. Nothing here validates field combinations; whatever the
//! caller put in a [`ServerSentEvent`] is written out as-is.

use crate::event::ServerSentEvent;
use bytes::{BufMut, Bytes, BytesMut};

const ID_FIELD: &[u8] = b"id: ";
const EVENT_FIELD: &[u8] = b"event: ";
const DATA_FIELD: &[u8] = b"data: ";
const RETRY_FIELD: &[u8] = b"retry: ";
const COMMENT_PREFIX: &[u8] = b": ";
const LINE_END: u8 = b'\n';

/// Encodes a full event frame: `id`, `event`, one `data` line per payload
/// line, then `retry`, followed by the terminating blank line.
pub fn encode_event(event: &ServerSentEvent) -> Bytes {
    let mut buf = BytesMut::with_capacity(encoded_len(event));

    if let Some(id) = event.id() {
        put_field(&mut buf, ID_FIELD, id.as_bytes());
    }
    if let Some(event_type) = event.event_type() {
        put_field(&mut buf, EVENT_FIELD, event_type.as_bytes());
    }
    for line in event.data() {
        put_field(&mut buf, DATA_FIELD, line.as_bytes());
    }
    if let Some(retry) = event.retry() {
        put_field(&mut buf, RETRY_FIELD, retry.to_string().as_bytes());
    }

    buf.put_u8(LINE_END);
    buf.freeze()
}

/// Encodes `data` as the only, unsplit data line of a frame.
pub fn encode_data(data: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(DATA_FIELD.len() + data.len() + 2);
    put_field(&mut buf, DATA_FIELD, data);
    buf.put_u8(LINE_END);
    buf.freeze()
}

/// Encodes a frame holding nothing but a `retry` field.
pub fn encode_retry(millis: u32) -> Bytes {
    let value = millis.to_string();
    let mut buf = BytesMut::with_capacity(RETRY_FIELD.len() + value.len() + 2);
    put_field(&mut buf, RETRY_FIELD, value.as_bytes());
    buf.put_u8(LINE_END);
    buf.freeze()
}

/// Encodes a comment frame. Clients ignore it, proxies see traffic.
pub fn encode_comment(text: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(COMMENT_PREFIX.len() + text.len() + 2);
    put_field(&mut buf, COMMENT_PREFIX, text.as_bytes());
    buf.put_u8(LINE_END);
    buf.freeze()
}

/// The keep-alive frame, `": \n\n"`.
pub fn keep_alive() -> Bytes {
    encode_comment("")
}

fn put_field(buf: &mut BytesMut, field: &[u8], value: &[u8]) {
    buf.put_slice(field);
    buf.put_slice(value);
    buf.put_u8(LINE_END);
}

fn encoded_len(event: &ServerSentEvent) -> usize {
    let id = event.id().map_or(0, |id| ID_FIELD.len() + id.len() + 1);
    let event_type = event
        .event_type()
        .map_or(0, |t| EVENT_FIELD.len() + t.len() + 1);
    let data: usize = event
        .data()
        .iter()
        .map(|line| DATA_FIELD.len() + line.len() + 1)
        .sum();
    // u32 has at most 10 decimal digits
    let retry = event.retry().map_or(0, |_| RETRY_FIELD.len() + 10 + 1);

    id + event_type + data + retry + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_event_emits_fields_in_protocol_order() {
        let event = ServerSentEvent::new()
            .with_retry(2500)
            .with_data_line("a")
            .with_event_type("ping")
            .with_data_line("b")
            .with_id("7");

        assert_eq!(
            &encode_event(&event)[..],
            b"id: 7\nevent: ping\ndata: a\ndata: b\nretry: 2500\n\n"
        );
    }

    #[test]
    fn test_encode_event_id_type_and_two_data_lines() {
        let event = ServerSentEvent::new()
            .with_id("7")
            .with_event_type("ping")
            .with_data_line("a")
            .with_data_line("b");

        assert_eq!(
            &encode_event(&event)[..],
            b"id: 7\nevent: ping\ndata: a\ndata: b\n\n"
        );
    }

    #[test]
    fn test_encode_event_single_empty_line_still_emits_data_field() {
        let event = ServerSentEvent::new().with_data_line("");

        assert_eq!(&encode_event(&event)[..], b"data: \n\n");
    }

    #[test]
    fn test_encode_event_retry_only_frame_is_legal() {
        let event = ServerSentEvent::new().with_retry(5000);

        assert_eq!(&encode_event(&event)[..], b"retry: 5000\n\n");
        assert_eq!(encode_event(&event), encode_retry(5000));
    }

    #[test]
    fn test_encode_event_with_no_fields_is_just_the_terminator() {
        assert_eq!(&encode_event(&ServerSentEvent::new())[..], b"\n");
    }

    #[test]
    fn test_encode_data_does_not_split_multiline_text() {
        assert_eq!(&encode_data(b"one\ntwo")[..], b"data: one\ntwo\n\n");
    }

    #[test]
    fn test_keep_alive_is_a_bare_comment_line() {
        assert_eq!(&keep_alive()[..], b": \n\n");
        assert_eq!(&encode_comment("still here")[..], b": still here\n\n");
    }

    #[test]
    fn test_encoded_len_is_an_upper_bound() {
        let event = ServerSentEvent::new()
            .with_id("abc")
            .with_event_type("update")
            .with_data_lines("x\ny\nz")
            .with_retry(u32::MAX);

        assert!(encode_event(&event).len() <= encoded_len(&event));
    }
}
