// ABOUTME: Line-buffering SSE field-grammar parser shared by all transports
// ABOUTME: Buffers across feed() calls so events are reassembled identically regardless of chunking
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use thiserror::Error;

/// Hard ceiling on bytes held between complete lines; exceeding it means
/// the remote end is either misbehaving or the line truly has no terminator.
pub const MAX_PARTIAL_BYTES: usize = 64 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown SSE field")]
    UnknownField,
    #[error("partial line exceeded {MAX_PARTIAL_BYTES} bytes with no terminator")]
    BufferOverflow,
}

/// One fully assembled SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    pub name: String,
    pub data: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Default)]
struct InProgress {
    name: Option<String>,
    data: Option<String>,
    id: Option<String>,
}

impl InProgress {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.data.is_none() && self.id.is_none()
    }
}

/// Reassembles SSE bytes into events across arbitrary chunk boundaries.
///
/// Unlike a parser that treats each transport read as one self-contained
/// run, this keeps a persistent line buffer across `feed()` calls and
/// emits every blank-line-delimited event it completes, however many
/// land in a single chunk. That is required for idempotence under
/// chunk-boundary shifts: the event boundary is defined by the wire
/// grammar (a blank line), not by where the transport happened to split
/// the bytes.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    current: InProgress,
    pub last_event_id: Option<String>,
    pub retry_timeout_ms: Option<i64>,
}

impl SseParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every event completed by this call.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::UnknownField` if a line uses a field name
    /// outside the known SSE vocabulary, and `ParseError::BufferOverflow`
    /// if an unterminated line grows past `MAX_PARTIAL_BYTES`.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<ParsedEvent>, ParseError> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));

        let mut events = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos]
                .trim_end_matches('\r')
                .to_owned();
            self.buffer.drain(..=newline_pos);

            if let Some(event) = self.process_line(&line)? {
                events.push(event);
            }
        }

        if self.buffer.len() > MAX_PARTIAL_BYTES {
            return Err(ParseError::BufferOverflow);
        }

        Ok(events)
    }

    /// Emit whatever event is in progress, without a trailing blank line.
    /// Call once the stream is known to have ended.
    pub fn flush(&mut self) -> Option<ParsedEvent> {
        self.take_current_if_named()
    }

    fn process_line(&mut self, line: &str) -> Result<Option<ParsedEvent>, ParseError> {
        if line.is_empty() {
            return Ok(self.take_current_if_named());
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f.trim(), v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };

        match field {
            "event" => self.current.name = Some(value.to_owned()),
            "data" => {
                self.current.data = Some(match self.current.data.take() {
                    Some(existing) => format!("{existing}\n{value}"),
                    None => value.to_owned(),
                });
            }
            "id" => {
                self.current.id = Some(value.to_owned());
                self.last_event_id = Some(value.to_owned());
            }
            "retry" => {
                if let Ok(ms) = value.parse::<i64>() {
                    self.retry_timeout_ms = Some(ms);
                } else {
                    tracing::debug!(value = value, "ignoring non-numeric retry directive");
                }
            }
            "" => tracing::trace!(comment = value, "sse comment"),
            other => {
                tracing::warn!(field = other, "unknown SSE field");
                return Err(ParseError::UnknownField);
            }
        }

        Ok(None)
    }

    fn take_current_if_named(&mut self) -> Option<ParsedEvent> {
        if self.current.is_empty() {
            return None;
        }
        let finished = std::mem::take(&mut self.current);
        finished.name.map(|name| ParsedEvent {
            name,
            data: finished.data,
            id: finished.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_event_in_one_chunk() {
        let mut parser = SseParser::new();
        let events = parser
            .feed(b"id: 1\nevent: ping\ndata: hello\n\n")
            .expect("feed");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "ping");
        assert_eq!(events[0].data.as_deref(), Some("hello"));
        assert_eq!(events[0].id.as_deref(), Some("1"));
    }

    #[test]
    fn splits_multiline_data_across_repeated_fields() {
        let mut parser = SseParser::new();
        let events = parser
            .feed(b"event: ping\ndata: a\ndata: b\n\n")
            .expect("feed");
        assert_eq!(events[0].data.as_deref(), Some("a\nb"));
    }

    #[test]
    fn is_idempotent_under_arbitrary_chunk_splits() {
        let wire = b"id: 1\nevent: ping\ndata: line-one\ndata: line-two\n\nevent: ping\ndata: second\n\n";

        let mut whole = SseParser::new();
        let all_at_once = whole.feed(wire).expect("feed");

        for split in 1..wire.len() {
            let mut parser = SseParser::new();
            let mut events = parser.feed(&wire[..split]).expect("feed first half");
            events.extend(parser.feed(&wire[split..]).expect("feed second half"));
            assert_eq!(events, all_at_once, "split at byte {split} diverged");
        }
    }

    #[test]
    fn retry_directive_updates_timeout_without_emitting_an_event() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"retry: 5000\n\n").expect("feed");
        assert!(events.is_empty());
        assert_eq!(parser.retry_timeout_ms, Some(5000));
    }

    #[test]
    fn non_numeric_retry_is_ignored_not_fatal() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"retry: not-a-number\n\n").expect("feed");
        assert!(events.is_empty());
        assert_eq!(parser.retry_timeout_ms, None);
    }

    #[test]
    fn unknown_field_is_a_hard_error() {
        let mut parser = SseParser::new();
        let err = parser.feed(b"bogus: value\n").expect_err("should fail");
        assert_eq!(err, ParseError::UnknownField);
    }

    #[test]
    fn comment_lines_are_ignored() {
        let mut parser = SseParser::new();
        let events = parser.feed(b": keepalive 123\nevent: ping\ndata: x\n\n").expect("feed");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn overflow_without_terminator_is_an_error() {
        let mut parser = SseParser::new();
        let chunk = vec![b'a'; MAX_PARTIAL_BYTES + 1];
        assert_eq!(parser.feed(&chunk), Err(ParseError::BufferOverflow));
    }

    #[test]
    fn nameless_event_resets_without_emitting() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: orphaned\n\n").expect("feed");
        assert!(events.is_empty());
    }
}
