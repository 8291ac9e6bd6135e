//! Incremental decoder for `text/event-stream` bodies
//!
//! Bytes arrive in arbitrary chunks; [`SseDecoder::push`] buffers partial
//! lines and returns every event completed by the chunk. Lines may end in
//! `\n`, `\r\n` or a lone `\r`. Only events with at least one `data` field are
//! dispatched; `id` and `retry` fields are ignored.

use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::collections::VecDeque;

/// One dispatched server-sent event
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the last `event:` field, if any
    pub event: Option<String>,
    /// `data:` fields joined with `\n`
    pub data: String,
}

impl SseEvent {
    /// True for events an `EventSource` delivers to `onmessage`
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("") | Some("message"))
    }
}

/// Stateful line and field parser
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    // a chunk ended on '\r'; a leading '\n' in the next chunk belongs to it
    pending_cr: bool,
    event: Option<String>,
    data: Option<String>,
}

impl SseDecoder {
    /// New decoder with empty buffers
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning the events it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();
        let mut bytes = chunk;

        if self.pending_cr {
            self.pending_cr = false;
            if let Some(b'\n') = bytes.first() {
                bytes = &bytes[1..];
            }
        }

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    self.finish_line(&mut events);
                }
                b'\r' => {
                    self.finish_line(&mut events);
                    match bytes.get(i + 1) {
                        Some(b'\n') => i += 1,
                        Some(_) => {}
                        None => self.pending_cr = true,
                    }
                }
                b => self.buf.push(b),
            }
            i += 1;
        }

        events
    }

    /// Flush at end of body. A trailing event without its blank line is
    /// discarded, as browsers do.
    pub fn finish(&mut self) {
        self.buf.clear();
        self.pending_cr = false;
        self.event = None;
        self.data = None;
    }

    fn finish_line(&mut self, events: &mut Vec<SseEvent>) {
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();

        if line.is_empty() {
            if let Some(event) = self.dispatch() {
                events.push(event);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_str(), ""),
        };

        match field {
            "data" => match self.data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            },
            "event" => self.event = Some(value.to_string()),
            // `id` and `retry` only matter for reconnection, which never happens here
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let data = self.data.take();
        let event = SseEvent {
            event: self.event.take(),
            data: data.clone().unwrap_or_default(),
        };
        data.map(|_| event)
    }
}

/// Turn a stream of body chunks into a stream of events.
///
/// A chunk error is forwarded once and ends the stream.
pub fn decode<S, B, E>(body: S) -> BoxStream<'static, Result<SseEvent, E>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Send + 'static,
{
    let state = (
        Box::pin(body),
        SseDecoder::new(),
        VecDeque::<SseEvent>::new(),
        false,
    );

    stream::unfold(state, |(mut body, mut decoder, mut queue, done)| async move {
        loop {
            if let Some(event) = queue.pop_front() {
                return Some((Ok(event), (body, decoder, queue, done)));
            }
            if done {
                return None;
            }
            match body.next().await {
                Some(Ok(chunk)) => queue.extend(decoder.push(chunk.as_ref())),
                Some(Err(e)) => return Some((Err(e), (body, decoder, queue, true))),
                None => {
                    decoder.finish();
                    return None;
                }
            }
        }
    })
    .boxed()
}
