// src/services/stream.rs

//! Incremental parsing of very large array responses.
//!
//! Semester timetable responses carry a `data` array far too large to
//! buffer, wrapped in the usual envelope:
//!
//! ```text
//! { "msg": "...", "data": [ ...thousands of lessons... ], "code": "00000" }
//! ```
//!
//! [`JsonArrayParser`] splits the `data` array into raw elements as
//! bytes arrive, keeping only the current element and the surrounding
//! envelope in memory. The envelope's terminal `code` field is checked
//! once the array has fully drained; a non-success code after a fully
//! parsed stream is still an application error.

use futures::StreamExt;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::{OwnedSemaphorePermit, mpsc};

use crate::error::{AppError, Result};
use crate::models::TimetableLesson;
use crate::services::api::{OKAY, map_error_code};

/// Items buffered between the parser task and the consumer.
const STREAM_BUFFER: usize = 64;

/// A lazy, finite, non-restartable sequence of parsed items.
///
/// Dropping the stream terminates the producer early; items still in
/// flight are discarded.
pub struct ItemStream<T> {
    rx: mpsc::Receiver<Result<T>>,
}

impl<T> ItemStream<T> {
    /// Next item, or `None` once the stream is exhausted.
    pub async fn next(&mut self) -> Option<Result<T>> {
        self.rx.recv().await
    }
}

/// Stream of timetable lessons for a whole semester.
pub type LessonStream = ItemStream<TimetableLesson>;

/// Envelope fields reassembled from the bytes around the data array.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StreamEnvelope {
    #[serde(default)]
    code: String,

    #[serde(default)]
    msg: String,
}

/// Drive a response body through the parser on a background task,
/// holding the admission permit until the stream completes.
pub(crate) fn spawn_array_stream<T>(
    response: reqwest::Response,
    endpoint: &str,
    permit: OwnedSemaphorePermit,
) -> ItemStream<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    let endpoint = endpoint.to_string();

    tokio::spawn(async move {
        let _permit = permit;
        drive(response, &endpoint, tx).await;
    });

    ItemStream { rx }
}

async fn drive<T>(response: reqwest::Response, endpoint: &str, tx: mpsc::Sender<Result<T>>)
where
    T: DeserializeOwned + Send + 'static,
{
    let mut parser = JsonArrayParser::new();
    let mut body = response.bytes_stream();
    let mut elements: Vec<Vec<u8>> = Vec::new();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                let _ = tx
                    .send(Err(AppError::transport(endpoint, None, e.to_string())))
                    .await;
                return;
            }
        };

        if let Err(message) = parser.feed(&chunk, &mut elements) {
            let _ = tx
                .send(Err(AppError::transport(endpoint, None, message)))
                .await;
            return;
        }

        for raw in elements.drain(..) {
            let item = match serde_json::from_slice::<T>(&raw) {
                Ok(item) => item,
                Err(e) => {
                    let _ = tx.send(Err(AppError::Json(e))).await;
                    return;
                }
            };

            // A closed receiver means the caller terminated early
            if tx.send(Ok(item)).await.is_err() {
                return;
            }
        }
    }

    match parser.finish() {
        Ok(envelope) => {
            if envelope.code != OKAY {
                let _ = tx
                    .send(Err(map_error_code(&envelope.code, envelope.msg)))
                    .await;
            }
        }
        Err(message) => {
            let _ = tx
                .send(Err(AppError::transport(endpoint, None, message)))
                .await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Scanning the wrapper object for the top-level `data` array
    Preamble,
    /// Inside the `data` array, splitting elements
    InArray,
    /// Past the array, collecting the rest of the wrapper
    Tail,
}

/// Chunk-boundary-safe splitter for one `data` array inside a JSON
/// object. Feed arbitrary byte chunks; complete elements come out, and
/// the reassembled wrapper object (minus the array) is available at the
/// end.
pub(crate) struct JsonArrayParser {
    state: State,
    /// Wrapper bytes before and after the array
    envelope: Vec<u8>,
    /// Bytes of the element currently being assembled
    element: Vec<u8>,
    /// Nesting depth inside the current element
    depth: u32,
    /// Nesting depth within the wrapper while scanning the preamble
    doc_depth: u32,
    in_string: bool,
    escaped: bool,
    /// Content of the string currently being read in the preamble
    key_buf: Vec<u8>,
    /// The current preamble string contained an escape sequence
    key_escaped: bool,
    /// Envelope offset of a just-closed `"data"` string at depth 1
    candidate: Option<usize>,
    /// A `:` followed the candidate key; an array may open next
    awaiting_value: bool,
    /// Drop the element separator comma right after the array closes
    swallow_comma: bool,
}

impl JsonArrayParser {
    pub(crate) fn new() -> Self {
        Self {
            state: State::Preamble,
            envelope: Vec::new(),
            element: Vec::new(),
            depth: 0,
            doc_depth: 0,
            in_string: false,
            escaped: false,
            key_buf: Vec::new(),
            key_escaped: false,
            candidate: None,
            awaiting_value: false,
            swallow_comma: false,
        }
    }

    /// Consume a chunk, appending any completed array elements to `out`.
    pub(crate) fn feed(
        &mut self,
        chunk: &[u8],
        out: &mut Vec<Vec<u8>>,
    ) -> std::result::Result<(), String> {
        for &byte in chunk {
            match self.state {
                State::Preamble => self.preamble_byte(byte),
                State::InArray => self.array_byte(byte, out)?,
                State::Tail => self.tail_byte(byte),
            }
        }
        Ok(())
    }

    /// Validate that the stream is complete and decode the reassembled
    /// wrapper object.
    pub(crate) fn finish(self) -> std::result::Result<StreamEnvelope, String> {
        if self.state == State::InArray {
            return Err("response ended inside the data array".to_string());
        }
        serde_json::from_slice(&self.envelope).map_err(|e| format!("malformed envelope: {e}"))
    }

    fn preamble_byte(&mut self, byte: u8) {
        if self.in_string {
            self.envelope.push(byte);
            if self.escaped {
                self.escaped = false;
                self.key_escaped = true;
                self.key_buf.push(byte);
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
                if self.doc_depth == 1 && !self.key_escaped && self.key_buf == b"data" {
                    // String content was "data"; it is only the key we
                    // want if a colon and a bracket follow
                    self.candidate = Some(self.envelope.len() - 6);
                }
            } else {
                self.key_buf.push(byte);
            }
            return;
        }

        if byte.is_ascii_whitespace() {
            self.envelope.push(byte);
            return;
        }

        match byte {
            b'"' => {
                self.reset_candidate();
                self.in_string = true;
                self.key_buf.clear();
                self.key_escaped = false;
                self.envelope.push(byte);
            }
            b':' if self.candidate.is_some() && !self.awaiting_value => {
                self.awaiting_value = true;
                self.envelope.push(byte);
            }
            b'[' if self.awaiting_value => {
                // Found the data array: everything from the key string
                // onwards is replaced by the array's elements
                if let Some(start) = self.candidate.take() {
                    self.envelope.truncate(start);
                }
                self.awaiting_value = false;
                self.state = State::InArray;
                self.depth = 0;
                self.element.clear();
            }
            b'{' | b'[' => {
                self.reset_candidate();
                self.doc_depth += 1;
                self.envelope.push(byte);
            }
            b'}' | b']' => {
                self.reset_candidate();
                self.doc_depth = self.doc_depth.saturating_sub(1);
                self.envelope.push(byte);
            }
            _ => {
                self.reset_candidate();
                self.envelope.push(byte);
            }
        }
    }

    fn reset_candidate(&mut self) {
        self.candidate = None;
        self.awaiting_value = false;
    }

    fn array_byte(
        &mut self,
        byte: u8,
        out: &mut Vec<Vec<u8>>,
    ) -> std::result::Result<(), String> {
        if self.in_string {
            self.element.push(byte);
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
            }
            return Ok(());
        }

        match byte {
            b'"' => {
                self.in_string = true;
                self.element.push(byte);
            }
            b'{' | b'[' => {
                self.depth += 1;
                self.element.push(byte);
            }
            b'}' => {
                if self.depth == 0 {
                    return Err("unbalanced braces in data array".to_string());
                }
                self.depth -= 1;
                self.element.push(byte);
            }
            b']' => {
                if self.depth == 0 {
                    self.complete_element(out);
                    self.state = State::Tail;
                    self.swallow_comma = true;
                } else {
                    self.depth -= 1;
                    self.element.push(byte);
                }
            }
            b',' if self.depth == 0 => self.complete_element(out),
            _ => self.element.push(byte),
        }
        Ok(())
    }

    fn complete_element(&mut self, out: &mut Vec<Vec<u8>>) {
        if self.element.iter().any(|b| !b.is_ascii_whitespace()) {
            out.push(std::mem::take(&mut self.element));
        } else {
            self.element.clear();
        }
    }

    fn tail_byte(&mut self, byte: u8) {
        if self.swallow_comma {
            if byte.is_ascii_whitespace() {
                self.envelope.push(byte);
                return;
            }
            self.swallow_comma = false;
            if byte == b',' {
                // Separator between the array and the next key; the
                // array itself was cut out, so the comma goes too
                return;
            }
            // No key follows the array: drop the comma dangling at the
            // end of the preamble instead
            while self
                .envelope
                .last()
                .is_some_and(|b| b.is_ascii_whitespace())
            {
                self.envelope.pop();
            }
            if self.envelope.last() == Some(&b',') {
                self.envelope.pop();
            }
        }
        self.envelope.push(byte);
    }
}
