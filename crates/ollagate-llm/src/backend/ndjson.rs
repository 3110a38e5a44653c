//! Newline-delimited JSON decoding over a chunked byte stream

use std::fmt::Display;
use std::pin::Pin;

use bytes::BytesMut;
use futures_util::{Stream, StreamExt, stream};
use serde::de::DeserializeOwned;

use crate::error::LlmError;

/// Longest unterminated line buffered before the stream is failed
pub(crate) const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

struct LineDecoder<S> {
    source: Pin<Box<S>>,
    buffer: BytesMut,
    /// Bytes of `buffer` already known to hold no newline
    scanned: usize,
    exhausted: bool,
    failed: bool,
}

impl<S> LineDecoder<S> {
    /// Next complete line, without its terminator
    fn take_line(&mut self) -> Option<BytesMut> {
        let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') else {
            self.scanned = self.buffer.len();
            return None;
        };

        let mut end = self.scanned + offset;
        self.scanned = 0;

        let mut line = self.buffer.split_to(end + 1);
        if end > 0 && line[end - 1] == b'\r' {
            end -= 1;
        }
        line.truncate(end);

        Some(line)
    }

    fn decode<T: DeserializeOwned>(&mut self, line: &[u8]) -> Result<T, LlmError> {
        let decoded = serde_json::from_slice(line)
            .map_err(|e| LlmError::Streaming(format!("failed to decode backend unit: {e}")));
        self.failed = decoded.is_err();
        decoded
    }

    fn fail(&mut self, message: String) -> LlmError {
        self.failed = true;
        LlmError::Streaming(message)
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Decode one JSON value per line
///
/// Blank lines are skipped and a trailing line without a terminator is
/// still decoded. The first decode or transport error, or a line longer
/// than [`MAX_LINE_BYTES`], is yielded once and ends the stream.
pub fn decode_ndjson<T, S, B, E>(source: S) -> impl Stream<Item = Result<T, LlmError>> + Send
where
    T: DeserializeOwned + Send,
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    let decoder = LineDecoder {
        source: Box::pin(source),
        buffer: BytesMut::new(),
        scanned: 0,
        exhausted: false,
        failed: false,
    };

    stream::unfold(decoder, |mut decoder| async move {
        loop {
            if decoder.failed {
                return None;
            }

            if let Some(line) = decoder.take_line() {
                if is_blank(&line) {
                    continue;
                }
                let item = decoder.decode(&line);
                return Some((item, decoder));
            }

            if decoder.exhausted {
                let rest = std::mem::take(&mut decoder.buffer);
                decoder.scanned = 0;
                if is_blank(&rest) {
                    return None;
                }
                let item = decoder.decode(&rest);
                return Some((item, decoder));
            }

            if decoder.buffer.len() > MAX_LINE_BYTES {
                let error = decoder.fail(format!("backend unit exceeds {MAX_LINE_BYTES} bytes"));
                return Some((Err(error), decoder));
            }

            match decoder.source.next().await {
                Some(Ok(chunk)) => decoder.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    let error = decoder.fail(format!("backend stream interrupted: {e}"));
                    return Some((Err(error), decoder));
                }
                None => decoder.exhausted = true,
            }
        }
    })
}
