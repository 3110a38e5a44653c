//! Streaming chat completions

use std::pin::Pin;

use futures_util::{Stream, stream};
use ollagate_core::{Alias, RequestContext};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::backend::ChatStream;
use crate::convert::{completion_id, to_backend_chat_request, to_stream_chunk};
use crate::error::LlmError;
use crate::protocol::openai::{ChatCompletionChunk, ChatRequest};
use crate::state::{LlmState, with_deadline};
use crate::tokens::{estimate_message_tokens, estimate_tokens};

/// One server-sent event of a streaming completion
#[derive(Debug, Clone)]
pub enum StreamFrame {
    Chunk(ChatCompletionChunk),
    /// Terminal `[DONE]` marker, only sent when the backend finished cleanly
    Done,
}

pub type FrameStream = Pin<Box<dyn Stream<Item = StreamFrame> + Send>>;

impl LlmState {
    /// Open a streaming chat completion
    ///
    /// Errors before the first frame (validation, backend rejection,
    /// deadline) are returned directly. Once the stream is open, failures
    /// end the frame sequence without a `Done` frame. Usage is recorded
    /// exactly once when the sequence ends, is cancelled through `cancel`,
    /// or is dropped by the caller.
    pub async fn complete_stream(
        &self,
        request: ChatRequest,
        context: &RequestContext,
        cancel: CancellationToken,
    ) -> Result<FrameStream, LlmError> {
        let request = self.prepare_chat(request)?;

        let mut backend_request = to_backend_chat_request(&request);
        backend_request.stream = true;

        let prompt_tokens = estimate_message_tokens(&request.messages);
        let deadline = self.deadline();

        let units = with_deadline(
            deadline,
            self.inner.backend.open_chat_stream(&backend_request, cancel.child_token()),
        )
        .await?;

        tracing::debug!(model = %request.model, request_id = %context.request_id, "opened backend stream");

        let session = StreamSession {
            units,
            accounting: CompletionAccounting {
                state: self.clone(),
                alias: context.alias.clone(),
                model: request.model.clone(),
                prompt_tokens,
                text: String::new(),
                settled: false,
            },
            model: request.model,
            chunk_id: completion_id(),
            created: jiff::Timestamp::now().as_second(),
            deadline,
            finished: false,
        };

        Ok(Box::pin(stream::unfold(session, |mut session| async move {
            session.advance().await.map(|frame| (frame, session))
        })))
    }
}

struct StreamSession {
    units: ChatStream,
    accounting: CompletionAccounting,
    model: String,
    /// Shared by every chunk of this completion
    chunk_id: String,
    created: i64,
    deadline: Instant,
    finished: bool,
}

impl StreamSession {
    async fn advance(&mut self) -> Option<StreamFrame> {
        if self.finished {
            return None;
        }

        let Ok(next) = tokio::time::timeout_at(self.deadline, self.units.next_unit()).await else {
            tracing::warn!(model = %self.model, "streaming completion exceeded deadline");
            self.units.cancel();
            return self.finish(None);
        };

        match next {
            Some(Ok(unit)) => {
                self.accounting.push(&unit.message.content);
                Some(StreamFrame::Chunk(to_stream_chunk(
                    &unit,
                    &self.model,
                    &self.chunk_id,
                    self.created,
                )))
            }
            Some(Err(error)) => {
                tracing::error!(model = %self.model, error = %error, "backend stream failed");
                self.finish(None)
            }
            None if self.units.is_cancelled() => {
                tracing::debug!(model = %self.model, "streaming completion cancelled");
                self.finish(None)
            }
            None => self.finish(Some(StreamFrame::Done)),
        }
    }

    fn finish(&mut self, frame: Option<StreamFrame>) -> Option<StreamFrame> {
        self.finished = true;
        self.accounting.settle();
        frame
    }
}

/// Accumulates streamed text and records usage once
///
/// Settles on drop so a client disconnect still accounts for the text
/// delivered so far.
struct CompletionAccounting {
    state: LlmState,
    alias: Alias,
    model: String,
    prompt_tokens: u64,
    text: String,
    settled: bool,
}

impl CompletionAccounting {
    fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    fn settle(&mut self) {
        if self.settled {
            return;
        }
        self.settled = true;

        let completion_tokens = estimate_tokens(&self.text);
        self.state
            .record_completion(&self.alias, &self.model, self.prompt_tokens, completion_tokens);
    }
}

impl Drop for CompletionAccounting {
    fn drop(&mut self) {
        self.settle();
    }
}
