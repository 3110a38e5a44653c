//! Embedding requests, one backend call per input

use ollagate_core::RequestContext;

use crate::error::LlmError;
use crate::protocol::ollama::EmbedRequest;
use crate::protocol::openai::{Embedding, EmbeddingList, EmbeddingRequest, EmbeddingUsage};
use crate::state::{LlmState, with_deadline};
use crate::tokens::estimate_tokens;

impl LlmState {
    /// Embed every input in order
    ///
    /// Any failing input fails the whole request and nothing is recorded.
    /// An empty input list yields an empty result that still counts as a
    /// request.
    pub async fn embed(&self, request: EmbeddingRequest, context: &RequestContext) -> Result<EmbeddingList, LlmError> {
        let model = if request.model.is_empty() {
            self.inner.default_embedding_model.clone()
        } else {
            request.model
        };

        let inputs = request.input.into_vec();
        let deadline = self.deadline();

        let mut data = Vec::with_capacity(inputs.len());
        let mut tokens = 0;

        for input in inputs {
            tokens += estimate_tokens(&input);

            let response = with_deadline(
                deadline,
                self.inner.backend.embed(&EmbedRequest {
                    model: model.clone(),
                    input,
                }),
            )
            .await?;

            data.extend(response.embeddings.into_iter().map(|embedding| Embedding {
                object: "embedding".to_owned(),
                embedding,
                index: 0,
            }));
        }

        for (index, embedding) in data.iter_mut().enumerate() {
            embedding.index = index;
        }

        self.record_embedding(&context.alias, &model, tokens);

        Ok(EmbeddingList {
            object: "list".to_owned(),
            data,
            model,
            usage: EmbeddingUsage {
                prompt_tokens: tokens,
                total_tokens: tokens,
            },
        })
    }
}
