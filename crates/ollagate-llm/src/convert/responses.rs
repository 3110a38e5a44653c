//! Responses API <-> chat completion mapping

use crate::protocol::openai::{
    ChatCompletion, ChatMessage, ChatRequest, OutputContent, OutputItem, ResponseObject, ResponsesInput,
    ResponsesRequest,
};

const DEFAULT_ROLE: &str = "user";

impl From<ResponsesRequest> for ChatRequest {
    fn from(request: ResponsesRequest) -> Self {
        let messages = match request.input {
            None => Vec::new(),
            Some(ResponsesInput::Text(text)) => vec![ChatMessage::text(DEFAULT_ROLE, text)],
            Some(ResponsesInput::Items(items)) => items
                .into_iter()
                .filter_map(|item| {
                    let content = item.content?;
                    Some(ChatMessage {
                        role: item.role.unwrap_or_else(|| DEFAULT_ROLE.to_owned()),
                        content: Some(content),
                    })
                })
                .collect(),
        };

        Self {
            model: request.model,
            messages,
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_output_tokens,
            stream: request.stream,
            response_format: None,
        }
    }
}

impl From<ChatCompletion> for ResponseObject {
    fn from(completion: ChatCompletion) -> Self {
        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        Self {
            id: format!("resp_{}", uuid::Uuid::new_v4()),
            object: "response".to_owned(),
            created: completion.created,
            model: completion.model,
            output: vec![OutputItem {
                item_type: "message".to_owned(),
                role: "assistant".to_owned(),
                content: vec![OutputContent {
                    content_type: "text".to_owned(),
                    text,
                }],
            }],
            usage: completion.usage,
        }
    }
}
