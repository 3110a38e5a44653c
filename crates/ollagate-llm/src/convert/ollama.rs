//! `OpenAI` <-> Ollama mapping for chat and model catalog payloads

use crate::protocol::ollama;
use crate::protocol::openai::{
    AssistantMessage, ChatCompletion, ChatCompletionChunk, ChatMessage, ChatRequest, Choice, ContentPart,
    MessageContent, Model, ModelList, StreamChoice, StreamDelta, Usage,
};

/// The backend does not distinguish a length cut-off from a natural stop
const FINISH_REASON_STOP: &str = "stop";

// -- Inbound: OpenAI request -> Ollama request --

/// Map a validated `OpenAI` chat request onto the backend format
///
/// Part lists are flattened: text parts are concatenated in order and
/// base64 payloads are pulled out of `data:image` URLs.
pub fn to_backend_chat_request(request: &ChatRequest) -> ollama::ChatRequest {
    let options = ollama::Options {
        temperature: request.temperature,
        top_p: request.top_p,
        num_predict: request.max_tokens,
    };

    let format = request
        .response_format
        .as_ref()
        .filter(|format| format.format_type == "json_object")
        .map(|_| "json".to_owned());

    ollama::ChatRequest {
        model: request.model.clone(),
        messages: request.messages.iter().map(to_backend_message).collect(),
        stream: request.is_stream(),
        format,
        options: (!options.is_empty()).then_some(options),
    }
}

fn to_backend_message(message: &ChatMessage) -> ollama::Message {
    let (content, images) = match &message.content {
        None => (String::new(), Vec::new()),
        Some(MessageContent::Text(text)) => (text.clone(), Vec::new()),
        Some(MessageContent::Parts(parts)) => flatten_parts(parts),
    };

    ollama::Message {
        role: message.role.clone(),
        content,
        images,
    }
}

fn flatten_parts(parts: &[ContentPart]) -> (String, Vec<String>) {
    let mut text = String::new();
    let mut images = Vec::new();

    for part in parts {
        match part {
            ContentPart::Text { text: fragment } => text.push_str(fragment),
            ContentPart::ImageUrl { image_url } => {
                if let Some(payload) = data_url_payload(&image_url.url) {
                    images.push(payload.to_owned());
                }
            }
            ContentPart::Unsupported => {}
        }
    }

    (text, images)
}

/// Base64 payload of a `data:image/...;base64,<payload>` URL
///
/// Remote URLs and data URLs without exactly one comma are dropped.
fn data_url_payload(url: &str) -> Option<&str> {
    if !url.starts_with("data:image") {
        return None;
    }

    let (_, payload) = url.split_once(',')?;

    (!payload.contains(',')).then_some(payload)
}

// -- Outbound: Ollama reply -> OpenAI response --

/// Wrap the backend's final message as a single-choice completion
pub fn to_chat_completion(
    unit: &ollama::ChatResponse,
    model: &str,
    prompt_tokens: u64,
    completion_tokens: u64,
) -> ChatCompletion {
    ChatCompletion {
        id: completion_id(),
        object: "chat.completion".to_owned(),
        created: jiff::Timestamp::now().as_second(),
        model: model.to_owned(),
        choices: vec![Choice {
            index: 0,
            message: AssistantMessage {
                role: "assistant".to_owned(),
                content: unit.message.content.clone(),
            },
            finish_reason: FINISH_REASON_STOP.to_owned(),
        }],
        usage: Usage::new(prompt_tokens, completion_tokens),
    }
}

/// Wrap one streamed unit as a chunk
///
/// `finish_reason` stays empty until the terminal unit.
pub fn to_stream_chunk(unit: &ollama::ChatResponse, model: &str, chunk_id: &str, created: i64) -> ChatCompletionChunk {
    let finish_reason = if unit.done { FINISH_REASON_STOP } else { "" };

    ChatCompletionChunk {
        id: chunk_id.to_owned(),
        object: "chat.completion.chunk".to_owned(),
        created,
        model: model.to_owned(),
        choices: vec![StreamChoice {
            index: 0,
            delta: StreamDelta {
                role: (!unit.message.role.is_empty()).then(|| unit.message.role.clone()),
                content: unit.message.content.clone(),
            },
            finish_reason: finish_reason.to_owned(),
        }],
    }
}

/// `chatcmpl-<uuid>`
pub fn completion_id() -> String {
    format!("chatcmpl-{}", uuid::Uuid::new_v4())
}

// -- Model catalog --

/// Map a backend model entry
///
/// `created` comes from `modified_at`, falling back to the current time
/// when absent or not RFC 3339.
pub fn to_model(info: &ollama::ModelInfo) -> Model {
    let created = info
        .modified_at
        .as_deref()
        .and_then(|timestamp| timestamp.parse::<jiff::Timestamp>().ok())
        .unwrap_or_else(jiff::Timestamp::now)
        .as_second();

    Model {
        id: info.name.clone(),
        object: "model".to_owned(),
        created,
        owned_by: "ollama".to_owned(),
    }
}

pub fn to_model_list(tags: &ollama::TagsResponse) -> ModelList {
    ModelList {
        object: "list".to_owned(),
        data: tags.models.iter().map(to_model).collect(),
    }
}
