//! Axum route handlers for the OpenAI-compatible endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json, Router, routing};
use futures_util::{Stream, StreamExt};
use http::header;
use ollagate_core::{HttpError, RequestContext};

use crate::error::LlmError;
use crate::protocol::openai::{ChatRequest, EmbeddingRequest, ResponsesRequest};
use crate::state::LlmState;
use crate::streaming::{FrameStream, StreamFrame};

/// Build the LLM router with all endpoints
pub fn llm_router(state: LlmState) -> Router {
    Router::new()
        .route("/v1/chat/completions", routing::post(chat_completions))
        .route("/v1/embeddings", routing::post(embeddings))
        .route("/v1/models", routing::get(list_models))
        // Ollama model names may contain `/`
        .route("/v1/models/{*name}", routing::get(get_model))
        .route("/v1/responses", routing::post(responses))
        .with_state(state)
}

/// Handle `POST /v1/chat/completions`
async fn chat_completions(
    State(state): State<LlmState>,
    Extension(context): Extension<RequestContext>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return LlmError::from(rejection).into_response(),
    };

    if request.is_stream() {
        match state.complete_stream(request, &context, state.stream_token()).await {
            Ok(frames) => sse_response(frames),
            Err(e) => e.into_response(),
        }
    } else {
        match state.complete(request, &context).await {
            Ok(completion) => Json(completion).into_response(),
            Err(e) => e.into_response(),
        }
    }
}

/// Handle `POST /v1/responses`
async fn responses(
    State(state): State<LlmState>,
    Extension(context): Extension<RequestContext>,
    body: Result<Json<ResponsesRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return LlmError::from(rejection).into_response(),
    };

    if request.stream.unwrap_or(false) {
        match state
            .complete_stream(request.into(), &context, state.stream_token())
            .await
        {
            Ok(frames) => sse_response(frames),
            Err(e) => e.into_response(),
        }
    } else {
        match state.respond(request, &context).await {
            Ok(response) => Json(response).into_response(),
            Err(e) => e.into_response(),
        }
    }
}

/// Handle `POST /v1/embeddings`
async fn embeddings(
    State(state): State<LlmState>,
    Extension(context): Extension<RequestContext>,
    body: Result<Json<EmbeddingRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return LlmError::from(rejection).into_response(),
    };

    match state.embed(request, &context).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Handle `GET /v1/models`
async fn list_models(State(state): State<LlmState>) -> Response {
    match state.list_models().await {
        Ok(models) => Json(models).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Handle `GET /v1/models/{name}`
async fn get_model(State(state): State<LlmState>, Path(name): Path<String>) -> Response {
    match state.get_model(&name).await {
        Ok(model) => Json(model).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Render completion frames as server-sent events
fn sse_response(frames: FrameStream) -> Response {
    let sse = Sse::new(frame_events(frames)).keep_alive(KeepAlive::default());

    ([(header::CACHE_CONTROL, "no-cache")], sse).into_response()
}

fn frame_events(frames: FrameStream) -> impl Stream<Item = Result<Event, axum::Error>> {
    frames.map(|frame| match frame {
        StreamFrame::Chunk(chunk) => Event::default().json_data(&chunk),
        StreamFrame::Done => Ok(Event::default().data("[DONE]")),
    })
}

impl From<JsonRejection> for LlmError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for LlmError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        (status, Json(self.to_body())).into_response()
    }
}
