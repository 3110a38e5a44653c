//! Gateway metric instruments
//!
//! Instruments come from the global meter provider, so they are no-ops
//! until an exporter is configured.

use std::time::Duration;

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram};

pub const HTTP_REQUEST_DURATION: &str = "http.server.request.duration";
pub const LLM_REQUEST_COUNT: &str = "llm.request.count";
pub const LLM_TOKEN_USAGE: &str = "llm.token.usage";

/// Counters and histograms recorded by the gateway
#[derive(Clone)]
pub struct GatewayMetrics {
    request_duration: Histogram<f64>,
    request_count: Counter<u64>,
    token_usage: Counter<u64>,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        let meter = opentelemetry::global::meter("ollagate");

        Self {
            request_duration: meter
                .f64_histogram(HTTP_REQUEST_DURATION)
                .with_unit("s")
                .with_description("Duration of inbound HTTP requests")
                .build(),
            request_count: meter
                .u64_counter(LLM_REQUEST_COUNT)
                .with_description("Completed chat and embedding requests")
                .build(),
            token_usage: meter
                .u64_counter(LLM_TOKEN_USAGE)
                .with_description("Estimated tokens by kind")
                .build(),
        }
    }

    /// Record one finished HTTP request
    pub fn record_http_request(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        self.request_duration.record(
            elapsed.as_secs_f64(),
            &[
                KeyValue::new("http.request.method", method.to_owned()),
                KeyValue::new("http.route", route.to_owned()),
                KeyValue::new("http.response.status_code", i64::from(status)),
            ],
        );
    }

    /// Record one chat completion
    pub fn record_completion(&self, model: &str, prompt_tokens: u64, completion_tokens: u64) {
        let model = KeyValue::new("llm.model", model.to_owned());

        self.request_count
            .add(1, &[model.clone(), KeyValue::new("llm.operation", "chat")]);
        self.token_usage
            .add(prompt_tokens, &[model.clone(), KeyValue::new("llm.token.kind", "prompt")]);
        self.token_usage
            .add(completion_tokens, &[model, KeyValue::new("llm.token.kind", "completion")]);
    }

    /// Record one embedding request
    pub fn record_embedding(&self, model: &str, tokens: u64) {
        let model = KeyValue::new("llm.model", model.to_owned());

        self.request_count
            .add(1, &[model.clone(), KeyValue::new("llm.operation", "embedding")]);
        self.token_usage
            .add(tokens, &[model, KeyValue::new("llm.token.kind", "embedding")]);
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}
