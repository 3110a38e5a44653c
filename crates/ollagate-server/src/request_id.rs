use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use http::{HeaderName, HeaderValue};
use ollagate_telemetry::metrics::GatewayMetrics;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Metric route label for requests that hit the fallback
const UNMATCHED_ROUTE: &str = "unmatched";

/// Request id assigned by [`request_id_middleware`]
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Assign a request id, echo it back and write the access log line
///
/// A non-empty incoming `X-Request-ID` is reused, otherwise a UUID v4 is
/// generated.
pub async fn request_id_middleware(metrics: GatewayMetrics, mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), ToOwned::to_owned);

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let route = route_label(&request).to_owned();
    let started = Instant::now();

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }

    let elapsed = started.elapsed();
    let status = response.status().as_u16();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status,
        latency_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "request completed"
    );
    metrics.record_http_request(method.as_str(), &route, status, elapsed);

    response
}

/// Route template for metrics, never the raw client path
fn route_label(request: &Request) -> &str {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ROUTE, MatchedPath::as_str)
}
