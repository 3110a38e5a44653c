use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use ollagate_core::{Alias, RequestContext};

use crate::request_id::RequestId;

/// Middleware that builds the `RequestContext` handlers extract
///
/// Combines the request id and the alias inserted by the outer layers.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), |id| id.0.clone());
    let alias = request.extensions().get::<Alias>().cloned().unwrap_or_else(Alias::unknown);

    request
        .extensions_mut()
        .insert(RequestContext::new(request_id, alias));

    next.run(request).await
}
