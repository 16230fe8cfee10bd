//! HTTP server assembly: routing, request decoding and response encoding.

mod cors;

use axum::Extension;
use axum::Json;
use axum::Router;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use bytes::Bytes;
use http::StatusCode;
use tower_http::trace::TraceLayer;

use self::cors::CorsLayer;
use crate::execution::ExecutionService;
use crate::graphql;

/// Build the axum router exposing the GraphQL endpoint.
///
/// The execution service is injected as an extension so every handler
/// invocation works on the same shared, read-only schema and store. The CORS
/// layer is outermost: it decorates every response, error responses
/// included, and answers preflight requests before routing happens.
pub fn router(service: ExecutionService) -> Router {
    Router::new()
        .route("/graphql", post(handle_post))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(service))
        .layer(CorsLayer::new())
}

/// Adapt one HTTP call to one executor invocation.
///
/// A malformed request body never reaches the executor and is the only
/// client error surfaced as an HTTP status; execution errors ride back in
/// the response body with a success status.
async fn handle_post(Extension(service): Extension<ExecutionService>, body: Bytes) -> Response {
    match serde_json::from_slice::<graphql::Request>(&body) {
        Ok(request) => Json(service.execute(&request)).into_response(),
        Err(error) => (StatusCode::BAD_REQUEST, error.to_string()).into_response(),
    }
}

/// Serve `router` on an already-bound listener until the process terminates.
pub async fn serve(listener: tokio::net::TcpListener, router: Router) -> std::io::Result<()> {
    axum::serve(listener, router).await
}
