//! Router and middleware stack.
//!
//! Routes:
//! - `GET /documents`, `POST /documents`
//! - `GET /documents/{id}`, `PUT /documents/{id}`, `DELETE /documents/{id}`
//! - `GET /health`
//!
//! Every request gets an `x-request-id` (generated when absent and echoed on
//! the response), a tracing span, and panic recovery to a 500.

use axum::{
    Router,
    body::Body,
    http::{HeaderName, Request},
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the application router over shared state.
pub fn router(state: AppState) -> Router {
    with_middleware(
        Router::new()
            .route("/documents", get(handlers::list_documents).post(handlers::create_document))
            .route(
                "/documents/{id}",
                get(handlers::get_document)
                    .put(handlers::update_document)
                    .delete(handlers::delete_document),
            )
            .route("/health", get(handlers::health)),
    )
    .with_state(state)
}

fn with_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!("request", method = %request.method(), uri = %request.uri(), request_id)
            }))
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(CatchPanicLayer::new()),
    )
}
