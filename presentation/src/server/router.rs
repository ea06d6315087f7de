//! axum router for the relay

use super::error::ApiError;
use axum::body::{Body, Bytes};
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Router;
use axum::routing::{get, post};
use futures::StreamExt;
use sentinel_application::{RelayError, RelayReviewUseCase, RelayStream};
use sentinel_domain::{Framing, ReviewRequest, ReviewRequestBody};
use std::convert::Infallible;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared, immutable server state.
#[derive(Clone)]
pub struct AppState {
    pub relay: RelayReviewUseCase,
}

/// Build the relay router with the review endpoint mounted at `path`.
///
/// The request body limit follows the relay's size ceilings so that the
/// ceilings, not axum's default limit, decide what is too large.
pub fn router(relay: RelayReviewUseCase, path: &str) -> Router {
    let body_limit = relay.limits().max_body_bytes();
    Router::new()
        .route(path, post(review).fallback(method_not_allowed))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { relay })
}

/// Serve until Ctrl-C.
pub async fn serve(
    listener: TcpListener,
    relay: RelayReviewUseCase,
    path: &str,
) -> std::io::Result<()> {
    let app = router(relay, path);
    info!(addr = %listener.local_addr()?, path, "Relay listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn review(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let body = body.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::BodyTooLarge {
            limit: state.relay.limits().max_body_bytes(),
        },
        _ => ApiError::UnreadableBody(rejection.body_text()),
    })?;

    let framing = Framing::from_accept(
        headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok()),
    );

    let body: ReviewRequestBody =
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidJson(e.to_string()))?;
    let request = ReviewRequest::try_from(body).map_err(RelayError::from)?;

    let stream = state.relay.start(request).await?;

    Ok((
        [
            (header::CONTENT_TYPE, framing.content_type()),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(encoded(stream, framing)),
    )
        .into_response())
}

/// Relay frames encoded for `framing`, skipping frames with no bytes on the wire.
fn encoded(
    stream: RelayStream,
    framing: Framing,
) -> impl futures::Stream<Item = Result<String, Infallible>> + Send + 'static {
    futures::stream::unfold(stream, |mut stream| async move {
        stream.next().await.map(|frame| (frame, stream))
    })
    .filter_map(move |frame| {
        let encoded = frame.encode(framing);
        async move { (!encoded.is_empty()).then_some(Ok::<_, Infallible>(encoded)) }
    })
}
