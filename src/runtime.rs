use crate::{
    auth::{api_key_auth, ApiKey},
    engine::{EventObserver, Node, RunNotification},
    execution_id::ExecutionId,
    notification::{Notification, PipelineUpdate},
};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::Span;

type Shared = Arc<EventObserver>;

/* ---------------- server ---------------- */

pub fn router(observer: Shared, api_key: Option<ApiKey>) -> Router {
    let mut ingest = Router::new()
        .route("/executions/:id/nodes", post(ingest_node))
        .route("/executions/:id/pipeline", post(ingest_pipeline))
        .route("/runs/started", post(run_started))
        .route("/runs/completed", post(run_completed))
        .route("/notifications", post(ingest_notification));

    if let Some(key) = api_key {
        ingest = ingest.layer(middleware::from_fn_with_state(key, api_key_auth));
    }

    Router::new()
        .route("/health", get(health))
        .merge(ingest)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        path = %req.uri().path(),
                    )
                })
                .on_response(|res: &Response, latency: Duration, _span: &Span| {
                    tracing::info!(
                        status = res.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "request completed"
                    );
                }),
        )
        .with_state(observer)
}

/// Serve until Ctrl-C, then force-close every stage still open.
pub async fn serve(addr: &str, observer: Shared, api_key: Option<ApiKey>) -> anyhow::Result<()> {
    let app = router(Arc::clone(&observer), api_key);

    let socket: SocketAddr = addr.parse()?;
    let listener = TcpListener::bind(socket).await?;

    tracing::info!("stagewatch ingest listening on http://{}", socket);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    observer.flush();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/* ---------------- endpoints ---------------- */

async fn health() -> &'static str {
    "ok"
}

async fn ingest_node(
    State(observer): State<Shared>,
    Path(id): Path<String>,
    Json(node): Json<Node>,
) -> StatusCode {
    observer.notify_node(&ExecutionId::new(id), &node);
    StatusCode::ACCEPTED
}

async fn ingest_pipeline(
    State(observer): State<Shared>,
    Path(id): Path<String>,
    Json(update): Json<PipelineUpdate>,
) -> StatusCode {
    observer.notify_pipeline(&ExecutionId::new(id), update.phase, update.is_complete);
    StatusCode::ACCEPTED
}

async fn run_started(State(observer): State<Shared>, Json(run): Json<RunNotification>) -> StatusCode {
    observer.notify_run_started(&run);
    StatusCode::ACCEPTED
}

async fn run_completed(State(observer): State<Shared>, Json(run): Json<RunNotification>) -> StatusCode {
    observer.notify_run_completed(&run);
    StatusCode::ACCEPTED
}

async fn ingest_notification(
    State(observer): State<Shared>,
    Json(notification): Json<Notification>,
) -> StatusCode {
    notification.dispatch(&observer);
    StatusCode::ACCEPTED
}
