use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
};
use cadview_lib::surface::ViewerMessage;
use shared::reply;
use tracing::{error, info, warn};

use crate::pipeline;
use crate::AppState;

/// Liveness check; also shown on the viewer surface.
pub async fn status(State(state): State<AppState>) -> &'static str {
    // A closed queue means the host is shutting down; the reply still holds.
    let _ = state.messages.send(ViewerMessage::Status(reply::RUNNING.to_string()));
    reply::RUNNING
}

/// Stop the listener and the host loop.
pub async fn stop(State(state): State<AppState>) -> &'static str {
    info!("Stop requested");
    state.shutdown.notify_one();
    let _ = state.messages.send(ViewerMessage::Stopped);
    reply::STOPPED
}

/// Receive an archive; the query string carries display options.
///
/// The pipeline meshes and samples geometry, so it runs on the blocking pool,
/// one payload at a time.
pub async fn show(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    body: Bytes,
) -> String {
    let pairs = match query {
        Ok(Query(pairs)) => pairs,
        Err(rejection) => {
            warn!("Ignoring display options: {}", rejection.body_text());
            Vec::new()
        }
    };

    let _busy = state.pipeline.clone().lock_owned().await;
    let result = tokio::task::spawn_blocking(move || {
        pipeline::process(&state.settings, &state.messages, &pairs, &body)
    })
    .await;

    match result {
        Ok(Ok(())) => reply::DONE.to_string(),
        Ok(Err(failure)) => {
            error!("{failure}");
            failure.to_string()
        }
        Err(e) => {
            error!("Pipeline task failed: {e}");
            format!("Processing failed: {e}")
        }
    }
}

pub async fn ignored() -> &'static str {
    reply::IGNORED
}
