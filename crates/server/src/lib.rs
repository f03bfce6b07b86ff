//! Transport endpoint of the viewer.
//!
//! One HTTP listener per host process. It accepts assembly archives, runs
//! them through the [`pipeline`] and hands the result to the host loop as
//! [`ViewerMessage`](cadview_lib::surface::ViewerMessage)s.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use cadview_lib::settings::ViewerSettings;
use cadview_lib::surface::MessageSender;
use tokio::sync::{Mutex, Notify};
use tower_http::cors::CorsLayer;

pub mod pipeline;
pub mod routes;
pub mod session;

pub use pipeline::{Stage, StageFailure};
pub use session::{SessionError, ViewerSession};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ViewerSettings>,
    pub messages: MessageSender,
    /// Notified to stop the listener gracefully.
    pub shutdown: Arc<Notify>,
    /// Held while a payload runs through the pipeline; POSTs share one
    /// scratch file.
    pub pipeline: Arc<Mutex<()>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::ignored).post(routes::show))
        .route("/status", get(routes::status))
        .route("/stop", get(routes::stop))
        .fallback(routes::ignored)
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
