pub mod send;

use std::sync::Arc;

use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use mercury_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/send", post(send::send_message))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
