pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers::handle_analyze;
use crate::session::handlers::{handle_login, handle_session_status};
use crate::session::session_middleware;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    let api = Router::new()
        // Session API
        .route("/api/v1/session", get(handle_session_status))
        .route("/api/v1/session/login", post(handle_login))
        // Analysis API
        .route("/api/v1/analyze", post(handle_analyze))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    // Health checks stay outside the session layer.
    Router::new()
        .route("/health", get(health::health_handler))
        .merge(api)
        .with_state(state)
}
