use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::session::gate::check_access;
use crate::session::{quota, SessionId};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub access_code: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub authenticated: bool,
    /// True the first time the code is accepted: the client should redraw the tool.
    pub reload: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub usage_count: u32,
    pub quota_max: u32,
    pub remaining: u32,
}

/// GET /api/v1/session
pub async fn handle_session_status(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
) -> Json<SessionStatusResponse> {
    let quota_max = state.config.quota_max;
    let session = state.sessions.snapshot(session_id);
    Json(SessionStatusResponse {
        authenticated: session.authenticated,
        usage_count: session.usage_count,
        quota_max,
        remaining: quota::remaining(&session, quota_max),
    })
}

/// POST /api/v1/session/login
pub async fn handle_login(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let expected = state.config.access_password.as_deref();
    let decision = state
        .sessions
        .with_session(session_id, |session| {
            check_access(session, &request.access_code, expected)
        })
        .inspect_err(|e| warn!(session = %session_id.0, "access refused: {e}"))?;

    if decision.requires_reload() {
        info!(session = %session_id.0, "access granted");
    }

    Ok(Json(LoginResponse {
        authenticated: true,
        reload: decision.requires_reload(),
    }))
}
