use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::forms::{self, LoginForm};
use crate::models::SessionInfo;
use crate::state::AppState;

// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(form): Json<LoginForm>,
) -> Result<Json<SessionInfo>, AppError> {
    forms::check(&form)?;

    let session = match state.api.login(&form).await {
        Ok(session) => session,
        Err(AppError::Unauthenticated) => {
            return Err(AppError::Domain("invalid email or password".to_string()))
        }
        Err(e) => return Err(e),
    };

    let info = SessionInfo::from(&session);
    state.sign_in(session)?;
    Ok(Json(info))
}

// POST /api/auth/logout
pub async fn logout(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.reset();
    Json(json!({ "message": "logged out" }))
}

// GET /api/auth/session
pub async fn current_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionInfo>, AppError> {
    let session = state.session.require()?;
    Ok(Json(SessionInfo::from(&session)))
}
