use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::{selected, MutationResponse};
use crate::errors::AppError;
use crate::forms::AdminRegistrationForm;
use crate::models::User;
use crate::services::filter::{Facet, Page, Scope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub q: String,
    pub place: Option<String>,
    pub page: Option<usize>,
    #[serde(default)]
    pub refresh: bool,
}

// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Page<User>>, AppError> {
    let session = state.session.require()?;
    let users = state
        .load(&state.users, query.refresh, state.api.list_users(&session))
        .await?;

    let facets = selected(&[(Facet::Place, &query.place)]);
    let page = state.view("users", |view| {
        view.update(&query.q, &facets, query.page);
        view.apply(&users, &Scope::unrestricted(), state.config.page_size, false)
            .map(User::clone)
    });
    Ok(Json(page))
}

// GET /api/admins
pub async fn list_admins(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Page<User>>, AppError> {
    let session = state.session.require_master()?;
    let admins = state
        .load(&state.admins, query.refresh, state.api.list_admins(&session))
        .await?;

    let facets = selected(&[(Facet::Place, &query.place)]);
    let page = state.view("admins", |view| {
        view.update(&query.q, &facets, query.page);
        view.apply(&admins, &Scope::unrestricted(), state.config.page_size, false)
            .map(User::clone)
    });
    Ok(Json(page))
}

// POST /api/admins
pub async fn register_admin(
    State(state): State<Arc<AppState>>,
    Json(form): Json<AdminRegistrationForm>,
) -> Result<Json<MutationResponse<()>>, AppError> {
    let session = state.session.require_master()?;
    form.check()?;

    let message = state
        .remote(state.api.register_admin(&session, &form))
        .await?;
    state.admins.clear();
    tracing::info!(place_id = %form.place_id, "admin registered");
    Ok(Json(MutationResponse::message(message)))
}
