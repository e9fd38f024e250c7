use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::MutationResponse;
use crate::errors::AppError;
use crate::forms::{self, BannerForm};
use crate::models::{Banner, EntityId};
use crate::services::filter::{self, Page};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BannerQuery {
    pub page: Option<usize>,
    #[serde(default)]
    pub refresh: bool,
}

// GET /api/banners
pub async fn list_banners(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BannerQuery>,
) -> Result<Json<Page<Banner>>, AppError> {
    let session = state.session.require()?;
    let banners = state
        .load(&state.banners, query.refresh, state.api.list_banners(&session))
        .await?;

    let page = filter::paginate(
        banners.iter().cloned().collect(),
        query.page.unwrap_or(1),
        state.config.page_size,
    );
    Ok(Json(page))
}

fn reconcile(state: &AppState, record: Option<&Banner>) {
    match record {
        Some(banner) => state.banners.upsert(banner.clone()),
        None => state.banners.clear(),
    }
}

// POST /api/banners
pub async fn create_banner(
    State(state): State<Arc<AppState>>,
    Json(form): Json<BannerForm>,
) -> Result<Json<MutationResponse<Banner>>, AppError> {
    let session = state.session.require()?;
    forms::check(&form)?;

    let saved = state.remote(state.api.create_banner(&session, &form)).await?;
    reconcile(&state, saved.record.as_ref());
    tracing::info!("banner created");
    Ok(Json(saved.into()))
}

// PUT /api/banners/:id
pub async fn update_banner(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<BannerForm>,
) -> Result<Json<MutationResponse<Banner>>, AppError> {
    let session = state.session.require()?;
    let id = EntityId::from(id);
    forms::check(&form)?;

    let saved = state
        .remote(state.api.update_banner(&session, &id, &form))
        .await?;
    reconcile(&state, saved.record.as_ref());
    tracing::info!(banner_id = %id, "banner updated");
    Ok(Json(saved.into()))
}

// DELETE /api/banners/:id
pub async fn delete_banner(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MutationResponse<()>>, AppError> {
    let session = state.session.require()?;
    let id = EntityId::from(id);

    let message = state.remote(state.api.delete_banner(&session, &id)).await?;
    state.banners.remove(&id);
    tracing::info!(banner_id = %id, "banner deleted");
    Ok(Json(MutationResponse::message(message)))
}
