use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::{selected, MutationResponse};
use crate::errors::AppError;
use crate::forms::{self, PlaceForm};
use crate::models::{EntityId, Place};
use crate::services::filter::{Facet, Page, Scope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PlaceQuery {
    #[serde(default)]
    pub q: String,
    pub status: Option<String>,
    pub page: Option<usize>,
    #[serde(default)]
    pub refresh: bool,
}

// GET /api/places
pub async fn list_places(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlaceQuery>,
) -> Result<Json<Page<Place>>, AppError> {
    let session = state.session.require()?;
    let places = state.places_for(&session, query.refresh).await?;

    let facets = selected(&[(Facet::Status, &query.status)]);
    let page = state.view("places", |view| {
        view.update(&query.q, &facets, query.page);
        view.apply(&places, &Scope::unrestricted(), state.config.page_size, false)
            .map(Place::clone)
    });
    Ok(Json(page))
}

fn reconcile(state: &AppState, record: Option<&Place>) {
    match record {
        Some(place) => state.places.upsert(place.clone()),
        None => state.places.clear(),
    }
}

// POST /api/places
pub async fn create_place(
    State(state): State<Arc<AppState>>,
    Json(form): Json<PlaceForm>,
) -> Result<Json<MutationResponse<Place>>, AppError> {
    let session = state.session.require_master()?;
    forms::check(&form)?;

    let saved = state.remote(state.api.create_place(&session, &form)).await?;
    reconcile(&state, saved.record.as_ref());
    tracing::info!(name = %form.name, "place created");
    Ok(Json(saved.into()))
}

// PUT /api/places/:id
pub async fn update_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<PlaceForm>,
) -> Result<Json<MutationResponse<Place>>, AppError> {
    let session = state.session.require_master()?;
    let id = EntityId::from(id);
    forms::check(&form)?;

    let saved = state
        .remote(state.api.update_place(&session, &id, &form))
        .await?;
    reconcile(&state, saved.record.as_ref());
    tracing::info!(place_id = %id, enabled = form.enabled, "place updated");
    Ok(Json(saved.into()))
}

// DELETE /api/places/:id
pub async fn delete_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MutationResponse<()>>, AppError> {
    let session = state.session.require_master()?;
    let id = EntityId::from(id);

    let message = state.remote(state.api.delete_place(&session, &id)).await?;
    state.places.remove(&id);
    tracing::info!(place_id = %id, "place deleted");
    Ok(Json(MutationResponse::message(message)))
}
