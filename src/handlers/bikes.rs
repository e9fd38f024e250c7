use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::{selected, MutationResponse};
use crate::errors::AppError;
use crate::forms::{self, BikeForm};
use crate::models::{Bike, EntityId, Session};
use crate::services::filter::{Facet, Page};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BikeQuery {
    #[serde(default)]
    pub q: String,
    pub status: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub place: Option<String>,
    pub page: Option<usize>,
    #[serde(default)]
    pub refresh: bool,
}

// GET /api/bikes
pub async fn list_bikes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BikeQuery>,
) -> Result<Json<Page<Bike>>, AppError> {
    let session = state.session.require()?;
    let bikes = state
        .load(&state.bikes, query.refresh, state.api.list_bikes(&session))
        .await?;
    let scope = state.scope(&session).await?;

    let facets = selected(&[
        (Facet::Status, &query.status),
        (Facet::Category, &query.category),
        (Facet::Brand, &query.brand),
        (Facet::Place, &query.place),
    ]);
    let page = state.view("bikes", |view| {
        view.update(&query.q, &facets, query.page);
        view.apply(&bikes, &scope, state.config.page_size, false)
            .map(Bike::clone)
    });
    Ok(Json(page))
}

/// Place a bike is saved under. Place-scoped admins always use their own.
fn target_place(session: &Session, requested: Option<&EntityId>) -> Result<EntityId, AppError> {
    session
        .place_scope()
        .or(requested)
        .cloned()
        .ok_or_else(|| AppError::Validation("placeId: a place is required".to_string()))
}

/// Place-scoped admins may only touch bikes of their place.
async fn ensure_owned(state: &AppState, session: &Session, id: &EntityId) -> Result<(), AppError> {
    let Some(place) = session.place_scope() else {
        return Ok(());
    };
    let bikes = state
        .load(&state.bikes, false, state.api.list_bikes(session))
        .await?;
    match bikes.iter().find(|b| &b.id == id) {
        None => Err(AppError::NotFound(format!("bike {id}"))),
        Some(bike) if bike.place_id.as_ref() != Some(place) => Err(AppError::Forbidden(
            "this bike belongs to another place".to_string(),
        )),
        Some(_) => Ok(()),
    }
}

fn reconcile(state: &AppState, record: Option<&Bike>) {
    match record {
        Some(bike) => state.bikes.upsert(bike.clone()),
        None => state.bikes.clear(),
    }
}

// POST /api/bikes
pub async fn create_bike(
    State(state): State<Arc<AppState>>,
    Json(form): Json<BikeForm>,
) -> Result<Json<MutationResponse<Bike>>, AppError> {
    let session = state.session.require()?;
    forms::check(&form)?;
    let place = target_place(&session, form.place_id.as_ref())?;

    let saved = state
        .remote(state.api.create_bike(&session, &place, &form))
        .await?;
    reconcile(&state, saved.record.as_ref());
    tracing::info!(place_id = %place, "bike created");
    Ok(Json(saved.into()))
}

// PUT /api/bikes/:id
pub async fn update_bike(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<BikeForm>,
) -> Result<Json<MutationResponse<Bike>>, AppError> {
    let session = state.session.require()?;
    let id = EntityId::from(id);
    forms::check(&form)?;
    ensure_owned(&state, &session, &id).await?;
    let place = target_place(&session, form.place_id.as_ref())?;

    let saved = state
        .remote(state.api.update_bike(&session, &id, &place, &form))
        .await?;
    reconcile(&state, saved.record.as_ref());
    tracing::info!(bike_id = %id, "bike updated");
    Ok(Json(saved.into()))
}

// DELETE /api/bikes/:id
pub async fn delete_bike(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MutationResponse<()>>, AppError> {
    let session = state.session.require()?;
    let id = EntityId::from(id);
    ensure_owned(&state, &session, &id).await?;

    let message = state.remote(state.api.delete_bike(&session, &id)).await?;
    state.bikes.remove(&id);
    tracing::info!(bike_id = %id, "bike deleted");
    Ok(Json(MutationResponse::message(message)))
}
