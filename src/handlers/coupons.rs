use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::{selected, MutationResponse};
use crate::errors::AppError;
use crate::forms::{self, CouponForm, StatusForm};
use crate::models::{Coupon, EntityId, Session};
use crate::services::filter::{Facet, Page, Scope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CouponQuery {
    #[serde(default)]
    pub q: String,
    pub status: Option<String>,
    pub page: Option<usize>,
    #[serde(default)]
    pub refresh: bool,
}

// GET /api/coupons
pub async fn list_coupons(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CouponQuery>,
) -> Result<Json<Page<Coupon>>, AppError> {
    let session = state.session.require()?;
    let coupons = state
        .load(&state.coupons, query.refresh, state.api.list_coupons(&session))
        .await?;

    let facets = selected(&[(Facet::Status, &query.status)]);
    let page = state.view("coupons", |view| {
        view.update(&query.q, &facets, query.page);
        view.apply(&coupons, &Scope::unrestricted(), state.config.page_size, false)
            .map(Coupon::clone)
    });
    Ok(Json(page))
}

/// Codes are unique, ignoring case, among the coupons other than `except`.
async fn ensure_unique_code(
    state: &AppState,
    session: &Session,
    code: &str,
    except: Option<&EntityId>,
) -> Result<(), AppError> {
    let coupons = state
        .load(&state.coupons, false, state.api.list_coupons(session))
        .await?;
    let taken = coupons
        .iter()
        .any(|c| Some(&c.id) != except && c.same_code(code));
    if taken {
        return Err(AppError::Validation(format!(
            "code: coupon '{}' already exists",
            code.trim()
        )));
    }
    Ok(())
}

fn reconcile(state: &AppState, record: Option<&Coupon>) {
    match record {
        Some(coupon) => state.coupons.upsert(coupon.clone()),
        None => state.coupons.clear(),
    }
}

// POST /api/coupons
pub async fn create_coupon(
    State(state): State<Arc<AppState>>,
    Json(form): Json<CouponForm>,
) -> Result<Json<MutationResponse<Coupon>>, AppError> {
    let session = state.session.require()?;
    forms::check(&form)?;
    ensure_unique_code(&state, &session, &form.code, None).await?;

    let saved = state.remote(state.api.create_coupon(&session, &form)).await?;
    reconcile(&state, saved.record.as_ref());
    tracing::info!(code = %form.code, "coupon created");
    Ok(Json(saved.into()))
}

// PUT /api/coupons/:id
pub async fn update_coupon(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<CouponForm>,
) -> Result<Json<MutationResponse<Coupon>>, AppError> {
    let session = state.session.require()?;
    let id = EntityId::from(id);
    forms::check(&form)?;
    ensure_unique_code(&state, &session, &form.code, Some(&id)).await?;

    let saved = state
        .remote(state.api.update_coupon(&session, &id, &form))
        .await?;
    reconcile(&state, saved.record.as_ref());
    tracing::info!(coupon_id = %id, "coupon updated");
    Ok(Json(saved.into()))
}

// DELETE /api/coupons/:id
pub async fn delete_coupon(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MutationResponse<()>>, AppError> {
    let session = state.session.require()?;
    let id = EntityId::from(id);

    let message = state.remote(state.api.delete_coupon(&session, &id)).await?;
    state.coupons.remove(&id);
    tracing::info!(coupon_id = %id, "coupon deleted");
    Ok(Json(MutationResponse::message(message)))
}

// PUT /api/coupons/:id/status
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<StatusForm>,
) -> Result<Json<MutationResponse<Coupon>>, AppError> {
    let session = state.session.require()?;
    let id = EntityId::from(id);

    let message = state
        .remote(state.api.set_coupon_status(&session, &id, form.active))
        .await?;
    let record = state.coupons.find(&id).map(|mut c| {
        c.active = form.active;
        state.coupons.upsert(c.clone());
        c
    });
    Ok(Json(MutationResponse { message, record }))
}
