use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::selected;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, EntityId, PaymentStatus, Session};
use crate::services::filter::{Facet, Page};
use crate::services::lifecycle::{self, ActionForm, BookingAction};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    #[serde(default)]
    pub q: String,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub page: Option<usize>,
    #[serde(default)]
    pub refresh: bool,
}

/// A booking together with the actions it currently offers.
#[derive(Debug, Serialize)]
pub struct BookingRow {
    #[serde(flatten)]
    pub booking: Booking,
    pub actions: Vec<BookingAction>,
}

impl From<Booking> for BookingRow {
    fn from(booking: Booking) -> Self {
        let actions = lifecycle::actions_for(&booking);
        Self { booking, actions }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionsResponse {
    pub booking_id: EntityId,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub actions: Vec<BookingAction>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub message: String,
    pub booking: BookingRow,
}

async fn find_booking(state: &AppState, session: &Session, id: &EntityId) -> Result<Booking, AppError> {
    state
        .load(&state.bookings, false, state.api.list_bookings(session))
        .await?;
    state
        .bookings
        .find(id)
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingQuery>,
) -> Result<Json<Page<BookingRow>>, AppError> {
    let session = state.session.require()?;
    let bookings = state
        .load(&state.bookings, query.refresh, state.api.list_bookings(&session))
        .await?;
    let scope = state.booking_scope(&session).await?;

    let facets = selected(&[
        (Facet::Status, &query.status),
        (Facet::PaymentStatus, &query.payment_status),
    ]);
    let page = state.view("bookings", |view| {
        view.update(&query.q, &facets, query.page);
        view.apply(&bookings, &scope, state.config.page_size, true)
            .map(|b| BookingRow::from(b.clone()))
    });
    Ok(Json(page))
}

// GET /api/bookings/:id/actions
pub async fn booking_actions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ActionsResponse>, AppError> {
    let session = state.session.require()?;
    let booking = find_booking(&state, &session, &EntityId::from(id)).await?;

    Ok(Json(ActionsResponse {
        actions: lifecycle::actions_for(&booking),
        booking_id: booking.id,
        booking_status: booking.booking_status,
        payment_status: booking.payment_status,
    }))
}

// POST /api/bookings/:id/actions
pub async fn run_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<ActionForm>,
) -> Result<Json<ActionResponse>, AppError> {
    let session = state.session.require()?;
    let request = form.into_request()?;
    let booking = find_booking(&state, &session, &EntityId::from(id)).await?;

    let outcome = state
        .remote(lifecycle::execute(&state.api, &session, &booking, request))
        .await?;
    state.bookings.upsert(outcome.booking.clone());

    Ok(Json(ActionResponse {
        message: outcome.message,
        booking: BookingRow::from(outcome.booking),
    }))
}
