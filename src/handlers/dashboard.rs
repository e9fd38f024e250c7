use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Bike, Booking, Session};
use crate::services::aggregation::{self, BikeBookingCount, DashboardSummary, MonthlyPayment};
use crate::services::filter::{self, FilterSpec};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub refresh: bool,
}

async fn visible_bookings(state: &AppState, session: &Session, refresh: bool) -> Result<Vec<Booking>, AppError> {
    let bookings = state
        .load(&state.bookings, refresh, state.api.list_bookings(session))
        .await?;
    let scope = state.booking_scope(session).await?;
    Ok(filter::filter(&bookings, &scope, &FilterSpec::default())
        .into_iter()
        .cloned()
        .collect())
}

async fn visible_bikes(state: &AppState, session: &Session, refresh: bool) -> Result<Vec<Bike>, AppError> {
    let bikes = state
        .load(&state.bikes, refresh, state.api.list_bikes(session))
        .await?;
    let scope = state.scope(session).await?;
    Ok(filter::filter(&bikes, &scope, &FilterSpec::default())
        .into_iter()
        .cloned()
        .collect())
}

// GET /api/dashboard/summary
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    let session = state.session.require()?;
    let bookings = visible_bookings(&state, &session, query.refresh).await?;
    let bikes = visible_bikes(&state, &session, query.refresh).await?;
    Ok(Json(aggregation::dashboard_summary(&bookings, &bikes)))
}

// GET /api/dashboard/monthly-payments
pub async fn monthly_payments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<MonthlyPayment>>, AppError> {
    let session = state.session.require()?;
    let bookings = visible_bookings(&state, &session, query.refresh).await?;
    Ok(Json(aggregation::monthly_payments(&bookings)))
}

// GET /api/dashboard/most-booked
pub async fn most_booked(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<BikeBookingCount>>, AppError> {
    let session = state.session.require()?;
    let bookings = visible_bookings(&state, &session, query.refresh).await?;
    Ok(Json(aggregation::most_booked_bikes(&bookings)))
}
