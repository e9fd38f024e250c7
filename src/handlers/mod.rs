pub mod auth;
pub mod banners;
pub mod bikes;
pub mod bookings;
pub mod coupons;
pub mod dashboard;
pub mod health;
pub mod notifications;
pub mod places;
pub mod upload;
pub mod users;

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::Saved;
use crate::services::filter::Facet;
use crate::state::AppState;

/// Body returned by every create, update and delete.
#[derive(Debug, Serialize)]
pub struct MutationResponse<T> {
    pub message: String,
    pub record: Option<T>,
}

impl<T> From<Saved<T>> for MutationResponse<T> {
    fn from(saved: Saved<T>) -> Self {
        Self {
            message: saved.message,
            record: saved.record,
        }
    }
}

impl MutationResponse<()> {
    pub fn message(message: String) -> Self {
        Self {
            message,
            record: None,
        }
    }
}

/// Facet selections actually present in a query string.
fn selected<'a>(facets: &[(Facet, &'a Option<String>)]) -> Vec<(Facet, &'a str)> {
    facets
        .iter()
        .filter_map(|(facet, value)| value.as_deref().map(|v| (*facet, v)))
        .collect()
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::current_session))
        .route("/bikes", get(bikes::list_bikes).post(bikes::create_bike))
        .route("/bikes/:id", put(bikes::update_bike).delete(bikes::delete_bike))
        .route("/bookings", get(bookings::list_bookings))
        .route(
            "/bookings/:id/actions",
            get(bookings::booking_actions).post(bookings::run_action),
        )
        .route("/dashboard/summary", get(dashboard::summary))
        .route("/dashboard/monthly-payments", get(dashboard::monthly_payments))
        .route("/dashboard/most-booked", get(dashboard::most_booked))
        .route("/places", get(places::list_places).post(places::create_place))
        .route("/places/:id", put(places::update_place).delete(places::delete_place))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/:id/read", put(notifications::set_read))
        .route("/coupons", get(coupons::list_coupons).post(coupons::create_coupon))
        .route(
            "/coupons/:id",
            put(coupons::update_coupon).delete(coupons::delete_coupon),
        )
        .route("/coupons/:id/status", put(coupons::set_status))
        .route("/banners", get(banners::list_banners).post(banners::create_banner))
        .route(
            "/banners/:id",
            put(banners::update_banner).delete(banners::delete_banner),
        )
        .route("/users", get(users::list_users))
        .route("/admins", get(users::list_admins).post(users::register_admin))
        .route("/upload", post(upload::upload));

    let app = Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match cors {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    match origin {
        None | Some("*") => Some(layer.allow_origin(Any)),
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => Some(layer.allow_origin(value)),
            Err(e) => {
                tracing::warn!(error = %e, %origin, "ignoring invalid CORS_ORIGIN");
                None
            }
        },
    }
}
