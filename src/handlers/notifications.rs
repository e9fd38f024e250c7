use std::sync::{Arc, PoisonError};

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::MutationResponse;
use crate::errors::AppError;
use crate::forms::ReadForm;
use crate::models::{EntityId, Notification};
use crate::services::filter::{Facet, Page, Scope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub q: String,
    pub priority: Option<String>,
    pub read: Option<String>,
    pub page: Option<usize>,
    pub place_id: Option<String>,
    #[serde(default)]
    pub refresh: bool,
}

/// `true`/`false` are accepted alongside the READ/UNREAD labels.
fn read_label(value: &str) -> &str {
    match value.trim().to_lowercase().as_str() {
        "true" => "READ",
        "false" => "UNREAD",
        _ => value,
    }
}

// GET /api/notifications
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Page<Notification>>, AppError> {
    let session = state.session.require()?;
    let place = session
        .place_scope()
        .cloned()
        .or_else(|| query.place_id.clone().map(EntityId::from))
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("place_id: a place is required".to_string()))?;

    // The cache only ever holds one place's notifications, and that place is
    // recorded only once its list has arrived.
    let switched = state
        .notifications_place
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        != Some(&place);
    if switched {
        state.notifications.clear();
    }

    let notifications = state
        .load(
            &state.notifications,
            query.refresh || switched,
            state.api.list_notifications(&session, &place),
        )
        .await?;
    if switched {
        *state
            .notifications_place
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(place.clone());
    }

    let mut facets = Vec::new();
    if let Some(priority) = query.priority.as_deref() {
        facets.push((Facet::Priority, priority));
    }
    if let Some(read) = query.read.as_deref() {
        facets.push((Facet::Read, read_label(read)));
    }
    let page = state.view("notifications", |view| {
        view.update(&query.q, &facets, query.page);
        view.apply(&notifications, &Scope::unrestricted(), state.config.page_size, true)
            .map(Notification::clone)
    });
    Ok(Json(page))
}

// PUT /api/notifications/:id/read
pub async fn set_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<ReadForm>,
) -> Result<Json<MutationResponse<Notification>>, AppError> {
    let session = state.session.require()?;
    let id = EntityId::from(id);

    let message = state
        .remote(state.api.set_notification_read(&session, &id, form.is_read))
        .await?;

    let record = state.notifications.find(&id).map(|mut n| {
        n.read = form.is_read;
        state.notifications.upsert(n.clone());
        n
    });
    Ok(Json(MutationResponse { message, record }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_label() {
        assert_eq!(read_label("true"), "READ");
        assert_eq!(read_label("FALSE"), "UNREAD");
        assert_eq!(read_label("unread"), "unread");
        assert_eq!(read_label("all"), "all");
    }
}
