use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::api::RentalApi;
use crate::errors::AppError;
use crate::models::date;
use crate::models::{Booking, BookingStatus, PaymentStatus, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Activate,
    Complete,
    Cancel,
    Refund,
    UpdateDates,
}

impl BookingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::Activate => "activate",
            BookingAction::Complete => "complete",
            BookingAction::Cancel => "cancel",
            BookingAction::Refund => "refund",
            BookingAction::UpdateDates => "update_dates",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "activate" | "active" => Some(BookingAction::Activate),
            "complete" => Some(BookingAction::Complete),
            "cancel" => Some(BookingAction::Cancel),
            "refund" => Some(BookingAction::Refund),
            "update_dates" | "update" => Some(BookingAction::UpdateDates),
            _ => None,
        }
    }
}

/// Actions offered for a booking. Depends on nothing but the two statuses.
pub fn available_actions(status: &BookingStatus, payment: &PaymentStatus) -> Vec<BookingAction> {
    use BookingAction::*;

    match status {
        BookingStatus::Pending | BookingStatus::Confirmed => vec![Activate, Cancel, UpdateDates],
        BookingStatus::Active => vec![Complete, Cancel, UpdateDates],
        BookingStatus::Cancelled if *payment != PaymentStatus::Refunded => vec![Refund],
        BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Other(_) => Vec::new(),
    }
}

pub fn actions_for(booking: &Booking) -> Vec<BookingAction> {
    available_actions(&booking.booking_status, &booking.payment_status)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionRequest {
    Activate,
    Complete,
    Cancel { reason: String },
    Refund,
    UpdateDates {
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    },
}

impl ActionRequest {
    pub fn action(&self) -> BookingAction {
        match self {
            ActionRequest::Activate => BookingAction::Activate,
            ActionRequest::Complete => BookingAction::Complete,
            ActionRequest::Cancel { .. } => BookingAction::Cancel,
            ActionRequest::Refund => BookingAction::Refund,
            ActionRequest::UpdateDates { .. } => BookingAction::UpdateDates,
        }
    }
}

/// Body of `POST /api/bookings/:id/actions`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionForm {
    pub action: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl ActionForm {
    pub fn into_request(self) -> Result<ActionRequest, AppError> {
        let action = BookingAction::parse(&self.action)
            .ok_or_else(|| AppError::Validation(format!("unknown action '{}'", self.action)))?;

        Ok(match action {
            BookingAction::Activate => ActionRequest::Activate,
            BookingAction::Complete => ActionRequest::Complete,
            BookingAction::Refund => ActionRequest::Refund,
            BookingAction::Cancel => ActionRequest::Cancel {
                reason: self.reason.unwrap_or_default(),
            },
            BookingAction::UpdateDates => ActionRequest::UpdateDates {
                start: self.start_date.as_deref().and_then(date::parse_str),
                end: self.end_date.as_deref().and_then(date::parse_str),
            },
        })
    }
}

/// Rejects a request locally. Nothing here touches the network.
pub fn validate(booking: &Booking, request: &ActionRequest) -> Result<(), AppError> {
    let action = request.action();
    if !actions_for(booking).contains(&action) {
        return Err(AppError::Validation(format!(
            "cannot {} a booking that is {}",
            action.as_str().replace('_', " "),
            booking.booking_status.as_str()
        )));
    }

    match request {
        ActionRequest::Cancel { reason } if reason.trim().is_empty() => Err(AppError::Validation(
            "a cancellation reason is required".to_string(),
        )),
        ActionRequest::UpdateDates { start, end } => match (start, end) {
            (Some(start), Some(end)) if end > start => Ok(()),
            (Some(_), Some(_)) => Err(AppError::Validation(
                "end date must be after start date".to_string(),
            )),
            _ => Err(AppError::Validation(
                "both start and end dates are required".to_string(),
            )),
        },
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub booking: Booking,
    pub message: String,
}

/// Validates, then issues exactly one call. The returned booking carries the
/// state the server just accepted; `booking` itself is left alone.
pub async fn execute(
    api: &RentalApi,
    session: &Session,
    booking: &Booking,
    request: ActionRequest,
) -> Result<ActionOutcome, AppError> {
    validate(booking, &request)?;

    let mut updated = booking.clone();
    let id = &booking.id;
    let message = match request {
        ActionRequest::Activate => {
            let message = api.activate_booking(session, id).await?;
            updated.booking_status = BookingStatus::Active;
            message
        }
        ActionRequest::Complete => {
            let message = api.complete_booking(session, id).await?;
            updated.booking_status = BookingStatus::Completed;
            message
        }
        ActionRequest::Cancel { reason } => {
            let reason = reason.trim().to_string();
            let message = api.cancel_booking(session, id, &reason).await?;
            updated.booking_status = BookingStatus::Cancelled;
            updated.cancellation_reason = Some(reason);
            message
        }
        ActionRequest::Refund => {
            let message = api.refund_booking(session, id).await?;
            updated.payment_status = PaymentStatus::Refunded;
            message
        }
        ActionRequest::UpdateDates { start, end } => {
            let (Some(start), Some(end)) = (start, end) else {
                return Err(AppError::Validation(
                    "both start and end dates are required".to_string(),
                ));
            };
            let message = api.update_booking_dates(session, id, &start, &end).await?;
            updated.start_date = Some(start);
            updated.end_date = Some(end);
            message
        }
    };

    tracing::info!(booking_id = %id, status = updated.booking_status.as_str(), "booking action applied");
    Ok(ActionOutcome {
        booking: updated,
        message,
    })
}
