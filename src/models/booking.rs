use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::date;
use super::id::{optional_id, EntityId, IdRef};
use super::value::{lenient_f64, lenient_i64, lenient_string};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
    Other(String),
}

impl BookingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Active => "ACTIVE",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => BookingStatus::Pending,
            "CONFIRMED" => BookingStatus::Confirmed,
            "ACTIVE" => BookingStatus::Active,
            "COMPLETED" => BookingStatus::Completed,
            "CANCELLED" | "CANCELED" => BookingStatus::Cancelled,
            other => BookingStatus::Other(other.to_string()),
        }
    }
}

impl Serialize for BookingStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Unpaid,
    Other(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => PaymentStatus::Pending,
            "PAID" => PaymentStatus::Paid,
            "REFUNDED" => PaymentStatus::Refunded,
            "UNPAID" => PaymentStatus::Unpaid,
            other => PaymentStatus::Other(other.to_string()),
        }
    }
}

impl Serialize for PaymentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: EntityId,
    pub user_id: Option<EntityId>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub bike_id: Option<EntityId>,
    pub bike_name: Option<String>,
    pub bike_model: Option<String>,
    pub place_id: Option<EntityId>,
    #[serde(serialize_with = "date::serialize_api")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(serialize_with = "date::serialize_api")]
    pub end_date: Option<NaiveDateTime>,
    pub total_days: Option<i64>,
    pub total_hours: Option<i64>,
    pub total_amount: f64,
    pub payment_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
    #[serde(serialize_with = "date::serialize_api")]
    pub created_at: Option<NaiveDateTime>,
    /// Date the booking is attributed to on charts.
    #[serde(serialize_with = "date::serialize_api")]
    pub activity_date: Option<NaiveDateTime>,
    pub cancellation_reason: Option<String>,
    pub invoice_url: Option<String>,
    pub document_url: Option<String>,
}

impl Booking {
    pub fn is_cancelled(&self) -> bool {
        self.booking_status == BookingStatus::Cancelled
    }

    /// Newest-first listings order by creation, falling back to the activity date.
    pub fn sort_date(&self) -> Option<NaiveDateTime> {
        self.created_at.or(self.activity_date)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBookingUser {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<EntityId>,
    #[serde(default, alias = "fullName", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBookingBike {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub model: Option<String>,
    #[serde(default)]
    pub place: Option<IdRef>,
    #[serde(default, deserialize_with = "optional_id")]
    pub place_id: Option<EntityId>,
}

/// Booking as it arrives from the API. Alternative spellings of the same
/// field are kept apart so records carrying both still deserialize.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBooking {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub user: Option<RawBookingUser>,
    #[serde(default, deserialize_with = "optional_id")]
    pub user_id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub bike: Option<RawBookingBike>,
    #[serde(default, deserialize_with = "optional_id")]
    pub bike_id: Option<EntityId>,
    #[serde(default, rename = "bike_id", deserialize_with = "optional_id")]
    pub bike_id_snake: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bike_name: Option<String>,
    #[serde(default)]
    pub place: Option<IdRef>,
    #[serde(default, deserialize_with = "optional_id")]
    pub place_id: Option<EntityId>,
    #[serde(default, rename = "place_id", deserialize_with = "optional_id")]
    pub place_id_snake: Option<EntityId>,
    #[serde(default)]
    pub start_date: Option<Value>,
    #[serde(default)]
    pub end_date: Option<Value>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_days: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_hours: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub booking_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub booking_date: Option<Value>,
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default, alias = "cancelReason")]
    pub cancellation_reason: Option<String>,
    #[serde(default, alias = "invoice")]
    pub invoice_url: Option<String>,
    #[serde(default, alias = "documentsUrl")]
    pub document_url: Option<String>,
}

impl RawBooking {
    pub fn normalize(self) -> Option<Booking> {
        let id = self.id?;
        let user = self.user.unwrap_or_default();
        let bike = self.bike.unwrap_or_default();

        // The first date field that is present decides; if it does not
        // parse the booking has no chart date.
        let activity_date = [
            &self.booking_date,
            &self.created_at,
            &self.date,
            &self.start_date,
        ]
        .into_iter()
        .flatten()
        .find(|v| date::is_present(v))
        .and_then(date::parse_flexible);

        let parse = |v: &Option<Value>| v.as_ref().and_then(date::parse_flexible);

        Some(Booking {
            id,
            user_id: user.id.or(self.user_id),
            customer_name: user.name.or(self.customer_name),
            customer_email: user.email.or(self.customer_email),
            bike_id: bike.id.or(self.bike_id).or(self.bike_id_snake),
            bike_name: bike.name.or(self.bike_name),
            bike_model: bike.model,
            place_id: self
                .place
                .and_then(|p| p.id)
                .or(self.place_id)
                .or(self.place_id_snake)
                .or_else(|| bike.place.and_then(|p| p.id))
                .or(bike.place_id),
            start_date: parse(&self.start_date),
            end_date: parse(&self.end_date),
            total_days: self.total_days,
            total_hours: self.total_hours,
            total_amount: self
                .total_amount
                .or(self.amount)
                .filter(|a| *a >= 0.0)
                .unwrap_or(0.0),
            payment_id: self.payment_id.filter(|p| !p.trim().is_empty()),
            payment_status: self
                .payment_status
                .as_deref()
                .map(PaymentStatus::parse)
                .unwrap_or(PaymentStatus::Pending),
            booking_status: self
                .booking_status
                .or(self.status)
                .as_deref()
                .map(BookingStatus::parse)
                .unwrap_or(BookingStatus::Pending),
            created_at: parse(&self.created_at),
            activity_date,
            cancellation_reason: self.cancellation_reason.filter(|r| !r.trim().is_empty()),
            invoice_url: self.invoice_url,
            document_url: self.document_url,
        })
    }
}
