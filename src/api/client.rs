use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{ApiRequest, ApiTransport, Envelope};
use crate::errors::AppError;
use crate::forms::{AdminRegistrationForm, BannerForm, BikeForm, CouponForm, LoginForm, PlaceForm};
use crate::models::date::format_api;
use crate::models::{
    Banner, Bike, Booking, Coupon, EntityId, Notification, Place, RawBanner, RawBike, RawBooking,
    RawCoupon, RawLogin, RawNotification, RawPlace, RawUser, Session, User,
};

/// Result of a create or update: the server message and, when the server
/// echoes it back, the stored record.
#[derive(Debug, Clone)]
pub struct Saved<T> {
    pub message: String,
    pub record: Option<T>,
}

/// Typed access to the rental API. Every response is normalized here, so
/// nothing past this point sees the raw field spellings.
pub struct RentalApi {
    transport: Box<dyn ApiTransport>,
}

impl RentalApi {
    pub fn new(transport: Box<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    async fn call(&self, request: ApiRequest) -> Result<Envelope, AppError> {
        tracing::debug!(method = ?request.method, path = %request.path, "calling rental API");
        self.transport.send(request).await
    }

    async fn content(&self, request: ApiRequest) -> Result<(Value, String), AppError> {
        let envelope = self.call(request).await?;
        let message = envelope.message().to_string();
        Ok((envelope.into_content()?, message))
    }

    async fn message(&self, request: ApiRequest) -> Result<String, AppError> {
        Ok(self.content(request).await?.1)
    }

    async fn list<R, T>(&self, request: ApiRequest, normalize: fn(R) -> Option<T>) -> Result<Vec<T>, AppError>
    where
        R: DeserializeOwned,
    {
        let path = request.path.clone();
        let (content, _) = self.content(request).await?;
        Ok(records(&path, content, normalize))
    }

    async fn save<R, T>(&self, request: ApiRequest, normalize: fn(R) -> Option<T>) -> Result<Saved<T>, AppError>
    where
        R: DeserializeOwned,
    {
        let (content, message) = self.content(request).await?;
        Ok(Saved {
            message,
            record: record(content, normalize),
        })
    }

    // ── Auth ──

    pub async fn login(&self, form: &LoginForm) -> Result<Session, AppError> {
        let (content, _) = self
            .content(ApiRequest::post("/auth/login").json(json!(form)))
            .await?;
        record(content, RawLogin::normalize).ok_or_else(|| {
            AppError::Domain("this account cannot access the admin dashboard".to_string())
        })
    }

    pub async fn register_admin(
        &self,
        session: &Session,
        form: &AdminRegistrationForm,
    ) -> Result<String, AppError> {
        self.message(
            ApiRequest::post("/auth/admin/register")
                .query("placeId", &form.place_id)
                .json(json!(form))
                .bearer(&session.token),
        )
        .await
    }

    // ── Bikes ──

    pub async fn list_bikes(&self, session: &Session) -> Result<Vec<Bike>, AppError> {
        self.list(
            ApiRequest::get("/bikes/all").bearer(&session.token),
            RawBike::normalize,
        )
        .await
    }

    pub async fn create_bike(
        &self,
        session: &Session,
        place_id: &EntityId,
        form: &BikeForm,
    ) -> Result<Saved<Bike>, AppError> {
        self.save(
            ApiRequest::post("/bikes/create")
                .query("placeId", place_id)
                .json(json!(form))
                .bearer(&session.token),
            RawBike::normalize,
        )
        .await
    }

    pub async fn update_bike(
        &self,
        session: &Session,
        id: &EntityId,
        place_id: &EntityId,
        form: &BikeForm,
    ) -> Result<Saved<Bike>, AppError> {
        self.save(
            ApiRequest::put(format!("/bikes/update/{id}"))
                .query("placeId", place_id)
                .json(json!(form))
                .bearer(&session.token),
            RawBike::normalize,
        )
        .await
    }

    pub async fn delete_bike(&self, session: &Session, id: &EntityId) -> Result<String, AppError> {
        self.message(ApiRequest::delete(format!("/bikes/delete/{id}")).bearer(&session.token))
            .await
    }

    // ── Bookings ──

    /// Place-scoped admins read their place's bookings; master admins read all.
    pub async fn list_bookings(&self, session: &Session) -> Result<Vec<Booking>, AppError> {
        let path = match session.place_scope() {
            Some(place) => format!("/bookings/place/{place}"),
            None => "/bookings/all".to_string(),
        };
        self.list(
            ApiRequest::get(path).bearer(&session.token),
            RawBooking::normalize,
        )
        .await
    }

    pub async fn activate_booking(&self, session: &Session, id: &EntityId) -> Result<String, AppError> {
        self.message(ApiRequest::put(format!("/bookings/{id}/active")).bearer(&session.token))
            .await
    }

    pub async fn complete_booking(&self, session: &Session, id: &EntityId) -> Result<String, AppError> {
        self.message(ApiRequest::put(format!("/bookings/{id}/complete")).bearer(&session.token))
            .await
    }

    pub async fn cancel_booking(
        &self,
        session: &Session,
        id: &EntityId,
        reason: &str,
    ) -> Result<String, AppError> {
        self.message(
            ApiRequest::put(format!("/bookings/{id}/cancel"))
                .json(json!({ "reason": reason }))
                .bearer(&session.token),
        )
        .await
    }

    pub async fn refund_booking(&self, session: &Session, id: &EntityId) -> Result<String, AppError> {
        self.message(ApiRequest::post(format!("/bookings/{id}/refund")).bearer(&session.token))
            .await
    }

    pub async fn update_booking_dates(
        &self,
        session: &Session,
        id: &EntityId,
        start: &NaiveDateTime,
        end: &NaiveDateTime,
    ) -> Result<String, AppError> {
        self.message(
            ApiRequest::put(format!("/bookings/{id}"))
                .json(json!({
                    "startDate": format_api(start),
                    "endDate": format_api(end),
                }))
                .bearer(&session.token),
        )
        .await
    }

    // ── Places ──

    pub async fn list_places(&self, session: &Session) -> Result<Vec<Place>, AppError> {
        self.list(
            ApiRequest::get("/places/all").bearer(&session.token),
            RawPlace::normalize,
        )
        .await
    }

    pub async fn create_place(&self, session: &Session, form: &PlaceForm) -> Result<Saved<Place>, AppError> {
        self.save(
            ApiRequest::post("/places/create")
                .json(json!(form))
                .bearer(&session.token),
            RawPlace::normalize,
        )
        .await
    }

    pub async fn update_place(
        &self,
        session: &Session,
        id: &EntityId,
        form: &PlaceForm,
    ) -> Result<Saved<Place>, AppError> {
        self.save(
            ApiRequest::put(format!("/places/update/{id}"))
                .json(json!(form))
                .bearer(&session.token),
            RawPlace::normalize,
        )
        .await
    }

    pub async fn delete_place(&self, session: &Session, id: &EntityId) -> Result<String, AppError> {
        self.message(ApiRequest::delete(format!("/places/delete/{id}")).bearer(&session.token))
            .await
    }

    // ── Notifications ──

    pub async fn list_notifications(
        &self,
        session: &Session,
        place_id: &EntityId,
    ) -> Result<Vec<Notification>, AppError> {
        self.list(
            ApiRequest::get(format!("/notifications/place/{place_id}")).bearer(&session.token),
            RawNotification::normalize,
        )
        .await
    }

    pub async fn set_notification_read(
        &self,
        session: &Session,
        id: &EntityId,
        is_read: bool,
    ) -> Result<String, AppError> {
        self.message(
            ApiRequest::put(format!("/notifications/status/{id}"))
                .query("isRead", is_read)
                .bearer(&session.token),
        )
        .await
    }

    // ── Coupons ──

    pub async fn list_coupons(&self, session: &Session) -> Result<Vec<Coupon>, AppError> {
        self.list(
            ApiRequest::get("/coupons/all").bearer(&session.token),
            RawCoupon::normalize,
        )
        .await
    }

    pub async fn create_coupon(&self, session: &Session, form: &CouponForm) -> Result<Saved<Coupon>, AppError> {
        self.save(
            ApiRequest::post("/coupons/create")
                .json(json!(form))
                .bearer(&session.token),
            RawCoupon::normalize,
        )
        .await
    }

    pub async fn update_coupon(
        &self,
        session: &Session,
        id: &EntityId,
        form: &CouponForm,
    ) -> Result<Saved<Coupon>, AppError> {
        self.save(
            ApiRequest::put(format!("/coupons/update/{id}"))
                .json(json!(form))
                .bearer(&session.token),
            RawCoupon::normalize,
        )
        .await
    }

    pub async fn delete_coupon(&self, session: &Session, id: &EntityId) -> Result<String, AppError> {
        self.message(ApiRequest::delete(format!("/coupons/delete/{id}")).bearer(&session.token))
            .await
    }

    pub async fn set_coupon_status(
        &self,
        session: &Session,
        id: &EntityId,
        active: bool,
    ) -> Result<String, AppError> {
        self.message(
            ApiRequest::put("/coupons/status")
                .query("id", id)
                .query("status", active)
                .bearer(&session.token),
        )
        .await
    }

    // ── Banners ──

    pub async fn list_banners(&self, session: &Session) -> Result<Vec<Banner>, AppError> {
        self.list(
            ApiRequest::get("/banners/all").bearer(&session.token),
            RawBanner::normalize,
        )
        .await
    }

    pub async fn create_banner(&self, session: &Session, form: &BannerForm) -> Result<Saved<Banner>, AppError> {
        self.save(
            ApiRequest::post("/banners/create")
                .json(json!(form))
                .bearer(&session.token),
            RawBanner::normalize,
        )
        .await
    }

    pub async fn update_banner(
        &self,
        session: &Session,
        id: &EntityId,
        form: &BannerForm,
    ) -> Result<Saved<Banner>, AppError> {
        self.save(
            ApiRequest::put(format!("/banners/update/{id}"))
                .json(json!(form))
                .bearer(&session.token),
            RawBanner::normalize,
        )
        .await
    }

    pub async fn delete_banner(&self, session: &Session, id: &EntityId) -> Result<String, AppError> {
        self.message(ApiRequest::delete(format!("/banners/delete/{id}")).bearer(&session.token))
            .await
    }

    // ── Users and admins ──

    pub async fn list_users(&self, session: &Session) -> Result<Vec<User>, AppError> {
        self.list(
            ApiRequest::get("/users/all").bearer(&session.token),
            RawUser::normalize,
        )
        .await
    }

    pub async fn list_admins(&self, session: &Session) -> Result<Vec<User>, AppError> {
        self.list(
            ApiRequest::get("/admins/all").bearer(&session.token),
            RawUser::normalize,
        )
        .await
    }

    // ── Uploads ──

    /// Sends the bytes untouched, base64-encoded. Returns the stored file URL.
    pub async fn upload(
        &self,
        session: &Session,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, AppError> {
        let (content, message) = self
            .content(
                ApiRequest::post("/upload")
                    .json(json!({
                        "fileName": file_name,
                        "contentType": content_type,
                        "file": STANDARD.encode(bytes),
                    }))
                    .bearer(&session.token),
            )
            .await?;

        let url = match &content {
            Value::String(url) => Some(url.clone()),
            Value::Object(map) => ["url", "fileUrl", "imageUrl"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
                .map(str::to_string),
            _ => None,
        };
        url.ok_or_else(|| {
            tracing::warn!(%message, "upload response carried no file URL");
            AppError::Domain("upload did not return a file URL".to_string())
        })
    }
}

/// Accepts a bare array or the usual paging wrappers around one. Records
/// that fail to deserialize or normalize are logged and skipped.
fn records<R, T>(path: &str, content: Value, normalize: fn(R) -> Option<T>) -> Vec<T>
where
    R: DeserializeOwned,
{
    let items = match content {
        Value::Array(items) => items,
        Value::Object(mut map) => ["content", "data", "items", "records"]
            .iter()
            .find_map(|k| match map.remove(*k) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let total = items.len();
    let out: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<R>(item) {
            Ok(raw) => normalize(raw),
            Err(e) => {
                tracing::warn!(error = %e, %path, "skipping malformed record");
                None
            }
        })
        .collect();

    if out.len() < total {
        tracing::warn!(%path, skipped = total - out.len(), "some records were dropped during normalization");
    }
    out
}

fn record<R, T>(content: Value, normalize: fn(R) -> Option<T>) -> Option<T>
where
    R: DeserializeOwned,
{
    if !content.is_object() {
        return None;
    }
    serde_json::from_value::<R>(content).ok().and_then(normalize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_accepts_bare_and_wrapped_arrays() {
        let bare = records("/bikes/all", json!([{"id": 1}, {"id": 2}]), RawBike::normalize);
        assert_eq!(bare.len(), 2);

        let wrapped = records(
            "/bikes/all",
            json!({"content": [{"id": 1}], "totalElements": 1}),
            RawBike::normalize,
        );
        assert_eq!(wrapped.len(), 1);

        let nothing = records("/bikes/all", json!(null), RawBike::normalize);
        assert!(nothing.is_empty());
    }

    #[test]
    fn test_records_skips_bad_entries() {
        let out = records(
            "/bikes/all",
            json!([{"id": 1}, {"name": "no id"}, "garbage", {"id": 3, "place": 5}]),
            RawBike::normalize,
        );
        let ids: Vec<String> = out.iter().map(|b| b.id.to_string()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn test_record_requires_object() {
        assert!(record(json!("created"), RawBike::normalize).is_none());
        assert!(record(json!({"id": 4}), RawBike::normalize).is_some());
    }
}
