//! Inbound form payloads. Each is validated locally and rejected with
//! `AppError::Validation` before anything is sent to the rental API.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::errors::AppError;
use crate::models::EntityId;

pub fn check<T: Validate>(form: &T) -> Result<(), AppError> {
    form.validate().map_err(AppError::from)
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let phone = phone.trim();
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let only_allowed = digits
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-');
    let count = digits.chars().filter(|c| c.is_ascii_digit()).count();

    if !only_allowed || !(10..=15).contains(&count) {
        let mut err = ValidationError::new("phone");
        err.message = Some("must be 10 to 15 digits".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BikeForm {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub price_per_day: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub price_per_week: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub price_per_month: f64,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Only honoured for master admins; sent as a query parameter.
    #[serde(default, skip_serializing)]
    pub place_id: Option<EntityId>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceForm {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CouponForm {
    #[validate(length(min = 3, max = 32, message = "code must be 3 to 32 characters"))]
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub discount: f64,
    #[serde(default)]
    pub discount_type: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub min_amount: f64,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub active: bool,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BannerForm {
    #[serde(default)]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "image is required"))]
    pub image_url: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub active: bool,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminRegistrationForm {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6 to 128 characters"))]
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm_password: String,
    #[serde(skip_serializing)]
    pub place_id: EntityId,
}

impl AdminRegistrationForm {
    pub fn check(&self) -> Result<(), AppError> {
        check(self)?;
        if self.password != self.confirm_password {
            return Err(AppError::Validation("passwords do not match".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadForm {
    pub is_read: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn admin_form(value: serde_json::Value) -> AdminRegistrationForm {
        serde_json::from_value(value).unwrap()
    }

    fn valid_admin() -> serde_json::Value {
        json!({
            "name": "Kiran",
            "email": "kiran@example.com",
            "phone": "+91 98765-43210",
            "password": "secret1",
            "confirmPassword": "secret1",
            "placeId": 7
        })
    }

    #[test]
    fn test_valid_admin_registration() {
        assert!(admin_form(valid_admin()).check().is_ok());
    }

    #[test]
    fn test_password_mismatch() {
        let mut value = valid_admin();
        value["confirmPassword"] = json!("secret2");
        match admin_form(value).check() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "passwords do not match"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_email_and_phone() {
        let mut value = valid_admin();
        value["email"] = json!("not-an-email");
        value["phone"] = json!("12ab");
        match admin_form(value).check() {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains("email: invalid email format"));
                assert!(msg.contains("phone: must be 10 to 15 digits"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_registration_body_omits_local_fields() {
        let body = serde_json::to_value(admin_form(valid_admin())).unwrap();
        assert!(body.get("confirmPassword").is_none());
        assert!(body.get("placeId").is_none());
        assert_eq!(body["email"], "kiran@example.com");
    }

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+1 555 123 4567").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("98765x43210").is_err());
    }

    #[test]
    fn test_negative_bike_price_rejected() {
        let form: BikeForm = serde_json::from_value(json!({"name": "Duke", "pricePerDay": -1.0})).unwrap();
        assert!(matches!(check(&form), Err(AppError::Validation(_))));
        let form: BikeForm = serde_json::from_value(json!({"name": "Duke", "pricePerDay": 900})).unwrap();
        assert!(check(&form).is_ok());
    }

    #[test]
    fn test_short_coupon_code_rejected() {
        let form: CouponForm = serde_json::from_value(json!({"code": "AB", "discount": 5})).unwrap();
        assert!(matches!(check(&form), Err(AppError::Validation(_))));
    }
}
