use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::date;
use super::id::{optional_id, EntityId};
use super::value::{lenient_bool, lenient_f64};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: EntityId,
    pub code: String,
    pub description: Option<String>,
    pub discount: f64,
    pub discount_type: Option<String>,
    pub min_amount: f64,
    #[serde(serialize_with = "date::serialize_api")]
    pub expiry_date: Option<NaiveDateTime>,
    pub active: bool,
}

impl Coupon {
    pub fn same_code(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCoupon {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<EntityId>,
    #[serde(default, alias = "couponCode")]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "discountValue", deserialize_with = "lenient_f64")]
    pub discount: Option<f64>,
    #[serde(default)]
    pub discount_type: Option<String>,
    #[serde(default, alias = "minimumAmount", deserialize_with = "lenient_f64")]
    pub min_amount: Option<f64>,
    #[serde(default, alias = "validUntil", deserialize_with = "date::flexible")]
    pub expiry_date: Option<NaiveDateTime>,
    #[serde(default, alias = "status", alias = "isActive", deserialize_with = "lenient_bool")]
    pub active: Option<bool>,
}

impl RawCoupon {
    pub fn normalize(self) -> Option<Coupon> {
        Some(Coupon {
            id: self.id?,
            code: self.code.unwrap_or_default(),
            description: self.description,
            discount: self.discount.unwrap_or(0.0),
            discount_type: self.discount_type,
            min_amount: self.min_amount.unwrap_or(0.0),
            expiry_date: self.expiry_date,
            active: self.active.unwrap_or(true),
        })
    }
}
