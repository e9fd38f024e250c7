use serde::{Deserialize, Serialize, Serializer};

use super::id::{optional_id, EntityId, IdRef};
use super::value::{lenient_f64, lenient_i64, lenient_string};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BikeStatus {
    Available,
    Rented,
    Maintenance,
    Unavailable,
    Other(String),
}

impl Serialize for BikeStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl BikeStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BikeStatus::Available => "AVAILABLE",
            BikeStatus::Rented => "RENTED",
            BikeStatus::Maintenance => "MAINTENANCE",
            BikeStatus::Unavailable => "UNAVAILABLE",
            BikeStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "AVAILABLE" => BikeStatus::Available,
            "RENTED" => BikeStatus::Rented,
            "MAINTENANCE" => BikeStatus::Maintenance,
            "UNAVAILABLE" => BikeStatus::Unavailable,
            other => BikeStatus::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bike {
    pub id: EntityId,
    pub name: Option<String>,
    pub model: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub registration_number: Option<String>,
    pub price_per_day: f64,
    pub price_per_week: f64,
    pub price_per_month: f64,
    pub quantity: u32,
    pub status: BikeStatus,
    pub place_id: Option<EntityId>,
    pub image_url: Option<String>,
}

/// Bike as it arrives from the API, before field aliases are collapsed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBike {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub model: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "fuel_type")]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(
        default,
        alias = "registration",
        alias = "registrationNo",
        deserialize_with = "lenient_string"
    )]
    pub registration_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_per_day: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_per_week: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_per_month: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub place: Option<IdRef>,
    #[serde(default, deserialize_with = "optional_id")]
    pub place_id: Option<EntityId>,
    #[serde(default, rename = "place_id", deserialize_with = "optional_id")]
    pub place_id_snake: Option<EntityId>,
    #[serde(default, alias = "image", alias = "imageURL")]
    pub image_url: Option<String>,
}

impl RawBike {
    /// Records without an id cannot be addressed and are dropped.
    pub fn normalize(self) -> Option<Bike> {
        let id = self.id?;
        let place_id = self
            .place
            .and_then(|p| p.id)
            .or(self.place_id)
            .or(self.place_id_snake);

        Some(Bike {
            id,
            name: self.name,
            model: self.model,
            brand: self.brand,
            category: self.category,
            fuel_type: self.fuel_type,
            transmission: self.transmission,
            registration_number: self.registration_number,
            price_per_day: non_negative(self.price_per_day),
            price_per_week: non_negative(self.price_per_week),
            price_per_month: non_negative(self.price_per_month),
            quantity: self.quantity.map(|q| q.clamp(0, u32::MAX as i64) as u32).unwrap_or(0),
            status: self
                .status
                .as_deref()
                .map(BikeStatus::parse)
                .unwrap_or(BikeStatus::Available),
            place_id,
            image_url: self.image_url,
        })
    }
}

fn non_negative(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: serde_json::Value) -> Bike {
        serde_json::from_value::<RawBike>(value)
            .unwrap()
            .normalize()
            .unwrap()
    }

    #[test]
    fn test_place_id_aliases_collapse() {
        assert_eq!(
            normalize(json!({"id": 1, "place": {"id": 7}})).place_id,
            Some(EntityId::from("7"))
        );
        assert_eq!(
            normalize(json!({"id": 1, "placeId": "7"})).place_id,
            Some(EntityId::from("7"))
        );
        assert_eq!(
            normalize(json!({"id": 1, "place_id": 7})).place_id,
            Some(EntityId::from("7"))
        );
        assert_eq!(normalize(json!({"id": 1})).place_id, None);
    }

    #[test]
    fn test_nested_place_wins_over_flat_alias() {
        let bike = normalize(json!({"id": 1, "place": {"id": 3}, "placeId": 9}));
        assert_eq!(bike.place_id, Some(EntityId::from("3")));
    }

    #[test]
    fn test_prices_and_quantity_are_non_negative() {
        let bike = normalize(json!({
            "id": 1,
            "pricePerDay": -5.0,
            "pricePerWeek": "300.5",
            "quantity": -2
        }));
        assert_eq!(bike.price_per_day, 0.0);
        assert_eq!(bike.price_per_week, 300.5);
        assert_eq!(bike.price_per_month, 0.0);
        assert_eq!(bike.quantity, 0);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(normalize(json!({"id": 1, "status": "rented"})).status, BikeStatus::Rented);
        assert_eq!(
            normalize(json!({"id": 1, "status": "SERVICING"})).status,
            BikeStatus::Other("SERVICING".to_string())
        );
        assert_eq!(normalize(json!({"id": 1})).status, BikeStatus::Available);
    }

    #[test]
    fn test_missing_id_is_dropped() {
        let raw: RawBike = serde_json::from_value(json!({"name": "Activa"})).unwrap();
        assert!(raw.normalize().is_none());
    }
}
