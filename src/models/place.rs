use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::{optional_id, EntityId};
use super::value::{as_bool, lenient_string};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: EntityId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlace {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<EntityId>,
    #[serde(default, alias = "placeName", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "imageUrl")]
    pub image: Option<String>,
    #[serde(default, alias = "address", deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default)]
    pub enabled: Option<Value>,
    #[serde(default)]
    pub is_enabled: Option<Value>,
    #[serde(default)]
    pub is_active: Option<Value>,
    #[serde(default)]
    pub active: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
}

impl RawPlace {
    pub fn normalize(self) -> Option<Place> {
        let id = self.id?;
        // All of these spellings occur; the first that reads as a boolean wins.
        let enabled = [
            &self.enabled,
            &self.is_enabled,
            &self.is_active,
            &self.active,
            &self.status,
        ]
        .into_iter()
        .flatten()
        .find_map(as_bool)
        .unwrap_or(true);

        Some(Place {
            id,
            name: self.name,
            description: self.description,
            image: self.image,
            location: self.location,
            enabled,
        })
    }
}
