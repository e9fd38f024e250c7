use serde::{Deserialize, Serialize};

use super::id::{optional_id, EntityId, IdRef};
use super::value::lenient_string;

/// Customer or admin account as listed by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub place_id: Option<EntityId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<EntityId>,
    #[serde(default, alias = "fullName", alias = "username", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "phoneNumber", alias = "mobile", deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub place: Option<IdRef>,
    #[serde(default, deserialize_with = "optional_id")]
    pub place_id: Option<EntityId>,
}

impl RawUser {
    pub fn normalize(self) -> Option<User> {
        Some(User {
            id: self.id?,
            name: self.name,
            email: self.email,
            phone: self.phone,
            role: self.role,
            place_id: self.place.and_then(|p| p.id).or(self.place_id),
        })
    }
}
