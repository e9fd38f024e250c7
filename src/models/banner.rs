use serde::{Deserialize, Serialize};

use super::id::{optional_id, EntityId};
use super::value::lenient_bool;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: EntityId,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBanner {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "image", alias = "bannerImage")]
    pub image_url: Option<String>,
    #[serde(default, alias = "redirectUrl")]
    pub link: Option<String>,
    #[serde(default, alias = "isActive", alias = "status", deserialize_with = "lenient_bool")]
    pub active: Option<bool>,
}

impl RawBanner {
    pub fn normalize(self) -> Option<Banner> {
        Some(Banner {
            id: self.id?,
            title: self.title,
            image_url: self.image_url,
            link: self.link,
            active: self.active.unwrap_or(true),
        })
    }
}
