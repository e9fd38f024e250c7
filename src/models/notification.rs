use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::date;
use super::id::{optional_id, EntityId};
use super::value::{as_bool, lenient_string};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "MEDIUM" => Priority::Medium,
            "HIGH" => Priority::High,
            "CRITICAL" => Priority::Critical,
            _ => Priority::Low,
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: EntityId,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub priority: Priority,
    pub read: bool,
    #[serde(serialize_with = "date::serialize_api")]
    pub created_at: Option<NaiveDateTime>,
    pub booking_id: Option<EntityId>,
    pub place_id: Option<EntityId>,
}

impl Notification {
    pub fn status_label(&self) -> &'static str {
        if self.read {
            "READ"
        } else {
            "UNREAD"
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNotification {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, alias = "message")]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_read: Option<Value>,
    #[serde(default, deserialize_with = "date::flexible")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, alias = "relatedBookingId", deserialize_with = "optional_id")]
    pub booking_id: Option<EntityId>,
    #[serde(default, deserialize_with = "optional_id")]
    pub place_id: Option<EntityId>,
}

impl RawNotification {
    pub fn normalize(self) -> Option<Notification> {
        let id = self.id?;
        let read = match self.status.as_deref().map(|s| s.trim().to_uppercase()) {
            Some(s) if s == "READ" => true,
            Some(s) if s == "UNREAD" => false,
            _ => self.is_read.as_ref().and_then(as_bool).unwrap_or(false),
        };

        Some(Notification {
            id,
            title: self.title,
            description: self.description,
            kind: self.kind,
            priority: self
                .priority
                .as_deref()
                .map(Priority::parse)
                .unwrap_or(Priority::Low),
            read,
            created_at: self.created_at,
            booking_id: self.booking_id,
            place_id: self.place_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: Value) -> Notification {
        serde_json::from_value::<RawNotification>(value)
            .unwrap()
            .normalize()
            .unwrap()
    }

    #[test]
    fn test_read_flag_sources() {
        assert!(normalize(json!({"id": 1, "status": "READ"})).read);
        assert!(!normalize(json!({"id": 1, "status": "unread", "isRead": true})).read);
        assert!(normalize(json!({"id": 1, "isRead": true})).read);
        assert!(!normalize(json!({"id": 1})).read);
    }

    #[test]
    fn test_priority_and_created_at() {
        let n = normalize(json!({
            "id": 9,
            "priority": "critical",
            "createdAt": [2024, 4, 2, 10, 0],
            "relatedBookingId": 44
        }));
        assert_eq!(n.priority, Priority::Critical);
        assert_eq!(n.created_at.map(|d| date::format_api(&d)).as_deref(), Some("2024-04-02 10:00"));
        assert_eq!(n.booking_id, Some(EntityId::from("44")));
        assert_eq!(n.status_label(), "UNREAD");
    }
}
