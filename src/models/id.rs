use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a remote record.
///
/// The rental API is inconsistent about whether ids are JSON strings or
/// numbers, so both deserialize to the same canonical text and `7 == "7"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Coerces a loose JSON value into an id. Blank strings and non-scalar
    /// values yield `None`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(EntityId::new(s.as_str())),
            serde_json::Value::Number(n) => Some(match n.as_i64() {
                Some(i) => EntityId(i.to_string()),
                None => EntityId(number_text(n.as_f64().unwrap_or_default())),
            }),
            _ => None,
        }
        .filter(|id| !id.is_empty())
    }
}

fn number_text(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::new(s)
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId(n.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => EntityId::new(s),
            Raw::Int(i) => EntityId(i.to_string()),
            Raw::Float(f) => EntityId(number_text(f)),
        })
    }
}

/// Deserializes an optional id, treating blanks as absent.
pub fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<EntityId>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(EntityId::from_value))
}

/// `{ "id": ... }` reference to another record, as nested by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdRef {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<EntityId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_and_string_ids_compare_equal() {
        let a: EntityId = serde_json::from_value(json!(7)).unwrap();
        let b: EntityId = serde_json::from_value(json!("7")).unwrap();
        let c: EntityId = serde_json::from_value(json!(7.0)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.as_str(), "7");
    }

    #[test]
    fn test_from_value_rejects_blank_and_objects() {
        assert_eq!(EntityId::from_value(&json!("  ")), None);
        assert_eq!(EntityId::from_value(&json!(null)), None);
        assert_eq!(EntityId::from_value(&json!({"id": 1})), None);
        assert_eq!(EntityId::from_value(&json!(" 42 ")), Some(EntityId::from("42")));
    }
}
