use serde::{Deserialize, Serialize};

use super::id::{optional_id, EntityId, IdRef};
use super::value::lenient_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    MasterAdmin,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::MasterAdmin => "MASTER_ADMIN",
            Role::Admin => "ADMIN",
        }
    }

    /// Only dashboard roles parse; customer roles yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_uppercase();
        match s.strip_prefix("ROLE_").unwrap_or(&s) {
            "MASTER_ADMIN" | "MASTERADMIN" => Some(Role::MasterAdmin),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Authenticated operator. Never leaves the process; the UI only sees
/// [`SessionInfo`].
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: Option<EntityId>,
    pub role: Role,
    pub display_name: String,
    pub place_id: Option<EntityId>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: Option<EntityId>,
    pub role: Role,
    pub display_name: String,
    pub place_id: Option<EntityId>,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id.clone(),
            role: session.role,
            display_name: session.display_name.clone(),
            place_id: session.place_id.clone(),
        }
    }
}

/// `CONTENT` of a successful `/auth/login`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLogin {
    #[serde(default, alias = "accessToken", alias = "jwt")]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<EntityId>,
    #[serde(default, deserialize_with = "optional_id")]
    pub user_id: Option<EntityId>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, alias = "fullName", alias = "username", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub place: Option<IdRef>,
    #[serde(default, deserialize_with = "optional_id")]
    pub place_id: Option<EntityId>,
}

impl RawLogin {
    /// `None` when the token is missing or the role cannot use the dashboard.
    pub fn normalize(self) -> Option<Session> {
        let token = self.token.filter(|t| !t.trim().is_empty())?;
        let role = self.role.as_deref().and_then(Role::parse)?;
        let display_name = self
            .name
            .or(self.email)
            .unwrap_or_else(|| role.as_str().to_string());

        Some(Session {
            token,
            user_id: self.user_id.or(self.id),
            role,
            display_name,
            place_id: self.place.and_then(|p| p.id).or(self.place_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("ROLE_MASTER_ADMIN"), Some(Role::MasterAdmin));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("USER"), None);
    }

    #[test]
    fn test_login_normalize() {
        let session = serde_json::from_value::<RawLogin>(json!({
            "token": "abc",
            "userId": 5,
            "role": "ADMIN",
            "name": "Ravi",
            "place": {"id": 7}
        }))
        .unwrap()
        .normalize()
        .unwrap();

        assert_eq!(session.token, "abc");
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.place_id, Some(EntityId::from("7")));
        assert_eq!(session.user_id, Some(EntityId::from("5")));
    }

    #[test]
    fn test_login_without_token_or_role_rejected() {
        let raw: RawLogin = serde_json::from_value(json!({"role": "ADMIN"})).unwrap();
        assert!(raw.normalize().is_none());
        let raw: RawLogin = serde_json::from_value(json!({"token": "t", "role": "CUSTOMER"})).unwrap();
        assert!(raw.normalize().is_none());
    }
}
