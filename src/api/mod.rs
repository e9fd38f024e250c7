pub mod client;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::errors::AppError;

pub use client::{RentalApi, Saved};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// One call to the rental API, independent of the HTTP client doing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub token: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            token: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

/// `{ STS, MSG, CONTENT }` wrapper around every API response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "STS", deserialize_with = "status_text")]
    pub status: String,
    #[serde(rename = "MSG", default)]
    pub message: Option<String>,
    #[serde(rename = "CONTENT", default)]
    pub content: Value,
}

fn status_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

impl Envelope {
    pub fn ok(content: Value, message: &str) -> Self {
        Self {
            status: "200".to_string(),
            message: Some(message.to_string()),
            content,
        }
    }

    pub fn failed(status: &str, message: &str) -> Self {
        Self {
            status: status.to_string(),
            message: Some(message.to_string()),
            content: Value::Null,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "200"
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }

    /// Payload of a successful envelope; any other status is a domain error
    /// carrying the server's message.
    pub fn into_content(self) -> Result<Value, AppError> {
        if !self.is_ok() {
            let message = match self.message.filter(|m| !m.trim().is_empty()) {
                Some(m) => m,
                None => format!("request rejected (status {})", self.status),
            };
            return Err(AppError::Domain(message));
        }
        Ok(self.content)
    }
}

#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Envelope, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_status_as_string_or_number() {
        let env: Envelope = serde_json::from_value(json!({"STS": 200, "MSG": "ok", "CONTENT": []})).unwrap();
        assert!(env.is_ok());
        let env: Envelope = serde_json::from_value(json!({"STS": "200"})).unwrap();
        assert!(env.is_ok());
        assert_eq!(env.content, Value::Null);
    }

    #[test]
    fn test_non_200_envelope_is_domain_error() {
        let env: Envelope = serde_json::from_value(json!({"STS": "400", "MSG": "Coupon already exists"})).unwrap();
        match env.into_content() {
            Err(AppError::Domain(msg)) => assert_eq!(msg, "Coupon already exists"),
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[test]
    fn test_domain_error_without_message() {
        let env = Envelope::failed("500", "");
        match env.into_content() {
            Err(AppError::Domain(msg)) => assert!(msg.contains("500")),
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[test]
    fn test_request_builder() {
        let req = ApiRequest::put("/coupons/status")
            .query("id", 4)
            .query("status", true)
            .bearer("tok");
        assert_eq!(req.method, Method::Put);
        assert_eq!(
            req.query,
            vec![
                ("id".to_string(), "4".to_string()),
                ("status".to_string(), "true".to_string())
            ]
        );
        assert_eq!(req.token.as_deref(), Some("tok"));
    }
}
