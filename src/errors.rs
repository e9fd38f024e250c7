use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Shown instead of transport details, which only go to the log.
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "Could not reach the rental service. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Rejected locally before any network call.
    #[error("{0}")]
    Validation(String),

    /// The remote answered 2xx but its envelope status was not "200".
    #[error("{0}")]
    Domain(String),

    /// Network failure or non-2xx HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Domain(_) => "domain",
            AppError::Transport(_) => "transport",
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Transport(_) => TRANSPORT_FAILURE_MESSAGE.to_string(),
            AppError::Unauthenticated => "session expired, please log in again".to_string(),
            AppError::Validation(msg) | AppError::Domain(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Domain(_) => StatusCode::CONFLICT,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        if let AppError::Transport(_) = &self {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "error": self.public_message(),
            "kind": self.kind(),
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{field}: {msg}")
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::Domain("x".into()), StatusCode::CONFLICT),
            (AppError::Transport("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_transport_details_stay_private() {
        let error = AppError::Transport("connection refused to 10.0.0.1".into());
        assert_eq!(error.kind(), "transport");
        assert_eq!(error.public_message(), TRANSPORT_FAILURE_MESSAGE);
    }
}
