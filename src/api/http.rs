use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;

use super::{ApiRequest, ApiTransport, Envelope, Method};
use crate::errors::AppError;

pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Envelope, AppError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, path = %request.path, "rental API unreachable");
            AppError::Transport(e.to_string())
        })?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path = %request.path, "rental API rejected the session token");
            return Err(AppError::Unauthenticated);
        }
        if !status.is_success() {
            tracing::error!(%status, path = %request.path, "rental API returned an error status");
            return Err(AppError::Transport(format!("{} returned {status}", request.path)));
        }

        resp.json::<Envelope>().await.map_err(|e| {
            tracing::error!(error = %e, path = %request.path, "failed to parse rental API envelope");
            AppError::Transport(format!("invalid response envelope: {e}"))
        })
    }
}
