//! reqwest-backed [`AvatarGateway`] for the public avatar API.

use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, COOKIE, HeaderMap, HeaderValue},
};
use tracing::debug;

use crate::{
    avatar::AvatarRecord,
    config::GatewayConfig,
    engine::gateway::{AvatarGateway, AvatarStatus, GatewayError},
};

/// Talks to `{base_url}/avatars/{id}` and `{base_url}/avatars/{id}/select`.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(cookie) = &config.auth_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| GatewayError::Network(format!("invalid auth cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.as_str());
        if config.request_timeout_ms > 0 {
            builder = builder.timeout(config.request_timeout());
        }
        let client = builder.build().map_err(map_reqwest_error)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn avatar_url(&self, id: &str) -> String {
        format!("{}/avatars/{}", self.base_url, id)
    }

    async fn fetch(&self, id: &str) -> Result<reqwest::Response, GatewayError> {
        let resp = self
            .client
            .get(self.avatar_url(id))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        debug!(%id, status = resp.status().as_u16(), "avatar fetched");
        Ok(resp)
    }
}

#[async_trait]
impl AvatarGateway for HttpGateway {
    async fn resolve(&self, id: &str) -> Result<AvatarRecord, GatewayError> {
        let resp = self.fetch(id).await?;
        if !resp.status().is_success() {
            return Err(http_error(resp.status()));
        }
        resp.json::<AvatarRecord>().await.map_err(map_reqwest_error)
    }

    async fn status(&self, id: &str) -> Result<AvatarStatus, GatewayError> {
        let resp = self.fetch(id).await?;
        let status = resp.status();
        if is_gone(status) {
            return Ok(AvatarStatus::Unavailable);
        }
        if !status.is_success() {
            return Err(http_error(status));
        }
        let record = resp.json::<AvatarRecord>().await.map_err(map_reqwest_error)?;
        Ok(AvatarStatus::Available(record))
    }

    async fn select(&self, id: &str) -> Result<(), GatewayError> {
        let resp = self
            .client
            .put(format!("{}/select", self.avatar_url(id)))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        if !resp.status().is_success() {
            return Err(http_error(resp.status()));
        }
        Ok(())
    }
}

/// Statuses that confirm the avatar no longer exists for this user.
pub fn is_gone(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND || status == StatusCode::GONE
}

fn http_error(status: StatusCode) -> GatewayError {
    GatewayError::Http {
        status: status.as_u16(),
        reason: status.canonical_reason().map(str::to_string),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else if err.is_decode() {
        GatewayError::Decode(err.to_string())
    } else {
        GatewayError::Network(err.to_string())
    }
}
