use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::models::{Post, Strategy, TabcoinsUpdate, UserProfile, PAGE_SIZE};

const USER_AGENT: &str = concat!("tabtok/", env!("CARGO_PKG_VERSION"));
const TOO_MANY_REQUESTS: u16 = 429;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("too many requests, try later")]
    RateLimited,
    #[error("network error (status {status:?}): {message}")]
    Network { status: Option<u16>, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("an auth token is required for this action")]
    MissingToken,
}

impl ApiError {
    /// Classifies a non-2xx response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        if status == TOO_MANY_REQUESTS {
            ApiError::RateLimited
        } else {
            ApiError::Network {
                status: Some(status),
                message: message.into(),
            }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RateLimited => Some(TOO_MANY_REQUESTS),
            ApiError::Network { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }
}

/// Backoff between attempts: `min(base * 2^attempt, max)`, attempt starting at 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub bearer_token: Option<String>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            bearer_token: None,
        }
    }
}

/// Sends one request, no retries. Any non-2xx status must come back as an error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<Value, ApiError>;
}

pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| ApiError::Network {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), message));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[derive(Clone)]
pub struct TabNewsClient {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    auth_token: Option<String>,
}

impl TabNewsClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self {
            transport: Arc::new(transport),
            retry: RetryPolicy::default(),
            auth_token: config.auth_token.clone(),
        })
    }

    #[cfg(test)]
    pub fn with_transport(transport: Arc<dyn Transport>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            retry,
            auth_token: None,
        }
    }

    #[cfg(test)]
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    pub fn can_upvote(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Sends a request, retrying network failures with backoff.
    ///
    /// A 429 fails at once. After the retries run out the last error is returned.
    pub async fn request(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let mut attempt = 0;
        loop {
            match self.transport.send(&request).await {
                Ok(value) => return Ok(value),
                Err(ApiError::RateLimited) => {
                    warn!(path = %request.path, "rate limited, not retrying");
                    return Err(ApiError::RateLimited);
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    attempt += 1;
                    if attempt > self.retry.max_retries {
                        warn!(path = %request.path, error = %err, "giving up after {} retries", self.retry.max_retries);
                        return Err(err);
                    }
                    let delay = self.retry.delay_for(attempt);
                    debug!(path = %request.path, error = %err, attempt, ?delay, "retrying request");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: String) -> Result<T, ApiError> {
        let value = self.request(ApiRequest::get(path)).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn fetch_page(&self, page: u32, strategy: Strategy) -> Result<Vec<Post>, ApiError> {
        self.get_json(format!(
            "/contents?page={}&per_page={}&strategy={}",
            page,
            PAGE_SIZE,
            strategy.as_str()
        ))
        .await
    }

    pub async fn fetch_post(&self, username: &str, slug: &str) -> Result<Post, ApiError> {
        self.get_json(format!(
            "/contents/{}/{}",
            urlencoding::encode(username),
            urlencoding::encode(slug)
        ))
        .await
    }

    pub async fn fetch_comments(&self, username: &str, slug: &str) -> Result<Vec<Post>, ApiError> {
        self.get_json(format!(
            "/contents/{}/{}/children",
            urlencoding::encode(username),
            urlencoding::encode(slug)
        ))
        .await
    }

    pub async fn fetch_user(&self, username: &str) -> Result<UserProfile, ApiError> {
        self.get_json(format!("/users/{}", urlencoding::encode(username)))
            .await
    }

    pub async fn upvote(&self, slug: &str) -> Result<TabcoinsUpdate, ApiError> {
        let token = self.auth_token.clone().ok_or(ApiError::MissingToken)?;
        let request = ApiRequest {
            method: Method::POST,
            path: format!("/contents/{}/tabcoins", urlencoding::encode(slug)),
            body: Some(json!({ "transaction_type": "credit" })),
            bearer_token: Some(token),
        };
        let value = self.request(request).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
