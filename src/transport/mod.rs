//! Transport abstraction between the orchestrator and the network.
//!
//! The orchestrator never reaches for a global HTTP function; it is always
//! handed a [`Transport`]. [`HttpTransport`] is the production reqwest
//! implementation, test code injects hand-rolled mocks.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::errors::{ClientError, ClientResult};
use crate::requests::scope::CancelScope;

pub const HEADER_RETRY_AFTER: &str = "retry-after";
pub const HEADER_CACHE_CONTROL: &str = "cache-control";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One logical request as the orchestrator sees it. A request with a body is
/// treated as a side-effecting call and throttled; a body-less request is an
/// idempotent read and eligible for deduplication.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Cooperative cancellation for the caller holding this scope. Scope
    /// identity is part of the deduplication key.
    pub scope: Option<CancelScope>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            headers: Vec::new(),
            body: None,
            scope: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            headers: Vec::new(),
            body: Some(body),
            scope: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_scope(mut self, scope: CancelScope) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Plain-data response. Owning the bytes means every deduplicated waiter can
/// receive an independent `Clone` instead of sharing a consumable body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header lookup, case-insensitive on the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ClientError::Parse(format!("failed to parse response body: {}", e)))
    }

    /// Server-advised retry delay from `retry-after`, integer seconds only.
    /// Absent or unparseable values return `None` and the caller falls back
    /// to its default delay.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header(HEADER_RETRY_AFTER)?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }

    /// TTL advertised via `cache-control: max-age=<seconds>`, if any.
    pub fn max_age(&self) -> Option<u64> {
        let cache_control = self.header(HEADER_CACHE_CONTROL)?;
        cache_control
            .split(',')
            .filter_map(|directive| directive.trim().strip_prefix("max-age="))
            .find_map(|secs| secs.trim().parse::<u64>().ok())
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one physical call. Implementations should honor
    /// `request.scope` cooperatively and answer with the raw status; the
    /// orchestrator owns 429 handling.
    async fn fetch(&self, request: &FetchRequest) -> ClientResult<FetchResponse>;
}

/// Production transport over a shared [`reqwest::Client`].
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64) -> ClientResult<Self> {
        if timeout_secs == 0 {
            return Err(ClientError::Config(
                "transport timeout must be greater than zero".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &FetchRequest) -> ClientResult<FetchResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let send = builder.send();
        let result = match &request.scope {
            Some(scope) => {
                tokio::select! {
                    result = send => result,
                    _ = scope.cancelled() => {
                        return Err(ClientError::Cancelled {
                            url: request.url.clone(),
                        });
                    }
                }
            }
            None => send.await,
        };

        let response = result.map_err(|e| ClientError::Network {
            url: request.url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network {
                url: request.url.clone(),
                message: format!("failed to read response body: {}", e),
            })?
            .to_vec();

        Ok(FetchResponse::new(status, headers, body))
    }
}
