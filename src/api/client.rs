use futures::StreamExt;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::types::{Character, CharacterBatch, CharacterQuery, CharactersPage};

/// Public instance of the character API.
pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_RESPONSE_SIZE: usize = 2 * 1024 * 1024; // 2MB

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-success status. The message is the only thing the UI shows.
    #[error("Failed to fetch {resource} (HTTP {status})")]
    HttpStatus { resource: &'static str, status: u16 },
    #[error("Failed to parse {resource}: {source}")]
    Parse {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
}

impl ApiError {
    /// Whether re-issuing the same request could succeed.
    ///
    /// Base-URL problems are configuration errors and fail the same way
    /// every time; everything the server or network reports is worth one
    /// more attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ApiError::InvalidBaseUrl(_) | ApiError::InsecureBaseUrl
        )
    }
}

/// Follow at most 3 redirects and stop on loops.
fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }
        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev == url) {
            return attempt.error("Redirect loop detected");
        }
        tracing::debug!(to = %url, hop = attempt.previous().len() + 1, "Following redirect");
        attempt.follow()
    })
}

/// Shared connection pool for every API client in the process.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ApiError> {
    let client = reqwest::Client::builder()
        .redirect(redirect_policy())
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// HTTP client for the character endpoints.
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client rooted at `base_url` (e.g. `https://rickandmortyapi.com/api`).
    ///
    /// Plain HTTP is only accepted for `localhost` and `127.0.0.1`.
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let parsed =
            Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        match parsed.scheme() {
            "https" => {}
            "http" => {
                let is_localhost = matches!(parsed.host_str(), Some("localhost" | "127.0.0.1"));
                if !is_localhost {
                    tracing::error!(base_url = %base_url, "Rejecting non-HTTPS API base URL");
                    return Err(ApiError::InsecureBaseUrl);
                }
                tracing::warn!(base_url = %base_url, "Using non-HTTPS API base URL (localhost only)");
            }
            other => {
                return Err(ApiError::InvalidBaseUrl(format!(
                    "unsupported scheme: {other}"
                )))
            }
        }

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn character_url(&self, suffix: &str) -> Result<Url, ApiError> {
        let raw = if suffix.is_empty() {
            format!("{}/character", self.base_url)
        } else {
            format!("{}/character/{}", self.base_url, suffix)
        };
        Url::parse(&raw).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))
    }

    /// `GET /character?page=..&name=..` with only the non-empty filters.
    pub async fn list_characters(&self, query: &CharacterQuery) -> Result<CharactersPage, ApiError> {
        let mut url = self.character_url("")?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        self.get_json(url, "characters").await
    }

    /// `GET /character/{id}`
    pub async fn get_character(&self, id: i64) -> Result<Character, ApiError> {
        let url = self.character_url(&id.to_string())?;
        self.get_json(url, "character").await
    }

    /// `GET /character/{id1,id2,...}` in one request.
    ///
    /// An empty slice returns an empty list without touching the network.
    pub async fn get_characters_by_ids(&self, ids: &[i64]) -> Result<Vec<Character>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let url = self.character_url(&joined)?;
        let batch: CharacterBatch = self.get_json(url, "characters").await?;
        Ok(batch.into_vec())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        resource: &'static str,
    ) -> Result<T, ApiError> {
        tracing::debug!(url = %url, resource, "GET");

        let response = tokio::time::timeout(self.timeout, self.http.get(url.clone()).send())
            .await
            .map_err(|_| ApiError::Timeout(self.timeout.as_secs()))?
            .map_err(ApiError::Network)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url, status = status.as_u16(), "Request failed");
            return Err(ApiError::HttpStatus {
                resource,
                status: status.as_u16(),
            });
        }

        let body = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Parse { resource, source })
    }
}

/// Read the response body, bailing out once it exceeds `limit` bytes.
async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
