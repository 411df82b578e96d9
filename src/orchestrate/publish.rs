// src/orchestrate/publish.rs

//! Component upload to the target platform API.
//!
//! The HTTP client maps response statuses into a transient/permanent error
//! split; the retry wrapper backs off exponentially and only retries the
//! transient side. Publishing is strictly per-component, so one rejected
//! upload never aborts the batch.

use crate::config::PlatformConfig;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::{debug, info, warn};

/// Timeout for platform API requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum upload attempts per component
const MAX_ATTEMPTS: u32 = 3;

/// Base backoff delay; doubled on each retry
const RETRY_DELAY_MS: u64 = 1000;

/// Upload failure, split into retryable and terminal cases
#[derive(Debug, ThisError)]
pub enum PublishError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("rate limited: {0}")]
    RateLimit(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("insufficient permissions: {0}")]
    Permission(String),
    #[error("component rejected: {0}")]
    Rejected(String),
}

impl PublishError {
    /// Timeouts, connection drops, rate limits, and 5xx responses are
    /// worth retrying; everything else will fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PublishError::Timeout(_)
                | PublishError::Connection(_)
                | PublishError::RateLimit(_)
                | PublishError::Server(_)
        )
    }
}

/// Identifier assigned by the platform to an uploaded component
pub type ComponentId = String;

/// Seam for the platform API so orchestration and tests run without a
/// network.
pub trait PlatformClient {
    fn publish(&self, name: &str, xml: &str) -> std::result::Result<ComponentId, PublishError>;
}

/// reqwest-backed platform client
pub struct HttpPlatformClient {
    client: Client,
    config: PlatformConfig,
}

impl HttpPlatformClient {
    pub fn new(config: PlatformConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Publish(format!("create HTTP client: {e}")))?;
        Ok(HttpPlatformClient { client, config })
    }

    fn component_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{}/{}/Component", base, self.config.account_id)
    }
}

impl PlatformClient for HttpPlatformClient {
    fn publish(&self, name: &str, xml: &str) -> std::result::Result<ComponentId, PublishError> {
        let url = self.component_url();
        debug!("Uploading component {} to {}", name, url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.token))
            .header("Content-Type", "application/xml")
            .body(xml.to_string())
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    PublishError::Timeout(e.to_string())
                } else {
                    PublishError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        match status {
            s if s.is_success() => {
                let body = response.text().unwrap_or_default();
                Ok(extract_component_id(&body).unwrap_or_else(|| name.to_string()))
            }
            StatusCode::UNAUTHORIZED => Err(PublishError::Auth(format!("HTTP {status} from {url}"))),
            StatusCode::FORBIDDEN => {
                Err(PublishError::Permission(format!("HTTP {status} from {url}")))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                Err(PublishError::RateLimit(format!("HTTP {status} from {url}")))
            }
            s if s.is_server_error() => {
                Err(PublishError::Server(format!("HTTP {status} from {url}")))
            }
            _ => {
                let body = response.text().unwrap_or_default();
                Err(PublishError::Rejected(format!("HTTP {status}: {body}")))
            }
        }
    }
}

/// Pull the componentId attribute out of the platform's response envelope.
fn extract_component_id(body: &str) -> Option<String> {
    let pos = body.find("componentId=\"")?;
    let after = &body[pos + 13..];
    let end = after.find('"')?;
    Some(after[..end].to_string())
}

/// Publish one component with bounded retries. Only transient failures
/// retry; the delay doubles after every attempt.
pub fn publish_with_retry(
    client: &dyn PlatformClient,
    name: &str,
    xml: &str,
) -> std::result::Result<ComponentId, PublishError> {
    publish_with_backoff(client, name, xml, RETRY_DELAY_MS)
}

/// Retry loop with an injectable backoff base, so tests run at
/// millisecond scale.
fn publish_with_backoff(
    client: &dyn PlatformClient,
    name: &str,
    xml: &str,
    base_delay_ms: u64,
) -> std::result::Result<ComponentId, PublishError> {
    let mut attempt = 0;
    loop {
        match client.publish(name, xml) {
            Ok(id) => {
                info!("Published {} as component {}", name, id);
                return Ok(id);
            }
            Err(e) if e.is_transient() && attempt + 1 < MAX_ATTEMPTS => {
                let delay = base_delay_ms * 2u64.pow(attempt);
                warn!(
                    "Publish attempt {} for {} failed: {}, retrying in {}ms",
                    attempt + 1,
                    name,
                    e,
                    delay
                );
                std::thread::sleep(Duration::from_millis(delay));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
