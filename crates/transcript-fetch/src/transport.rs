//! HTTP transport seam
//!
//! The prober only needs "GET this URL within this timeout". Production
//! code uses [`ReqwestTransport`]; tests inject scripted fakes.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::ProbeConfig;
use crate::error::{FetchError, Result};

/// Minimal GET capability used by the endpoint prober
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` and return the response body as text.
    async fn get(&self, url: &str, timeout: Duration) -> Result<String>;
}

/// Transport backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client carrying the configured user agent and timeout.
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| classify(url, timeout, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|err| classify(url, timeout, err))
    }
}

fn classify(url: &str, timeout: Duration, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            seconds: timeout.as_secs(),
        }
    } else {
        err.into()
    }
}
