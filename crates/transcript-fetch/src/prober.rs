//! Endpoint prober
//!
//! Tries each candidate location for one term in order. The first attempt
//! that returns a non-blank body wins; when all fail the term is reported
//! as unavailable. There is no retry beyond the candidate list itself.

use tracing::{debug, instrument};

use crate::config::ProbeConfig;
use crate::error::{FetchError, Result};
use crate::transport::Transport;

/// A successful probe: where the payload came from and the payload itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHit {
    pub endpoint: String,
    pub body: String,
}

/// Fetch the raw page for one term.
#[instrument(skip(config, transport), fields(candidates = config.templates.len()))]
pub async fn fetch_term<T>(
    config: &ProbeConfig,
    transport: &T,
    registration_number: &str,
    term: u8,
) -> Result<ProbeHit>
where
    T: Transport + ?Sized,
{
    let mut attempts = 0usize;
    for endpoint in config.endpoints(registration_number, term) {
        attempts += 1;
        match transport.get(&endpoint, config.timeout).await {
            Ok(body) if !body.trim().is_empty() => return Ok(ProbeHit { endpoint, body }),
            Ok(_) => {
                let err = FetchError::EmptyPayload { url: endpoint };
                debug!(error = %err, "probe attempt failed");
            }
            Err(err) => debug!(%endpoint, error = %err, "probe attempt failed"),
        }
    }
    Err(FetchError::TermUnavailable { term, attempts })
}
