//! Probe configuration
//!
//! One `ProbeConfig` value is built up front and passed into every prober
//! call; nothing about endpoints or timeouts lives in global state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use transcript_state::MAX_TERM_NUMBER;

/// Default results portal
pub const DEFAULT_BASE_URL: &str = "https://results.vtu.ac.in";

/// Per-attempt request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Identifying request header sent with every attempt
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Candidate locations for one term, tried in order.
///
/// Placeholders: `{base}` (base URL without trailing slash), `{term}` (term
/// number), `{reg}` (normalized registration number, percent-encoded).
pub const DEFAULT_TEMPLATES: [&str; 4] = [
    "{base}/results/?sem={term}&usn={reg}",
    "{base}/result/?sem={term}&usn={reg}",
    "{base}/?semester={term}&usn={reg}",
    "{base}/search?usn={reg}&semester={term}",
];

/// Endpoint prober and orchestrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Results host, e.g. `https://results.vtu.ac.in`
    pub base_url: String,
    /// Ordered endpoint templates
    pub templates: Vec<String>,
    /// Timeout for a single request attempt
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
    /// Highest term number to probe
    pub max_terms: u8,
    /// Overall request deadline; `None` means `max_terms * templates * timeout`
    pub deadline: Option<Duration>,
    /// Fetch all terms in parallel instead of one after another
    pub concurrent: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            templates: DEFAULT_TEMPLATES.iter().map(|t| t.to_string()).collect(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_terms: MAX_TERM_NUMBER,
            deadline: None,
            concurrent: false,
        }
    }
}

impl ProbeConfig {
    /// Config for a specific results host, other settings default
    pub fn new(base_url: &str) -> Self {
        ProbeConfig {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Create a config from environment variables.
    ///
    /// Reads `TRANSCRIPT_RESULTS_BASE`, `TRANSCRIPT_PROBE_TIMEOUT_SECS`,
    /// `TRANSCRIPT_PROBE_CONCURRENT` and `TRANSCRIPT_USER_AGENT`. Unset or
    /// unparseable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(base) = lookup("TRANSCRIPT_RESULTS_BASE") {
            if !base.trim().is_empty() {
                config.base_url = base.trim().to_string();
            }
        }
        if let Some(raw) = lookup("TRANSCRIPT_PROBE_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "ignoring invalid TRANSCRIPT_PROBE_TIMEOUT_SECS"),
            }
        }
        if let Some(raw) = lookup("TRANSCRIPT_PROBE_CONCURRENT") {
            config.concurrent = matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(agent) = lookup("TRANSCRIPT_USER_AGENT") {
            if !agent.trim().is_empty() {
                config.user_agent = agent;
            }
        }
        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_templates<I, S>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.templates = templates.into_iter().map(Into::into).collect();
        self
    }

    /// Terms above `MAX_TERM_NUMBER` do not exist, so the value is clamped
    /// to `1..=MAX_TERM_NUMBER`.
    pub fn with_max_terms(mut self, max_terms: u8) -> Self {
        self.max_terms = max_terms.clamp(1, MAX_TERM_NUMBER);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Effective overall deadline for one ingestion request. The default is
    /// the sequential worst case: every candidate of every term timing out.
    pub fn deadline(&self) -> Duration {
        self.deadline.unwrap_or_else(|| {
            let attempts = u32::from(self.max_terms.max(1))
                * u32::try_from(self.templates.len().max(1)).unwrap_or(u32::MAX);
            self.timeout.saturating_mul(attempts)
        })
    }

    /// Concrete candidate URLs for one term, in probe order
    pub fn endpoints(&self, registration_number: &str, term: u8) -> Vec<String> {
        let base = self.base_url.trim_end_matches('/');
        let term = term.to_string();
        let registration = urlencoding::encode(registration_number);
        self.templates
            .iter()
            .map(|template| {
                template
                    .replace("{base}", base)
                    .replace("{term}", &term)
                    .replace("{reg}", &registration)
            })
            .collect()
    }
}
