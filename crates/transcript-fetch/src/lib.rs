//! Transcript Fetch Library
//!
//! Ingestion of published term results from the university results portal.
//!
//! ## Layer 2 - Ingestion
//!
//! - [`ProbeConfig`]: endpoints, timeouts and fan-out, passed explicitly
//! - [`Transport`]: injectable GET capability ([`ReqwestTransport`] in
//!   production)
//! - [`fetch_term`]: ordered candidate endpoints, first non-blank body wins
//! - [`parse_term`]: position-tolerant table extraction
//! - [`Ingestor`]: terms `1..=8`, implements `transcript_core::ResultsSource`

pub mod config;
pub mod error;
pub mod html;
pub mod orchestrator;
pub mod parser;
pub mod prober;
pub mod transport;

pub use config::{ProbeConfig, DEFAULT_BASE_URL, DEFAULT_TEMPLATES, DEFAULT_TIMEOUT};
pub use error::{FetchError, Result};
pub use orchestrator::{Ingestor, SOURCE_NAME};
pub use parser::{parse_term, parse_term_with, RowLayout};
pub use prober::{fetch_term, ProbeHit};
pub use transport::{ReqwestTransport, Transport};
