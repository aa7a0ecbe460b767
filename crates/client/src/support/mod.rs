//! Support-site product lookup.
//!
//! ### Request
//!
//! - **Endpoint**: `http://support-sp.apple.com/sp/product?cc=<code>` (configurable)
//! - **Headers**: browser-like `Accept`/`Accept-Language`, with a randomized
//!   desktop Firefox `User-Agent` unless a fixed one is configured.
//! - **Timeout**: 20s by default.
//!
//! ### Outcome
//!
//! - 2xx with a `<configCode>` name → [`Lookup::Found`]
//! - 2xx with an empty `<configCode>` → [`Lookup::Pending`]
//! - 2xx with `<error>` or no `<configCode>` → [`Lookup::NotFound`]
//! - any other status, transport failure or non-XML body → [`LookupError`]

pub mod error;
pub mod response;

pub use error::LookupError;
pub use response::parse_product;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use macmodels_core::config::{AppConfig, DEFAULT_ENDPOINT};
use macmodels_core::{Lookup, LookupFailure, Resolver};
use rand::Rng;
use reqwest::header;
use url::Url;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Lookup client configuration.
#[derive(Debug, Clone)]
pub struct SupportConfig {
    /// Lookup endpoint; the code is appended as the `cc` query parameter.
    pub endpoint: String,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
    /// Fixed User-Agent; randomized per request when `None`.
    pub user_agent: Option<String>,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self { endpoint: DEFAULT_ENDPOINT.to_string(), timeout: DEFAULT_TIMEOUT, user_agent: None }
    }
}

impl From<&AppConfig> for SupportConfig {
    fn from(config: &AppConfig) -> Self {
        Self { endpoint: config.endpoint.clone(), timeout: config.timeout(), user_agent: config.user_agent.clone() }
    }
}

/// A desktop Firefox User-Agent with randomized OS and browser versions.
pub fn random_user_agent() -> String {
    let mut rng = rand::thread_rng();
    let macos_minor = rng.gen_range(11..16);
    let firefox = rng.gen_range(50..70);
    format!("Mozilla/5.0 (Macintosh; Intel Mac OS X 10.{macos_minor}; rv:{firefox}) Gecko/20100101 Firefox/{firefox}")
}

/// HTTP client for the product lookup endpoint.
#[derive(Debug, Clone)]
pub struct SupportClient {
    http: reqwest::Client,
    endpoint: Url,
    config: SupportConfig,
}

impl SupportClient {
    /// Create a new lookup client with the given configuration.
    pub fn new(config: SupportConfig) -> Result<Self, LookupError> {
        let endpoint =
            Url::parse(&config.endpoint).map_err(|e| LookupError::InvalidEndpoint(format!("{}: {e}", config.endpoint)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(LookupError::from)?;

        Ok(Self { http, endpoint, config })
    }

    /// URL queried for `id`.
    pub fn product_url(&self, id: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("cc", id);
        url
    }

    /// Look up a single product code.
    pub async fn lookup(&self, id: &str) -> Result<Lookup, LookupError> {
        let start = Instant::now();
        let url = self.product_url(id);
        let user_agent = self.config.user_agent.clone().unwrap_or_else(random_user_agent);

        let response = self
            .http
            .get(url.as_str())
            .header(header::USER_AGENT, user_agent)
            .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(header::DNT, "1")
            .header(header::UPGRADE_INSECURE_REQUESTS, "1")
            .header(header::CACHE_CONTROL, "max-age=0")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::HttpError { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        let body = String::from_utf8_lossy(&bytes);
        let lookup = parse_product(&body)?;

        tracing::debug!(id, ?lookup, elapsed_ms = start.elapsed().as_millis() as u64, "lookup completed");

        Ok(lookup)
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &SupportConfig {
        &self.config
    }
}

#[async_trait]
impl Resolver for SupportClient {
    async fn resolve(&self, id: &str) -> Result<Lookup, LookupFailure> {
        self.lookup(id).await.map_err(LookupFailure::from)
    }
}
