use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder};

use super::http_client::{default_user_agent, DEFAULT_TIMEOUT_SECS};
use super::types::{Coordinates, ListingQuery, ListingRecord, PageFetch, SourceKind};
use crate::error::{Result, TourError};
use crate::normalize::LookupTable;

/// A paginated listing source.
///
/// The tourism catalog, the Seoul dataset and the web-search API all
/// implement this so one pagination coordinator serves every source.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch one remote page. `page` is 1-based and sent upstream as-is.
    async fn fetch_page(&self, query: &ListingQuery, page: u32, rows: u32) -> Result<PageFetch>;

    /// Which upstream this source reads from
    fn kind(&self) -> SourceKind;
}

/// Listings around a point
#[async_trait]
pub trait NearbySource: Send + Sync {
    async fn nearby_listings(&self, at: Coordinates) -> Result<Vec<ListingRecord>>;
}

/// Look up listings near a point.
///
/// Never fails: an upstream error yields an empty table and is logged.
pub async fn search_by_location(source: &dyn NearbySource, at: Coordinates) -> LookupTable {
    match source.nearby_listings(at).await {
        Ok(records) => {
            debug!("{} listings near {:?}", records.len(), at);
            LookupTable::from_records(records)
        }
        Err(e) => {
            warn!("Nearby search at ({}, {}) failed: {}", at.latitude, at.longitude, e);
            LookupTable::default()
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key (or client id for Naver)
    pub api_key: String,
    /// Client secret, for APIs that need one
    pub api_secret: Option<String>,
    /// Base URL override; `None` uses the production endpoint
    pub base_url: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: None,
            base_url: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Join `path` onto the configured base URL (or `default_base`)
    pub fn endpoint_url(&self, default_base: &str, path: &str) -> String {
        let base = self.base_url.as_deref().unwrap_or(default_base);
        format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Factory for creating listing sources
pub struct ApiClientFactory;

impl ApiClientFactory {
    /// Create a listing source for the given upstream, sharing `http`
    pub fn create(kind: SourceKind, config: ClientConfig, http: Client) -> Box<dyn ListingSource> {
        match kind {
            SourceKind::Tour => Box::new(super::tour::TourApiClient::new(config, http)),
            SourceKind::Seoul => Box::new(super::seoul::SeoulClient::new(config, http)),
            SourceKind::Serp => Box::new(super::serp::SerpClient::new(config, http)),
        }
    }
}

/// Send a request and return the body text of a successful response.
///
/// Status codes are mapped onto the error taxonomy; empty bodies and HTML
/// pages (what the gateways return for bad keys) are rejected here so
/// callers only ever see JSON text.
pub(crate) async fn send_for_text(request: RequestBuilder) -> Result<String> {
    let response = request.send().await?;
    let status = response.status();

    if status.as_u16() == 429 {
        return Err(TourError::RateLimit);
    }
    if status.is_server_error() {
        return Err(TourError::ServerError(format!("Server returned status {}", status)));
    }
    if !status.is_success() {
        return Err(TourError::ApiError {
            code: status.as_u16().to_string(),
            message: format!("API request failed with status {}", status),
            hint: None,
        });
    }

    let text = response.text().await?;
    debug!("Received {} bytes", text.len());

    if text.trim().is_empty() {
        return Err(TourError::EmptyResponse);
    }

    if text.trim_start().starts_with('<') {
        return Err(TourError::ApiError {
            code: "INVALID_RESPONSE".to_string(),
            message: format!(
                "API returned XML/HTML instead of JSON: {}",
                text.chars().take(120).collect::<String>()
            ),
            hint: Some("This usually means the API key is invalid or not yet activated.".to_string()),
        });
    }

    Ok(text)
}

/// Parse a JSON body, keeping a short excerpt in the error
pub(crate) fn parse_json(text: &str) -> Result<serde_json::Value> {
    serde_json::from_str(text).map_err(|e| {
        TourError::Parse(format!(
            "Failed to parse API response as JSON: {}. Response starts with: {}",
            e,
            text.chars().take(100).collect::<String>()
        ))
    })
}
