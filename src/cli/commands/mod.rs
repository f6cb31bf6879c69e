pub mod area;
pub mod browse;
pub mod config;
pub mod detail;
pub mod export;
pub mod festivals;
pub mod nearby;
pub mod seoul;
pub mod sub_regions;
pub mod trend;
pub mod version;
pub mod web;

use reqwest::Client;
use std::sync::Arc;

use crate::api::http_client::{build_client, default_user_agent};
use crate::api::naver::NaverClient;
use crate::api::seoul::SeoulClient;
use crate::api::serp::SerpClient;
use crate::api::tour::TourApiClient;
use crate::api::ApiType;
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::{Result, TourError};
use crate::progress::{BarProgress, ProgressManager};

/// Everything a command needs: loaded configuration, the one HTTP client
/// and the terminal progress manager
pub struct Context {
    pub format: OutputFormat,
    pub config: Config,
    pub progress: Arc<ProgressManager>,
    http: Client,
}

impl Context {
    pub fn new(format: OutputFormat, quiet: bool, verbose: bool) -> Result<Self> {
        let config = Config::load()?;
        let http = build_client(config.timeout(), &default_user_agent())?;
        Ok(Self {
            format,
            config,
            progress: Arc::new(ProgressManager::new(quiet, verbose)),
            http,
        })
    }

    /// Fail early with the configuration hint when `api` has no key
    pub fn require(&self, api: ApiType) -> Result<()> {
        if self.config.client_config(api).is_configured() {
            Ok(())
        } else {
            Err(TourError::NoApiKey(api))
        }
    }

    pub fn tour(&self) -> TourApiClient {
        TourApiClient::new(self.config.client_config(ApiType::Tour), self.http.clone())
    }

    pub fn seoul(&self) -> SeoulClient {
        SeoulClient::new(self.config.client_config(ApiType::Seoul), self.http.clone())
    }

    pub fn serp(&self) -> SerpClient {
        SerpClient::new(self.config.client_config(ApiType::Serp), self.http.clone())
    }

    pub fn naver(&self) -> NaverClient {
        NaverClient::new(
            self.config.client_config(ApiType::NaverBlog),
            self.config.client_config(ApiType::NaverTrend),
            self.http.clone(),
        )
    }

    /// Progress bars for multi-stage operations
    pub fn bars(&self) -> BarProgress {
        BarProgress::new(self.progress.clone())
    }

    pub fn http(&self) -> Client {
        self.http.clone()
    }
}
