use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde_json::Value;

use super::client::{parse_json, send_for_text, ClientConfig, ListingSource, NearbySource};
use super::types::{Coordinates, ListingQuery, ListingRecord, PageFetch, SourceKind, SubRegion};
use super::ApiType;
use crate::detail::DetailSource;
use crate::error::{Result, TourError};
use crate::filters::SubRegionLookup;
use crate::normalize::{self, extract_items, value_to_string};

const BASE_URL: &str = "https://apis.data.go.kr/B551011/KorService2";
const MOBILE_OS: &str = "ETC";
const MOBILE_APP: &str = "TourLens";

/// Radius in meters used for nearby searches
pub const NEARBY_RADIUS_M: u32 = 5000;
/// Number of rows fetched for nearby searches
pub const NEARBY_ROWS: u32 = 20;
/// Rows requested for the sub-region code lookup
const SUB_REGION_ROWS: u32 = 100;

/// Detail endpoints of the catalog, in the order they are queried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailEndpoint {
    /// Common info (title, address, overview, images)
    Common,
    /// Category specific intro (opening hours, event dates, ...)
    Intro,
    /// Repeating structured info (rooms, courses, fees, ...)
    Info,
}

impl DetailEndpoint {
    pub const ALL: [DetailEndpoint; 3] = [Self::Common, Self::Intro, Self::Info];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Common => "detailCommon2",
            Self::Intro => "detailIntro2",
            Self::Info => "detailInfo2",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Common => "공통정보",
            Self::Intro => "소개정보",
            Self::Info => "반복정보",
        }
    }

    /// Query parameters; the common endpoint always asks for every section
    fn params(&self, content_id: &str, content_type_id: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![("contentId", content_id.to_string())];
        match self {
            Self::Common => {
                for flag in [
                    "defaultYN",
                    "firstImageYN",
                    "areacodeYN",
                    "catcodeYN",
                    "addrinfoYN",
                    "mapinfoYN",
                    "overviewYN",
                ] {
                    params.push((flag, "Y".to_string()));
                }
            }
            Self::Intro | Self::Info => {
                if let Some(type_id) = content_type_id {
                    params.push(("contentTypeId", type_id.to_string()));
                }
            }
        }
        params
    }
}

/// KorService2 tourism catalog client
pub struct TourApiClient {
    config: ClientConfig,
    http: Client,
}

impl TourApiClient {
    pub fn new(config: ClientConfig, http: Client) -> Self {
        Self { config, http }
    }

    fn common_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("_type", "json".to_string()),
            ("MobileOS", MOBILE_OS.to_string()),
            ("MobileApp", MOBILE_APP.to_string()),
            ("serviceKey", self.config.api_key.clone()),
        ]
    }

    /// Call an endpoint and return the parsed document.
    ///
    /// The result code in the header is not checked here so callers that
    /// want to show the raw payload of a failed call still can; use
    /// [`TourApiClient::call_checked`] otherwise.
    pub async fn call(&self, endpoint: &str, params: &[(&'static str, String)]) -> Result<Value> {
        if !self.config.is_configured() {
            return Err(TourError::NoApiKey(ApiType::Tour));
        }

        let mut all_params = self.common_params();
        all_params.extend_from_slice(params);

        let url = self.config.endpoint_url(BASE_URL, endpoint);
        debug!("GET {} {:?}", url, params);

        let text = send_for_text(self.http.get(&url).query(&all_params)).await?;
        parse_json(&text)
    }

    /// Call an endpoint and fail on a non-success result code
    pub async fn call_checked(&self, endpoint: &str, params: &[(&'static str, String)]) -> Result<Value> {
        let doc = self.call(endpoint, params).await?;
        ensure_success(&doc)?;
        Ok(doc)
    }

    /// Listings filtered by area, sub-region and category (`areaBasedList2`)
    pub async fn area_based_list(&self, query: &ListingQuery, page: u32, rows: u32) -> Result<PageFetch> {
        let mut params = query_params(query);
        params.push(("numOfRows", rows.to_string()));
        params.push(("pageNo", page.to_string()));

        let doc = self.call_checked("areaBasedList2", &params).await?;
        let fetch = PageFetch {
            records: normalize::normalize_listings(&doc),
            total_count: normalize::total_count(&doc),
        };
        info!(
            "areaBasedList2 page {}: {} records of {}",
            page,
            fetch.records.len(),
            fetch.total_count
        );
        Ok(fetch)
    }

    /// Listings within [`NEARBY_RADIUS_M`] of a point (`locationBasedList2`)
    pub async fn location_based_list(&self, at: Coordinates) -> Result<Vec<ListingRecord>> {
        let params = vec![
            ("mapX", at.longitude.to_string()),
            ("mapY", at.latitude.to_string()),
            ("radius", NEARBY_RADIUS_M.to_string()),
            ("numOfRows", NEARBY_ROWS.to_string()),
        ];
        let doc = self.call_checked("locationBasedList2", &params).await?;
        Ok(normalize::normalize_listings(&doc))
    }
}

#[async_trait]
impl DetailSource for TourApiClient {
    async fn fetch_detail(
        &self,
        endpoint: DetailEndpoint,
        content_id: &str,
        content_type_id: Option<&str>,
    ) -> Result<Value> {
        let params = endpoint.params(content_id, content_type_id);
        self.call(endpoint.name(), &params).await
    }
}

#[async_trait]
impl NearbySource for TourApiClient {
    async fn nearby_listings(&self, at: Coordinates) -> Result<Vec<ListingRecord>> {
        self.location_based_list(at).await
    }
}

#[async_trait]
impl ListingSource for TourApiClient {
    async fn fetch_page(&self, query: &ListingQuery, page: u32, rows: u32) -> Result<PageFetch> {
        self.area_based_list(query, page, rows).await
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Tour
    }
}

#[async_trait]
impl SubRegionLookup for TourApiClient {
    async fn sub_regions(&self, area_code: u32) -> Result<Vec<SubRegion>> {
        let params = vec![
            ("areaCode", area_code.to_string()),
            ("numOfRows", SUB_REGION_ROWS.to_string()),
        ];
        let doc = self.call_checked("areaCode2", &params).await?;
        Ok(extract_items(&doc)
            .iter()
            .filter_map(|item| {
                Some(SubRegion {
                    code: item.get("code").and_then(value_to_string)?,
                    name: item.get("name").and_then(value_to_string)?,
                })
            })
            .collect())
    }
}

/// Query parameters for a resolved listing query; unset filters are omitted
pub fn query_params(query: &ListingQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(area) = query.area_code {
        params.push(("areaCode", area.to_string()));
    }
    if let Some(sigungu) = &query.sigungu_code {
        params.push(("sigunguCode", sigungu.clone()));
    }
    if let Some(type_id) = &query.content_type_id {
        params.push(("contentTypeId", type_id.clone()));
    }
    params
}

/// Fail with an API error when the header carries a non-success code
pub fn ensure_success(doc: &Value) -> Result<()> {
    match normalize::result_header(doc) {
        Some(header) if !header.is_success() => Err(TourError::ApiError {
            code: header.code,
            message: header.message,
            hint: Some("Check the service key and request parameters.".to_string()),
        }),
        _ => Ok(()),
    }
}
