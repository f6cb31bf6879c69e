//! Mapping of user-facing filter labels to upstream query parameters.

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::api::types::{ListingQuery, SubRegion};
use crate::error::{Result, TourError};

/// Label meaning "no filter" for sub-regions and categories
pub const ALL: &str = "전체";

/// Region name → catalog `areaCode`
pub const AREA_CODES: &[(&str, u32)] = &[
    ("서울", 1),
    ("인천", 2),
    ("대전", 3),
    ("대구", 4),
    ("광주", 5),
    ("부산", 6),
    ("울산", 7),
    ("세종", 8),
    ("경기도", 31),
    ("강원도", 32),
    ("충청북도", 33),
    ("충청남도", 34),
    ("경상북도", 35),
    ("경상남도", 36),
    ("전라북도", 37),
    ("전라남도", 38),
    ("제주도", 39),
];

/// Category name → catalog `contentTypeId` (`None` = no filter)
pub const CONTENT_TYPE_CODES: &[(&str, Option<&str>)] = &[
    (ALL, None),
    ("관광지", Some("12")),
    ("문화시설", Some("14")),
    ("행사/공연/축제", Some("15")),
    ("여행코스", Some("25")),
    ("레포츠", Some("28")),
    ("숙박", Some("32")),
    ("쇼핑", Some("38")),
    ("음식점", Some("39")),
];

/// Category name → web search phrase
pub const WEB_SEARCH_KEYWORDS: &[(&str, &str)] = &[
    (ALL, "가볼만한 곳"),
    ("관광지", "관광지"),
    ("문화시설", "문화시설"),
    ("행사/공연/축제", "축제"),
    ("여행코스", "여행코스"),
    ("레포츠", "레포츠"),
    ("숙박", "숙소"),
    ("쇼핑", "쇼핑"),
    ("음식점", "맛집"),
];

pub const DEFAULT_WEB_KEYWORD: &str = "가볼만한 곳";

/// Category used for festival trend analysis
pub const FESTIVAL_CATEGORY: &str = "행사/공연/축제";

/// Filters as chosen by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub region: Option<String>,
    pub sub_region: Option<String>,
    pub category: Option<String>,
}

impl FilterSelection {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            ..Default::default()
        }
    }

    pub fn with_sub_region(mut self, sub_region: Option<String>) -> Self {
        self.sub_region = sub_region;
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Short human-readable description
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(region) = &self.region {
            parts.push(region.clone());
        }
        if let Some(sub) = self.sub_region.as_deref().filter(|s| !is_all(s)) {
            parts.push(sub.to_string());
        }
        if let Some(cat) = self.category.as_deref().filter(|s| !is_all(s)) {
            parts.push(cat.to_string());
        }
        if parts.is_empty() {
            ALL.to_string()
        } else {
            parts.join(" / ")
        }
    }
}

fn is_all(label: &str) -> bool {
    let label = label.trim();
    label.is_empty() || label == ALL
}

/// Look up a region code by name (or by its numeric code)
pub fn area_code(region: &str) -> Option<u32> {
    let region = region.trim();
    AREA_CODES
        .iter()
        .find(|(name, code)| *name == region || code.to_string() == region)
        .map(|(_, code)| *code)
}

/// Look up a category id by name (or by its id). `Ok(None)` means "all".
pub fn content_type_id(category: Option<&str>) -> Result<Option<&'static str>> {
    let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    CONTENT_TYPE_CODES
        .iter()
        .find(|(name, id)| *name == category || *id == Some(category))
        .map(|(_, id)| *id)
        .ok_or_else(|| {
            TourError::InvalidInput(format!(
                "Unknown category '{}'. Expected one of: {}",
                category,
                category_names().join(", ")
            ))
        })
}

/// Web search phrase for a category label
pub fn web_keyword(category: Option<&str>) -> &'static str {
    category
        .map(str::trim)
        .and_then(|c| WEB_SEARCH_KEYWORDS.iter().find(|(name, _)| *name == c))
        .map(|(_, kw)| *kw)
        .unwrap_or(DEFAULT_WEB_KEYWORD)
}

pub fn region_names() -> Vec<&'static str> {
    AREA_CODES.iter().map(|(name, _)| *name).collect()
}

pub fn category_names() -> Vec<&'static str> {
    CONTENT_TYPE_CODES.iter().map(|(name, _)| *name).collect()
}

fn require_region(selection: &FilterSelection) -> Result<&str> {
    selection
        .region
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| TourError::InvalidInput("지역을 먼저 선택해주세요.".to_string()))
}

/// Source of sub-region names/codes for a region
#[async_trait]
pub trait SubRegionLookup: Send + Sync {
    async fn sub_regions(&self, area_code: u32) -> Result<Vec<SubRegion>>;
}

/// Turns a [`FilterSelection`] into the query a listing source understands
#[async_trait]
pub trait QueryResolver: Send + Sync {
    async fn resolve(&self, selection: &FilterSelection) -> Result<ListingQuery>;
}

/// Resolver for the tourism catalog.
///
/// Region and category come from static tables; the sub-region code needs
/// a live lookup against the catalog.
pub struct CatalogFilterResolver<'a> {
    lookup: &'a dyn SubRegionLookup,
}

impl<'a> CatalogFilterResolver<'a> {
    pub fn new(lookup: &'a dyn SubRegionLookup) -> Self {
        Self { lookup }
    }

    /// Sub-region names for a region, prefixed with [`ALL`]
    pub async fn list_sub_regions(&self, region: &str) -> Result<Vec<String>> {
        let code = area_code(region).ok_or_else(|| unknown_region(region))?;
        let mut names = vec![ALL.to_string()];
        names.extend(self.lookup.sub_regions(code).await?.into_iter().map(|s| s.name));
        Ok(names)
    }

    async fn sub_region_code(&self, area: u32, name: &str) -> Result<Option<String>> {
        let sub_regions = self.lookup.sub_regions(area).await?;
        let code = sub_regions
            .into_iter()
            .find(|s| s.name == name)
            .map(|s| s.code);
        if code.is_none() {
            warn!("Sub-region '{}' not found in area {}; searching all sub-regions", name, area);
        }
        Ok(code)
    }
}

#[async_trait]
impl QueryResolver for CatalogFilterResolver<'_> {
    async fn resolve(&self, selection: &FilterSelection) -> Result<ListingQuery> {
        let region = require_region(selection)?;
        let area = area_code(region).ok_or_else(|| unknown_region(region))?;

        let sigungu_code = match selection.sub_region.as_deref() {
            Some(name) if !is_all(name) => self.sub_region_code(area, name.trim()).await?,
            _ => None,
        };

        let content_type_id = content_type_id(selection.category.as_deref())?.map(str::to_string);

        let query = ListingQuery {
            region_name: Some(region.to_string()),
            area_code: Some(area),
            sigungu_code,
            content_type_id,
            keyword: None,
        };
        debug!("Resolved {:?} -> {:?}", selection, query);
        Ok(query)
    }
}

/// Resolver for the web-search source: builds "<region> <keyword>"
pub struct WebSearchResolver;

#[async_trait]
impl QueryResolver for WebSearchResolver {
    async fn resolve(&self, selection: &FilterSelection) -> Result<ListingQuery> {
        let region = require_region(selection)?;
        let keyword = web_keyword(selection.category.as_deref());
        Ok(ListingQuery {
            region_name: Some(region.to_string()),
            keyword: Some(format!("{} {}", region, keyword)),
            ..Default::default()
        })
    }
}

/// Resolver for sources without filters (the Seoul dataset)
pub struct NoFilters;

#[async_trait]
impl QueryResolver for NoFilters {
    async fn resolve(&self, _selection: &FilterSelection) -> Result<ListingQuery> {
        Ok(ListingQuery::default())
    }
}

fn unknown_region(region: &str) -> TourError {
    TourError::InvalidInput(format!(
        "Unknown region '{}'. Expected one of: {}",
        region,
        region_names().join(", ")
    ))
}
