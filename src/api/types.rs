use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiType;

/// One listing as returned by a search/list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Display title (unique within a page for lookup purposes)
    pub title: String,
    /// Content identifier used for detail lookups
    pub content_id: Option<String>,
    /// Content type identifier used for detail lookups
    pub content_type_id: Option<String>,
    /// Remaining upstream fields, in upstream order
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl ListingRecord {
    pub fn new(title: impl Into<String>, content_id: Option<String>, content_type_id: Option<String>) -> Self {
        Self {
            title: title.into(),
            content_id,
            content_type_id,
            fields: Map::new(),
        }
    }

    /// Field lookup as display text
    pub fn field(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(crate::normalize::value_to_string)
    }
}

/// Query parameters for a list request, already resolved to upstream codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingQuery {
    /// Region name as chosen by the user
    pub region_name: Option<String>,
    /// Numeric region code (catalog `areaCode`)
    pub area_code: Option<u32>,
    /// Sub-region code (catalog `sigunguCode`); `None` means all sub-regions
    pub sigungu_code: Option<String>,
    /// Category identifier (catalog `contentTypeId`); `None` means all categories
    pub content_type_id: Option<String>,
    /// Free-text search phrase for the web-search source
    pub keyword: Option<String>,
}

/// One fetched remote page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageFetch {
    pub records: Vec<ListingRecord>,
    /// Total result count reported by the upstream for the whole query
    pub total_count: u64,
}

/// Sub-region entry from the catalog's area code lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRegion {
    pub code: String,
    pub name: String,
}

/// Search coordinates for nearby lookups
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A blog post returned by the review search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogReview {
    pub title: String,
    pub description: String,
    pub link: String,
    /// `YYYYMMDD` as sent upstream
    pub postdate: String,
}

impl BlogReview {
    /// Post date as `YYYY-MM-DD`, or the raw value when it is not eight digits
    pub fn formatted_date(&self) -> String {
        let d = self.postdate.trim();
        if d.len() == 8 && d.chars().all(|c| c.is_ascii_digit()) {
            format!("{}-{}-{}", &d[0..4], &d[4..6], &d[6..8])
        } else {
            d.to_string()
        }
    }
}

/// One point of a search popularity time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// `YYYY-MM-DD`
    pub period: String,
    pub ratio: f64,
}

/// Source tag carried by list results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Tour,
    Seoul,
    Serp,
}

impl From<SourceKind> for ApiType {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Tour => ApiType::Tour,
            SourceKind::Seoul => ApiType::Seoul,
            SourceKind::Serp => ApiType::Serp,
        }
    }
}
