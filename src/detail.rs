//! Detail aggregation for a selected listing.
//!
//! The three catalog detail endpoints are queried one after another and
//! their items merged into one field map. A failing endpoint is replaced by
//! an inline error marker and never stops the others; the caller always
//! gets a report back.

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::naver::ReviewSource;
use crate::api::serp::SerpClient;
use crate::api::tour::DetailEndpoint;
use crate::api::types::{BlogReview, ListingRecord};
use crate::error::{Result, TourError};
use crate::normalize::{extract_items, result_header, LookupTable};
use crate::output::formatter::format_json_to_clean_string;
use crate::progress::{messages, NoProgress, ProgressSink};
use crate::trend;

/// Shown when the selected title is not in the current lookup table
pub const NOT_FOUND: &str = "선택된 항목을 찾을 수 없습니다.";
/// Number of blog posts attached to a detail view
pub const REVIEW_COUNT: u32 = 3;
/// Length of the popularity window ending today
pub const TREND_DAYS: i64 = 90;

/// Raw access to the catalog detail endpoints
#[async_trait]
pub trait DetailSource: Send + Sync {
    /// Fetch one endpoint's document. Upstream result codes are not checked.
    async fn fetch_detail(
        &self,
        endpoint: DetailEndpoint,
        content_id: &str,
        content_type_id: Option<&str>,
    ) -> Result<Value>;
}

/// Outcome of one detail sub-query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionStatus {
    Ok,
    /// The response carried a non-success result code (or none at all)
    Upstream { code: String, message: String },
    /// Transport, empty or unparseable response
    Failed { error: String },
}

/// One sub-query's contribution: the raw document and a readable rendering
#[derive(Debug, Clone, Serialize)]
pub struct DetailSection {
    pub endpoint: String,
    pub label: String,
    pub raw: String,
    pub formatted: String,
    #[serde(flatten)]
    pub status: SectionStatus,
}

impl DetailSection {
    pub fn is_ok(&self) -> bool {
        self.status == SectionStatus::Ok
    }
}

/// Aggregated detail view of one listing
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetailReport {
    pub title: String,
    pub content_id: Option<String>,
    pub content_type_id: Option<String>,
    /// Message shown instead of sections (nothing selected, not found)
    pub notice: Option<String>,
    pub sections: Vec<DetailSection>,
    /// Listing fields overlaid with every successful sub-query's items
    pub fields: Map<String, Value>,
    /// Markdown blocks appended after the first section
    pub enrichment: Vec<String>,
}

impl DetailReport {
    /// Report for an empty selection
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn not_found(title: &str) -> Self {
        Self {
            title: title.to_string(),
            notice: Some(NOT_FOUND.to_string()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notice.is_none() && self.sections.is_empty()
    }

    /// Sections whose sub-query failed or reported an upstream error
    pub fn failed_sections(&self) -> impl Iterator<Item = &DetailSection> {
        self.sections.iter().filter(|s| !s.is_ok())
    }

    /// Readable rendering of the whole report
    pub fn to_markdown(&self) -> String {
        if let Some(notice) = &self.notice {
            return notice.clone();
        }

        let mut out = String::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push_str("\n\n");
            }
            out.push_str(&format!("## {}\n\n{}", section.label, section.formatted));
            if i == 0 {
                for block in &self.enrichment {
                    out.push_str("\n\n---\n\n");
                    out.push_str(block);
                }
            }
        }
        out
    }
}

/// Runs the detail sub-queries and the optional enrichment lookups
pub struct DetailAggregator<'a> {
    details: &'a dyn DetailSource,
    reviews: Option<&'a dyn ReviewSource>,
    progress: &'a dyn ProgressSink,
    today: NaiveDate,
}

impl<'a> DetailAggregator<'a> {
    pub fn new(details: &'a dyn DetailSource) -> Self {
        Self {
            details,
            reviews: None,
            progress: &NoProgress,
            today: Local::now().date_naive(),
        }
    }

    /// Attach blog reviews and the search trend to every report
    pub fn with_reviews(mut self, reviews: &'a dyn ReviewSource) -> Self {
        self.reviews = Some(reviews);
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Fix the date the trend window ends on
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Details for a title from the current page's lookup table
    pub async fn get_details(&self, title: &str, table: &LookupTable) -> DetailReport {
        let title = title.trim();
        if title.is_empty() || table.is_empty() {
            return DetailReport::empty();
        }

        match table.get(title) {
            Some(record) => self.details_for(record).await,
            None => {
                debug!("'{}' is not in the lookup table", title);
                DetailReport::not_found(title)
            }
        }
    }

    /// Details for one listing record
    pub async fn details_for(&self, record: &ListingRecord) -> DetailReport {
        let mut report = DetailReport {
            title: record.title.clone(),
            content_id: record.content_id.clone(),
            content_type_id: record.content_type_id.clone(),
            fields: record.fields.clone(),
            ..Default::default()
        };

        let Some(content_id) = record.content_id.as_deref() else {
            warn!("'{}' has no content id; skipping detail lookups", record.title);
            report.notice = Some(NOT_FOUND.to_string());
            return report;
        };

        self.progress.stage(messages::DETAIL_LOOKUP, DetailEndpoint::ALL.len() as u64);
        for endpoint in DetailEndpoint::ALL {
            let result = self
                .details
                .fetch_detail(endpoint, content_id, record.content_type_id.as_deref())
                .await;
            let section = build_section(endpoint, result, &mut report.fields);
            report.sections.push(section);
            self.progress.advance(1);
        }
        self.progress.finish(&record.title);

        if let Some(reviews) = self.reviews {
            report.enrichment = self.enrich(reviews, &record.title).await;
        }

        report
    }

    async fn enrich(&self, reviews: &dyn ReviewSource, title: &str) -> Vec<String> {
        let mut blocks = Vec::new();

        match reviews.blog_reviews(&format!("{} 후기", title), REVIEW_COUNT).await {
            Ok(posts) if !posts.is_empty() => blocks.push(render_reviews(&posts)),
            Ok(_) => debug!("No blog reviews for '{}'", title),
            Err(TourError::NoApiKey(api)) => debug!("{} not configured; skipping reviews", api),
            Err(e) => {
                warn!("Blog review lookup for '{}' failed: {}", title, e);
                blocks.push("블로그 리뷰를 가져오는 중 오류가 발생했습니다.".to_string());
            }
        }

        let start = self.today - Duration::days(TREND_DAYS);
        match reviews.search_trend(title, start, self.today).await {
            Ok(points) => {
                if let Some(summary) = trend::TrendSummary::from_points(title, &points) {
                    blocks.push(format!("### 📈 네이버 검색 트렌드\n\n{}", summary.to_markdown(&points)));
                }
            }
            Err(TourError::NoApiKey(api)) => debug!("{} not configured; skipping trend", api),
            Err(e) => {
                warn!("Trend lookup for '{}' failed: {}", title, e);
                blocks.push("트렌드 정보를 가져오는 중 오류가 발생했습니다.".to_string());
            }
        }

        blocks
    }
}

fn pretty(doc: &Value) -> String {
    serde_json::to_string_pretty(doc).unwrap_or_else(|_| doc.to_string())
}

fn build_section(endpoint: DetailEndpoint, result: Result<Value>, fields: &mut Map<String, Value>) -> DetailSection {
    let name = endpoint.name();
    match result {
        Ok(doc) => {
            let raw = pretty(&doc);
            let status = match result_header(&doc) {
                Some(header) if header.is_success() => SectionStatus::Ok,
                Some(header) => SectionStatus::Upstream {
                    code: header.code,
                    message: header.message,
                },
                None => SectionStatus::Upstream {
                    code: "-".to_string(),
                    message: "응답에 결과 헤더가 없습니다.".to_string(),
                },
            };

            let formatted = if status == SectionStatus::Ok {
                for item in extract_items(&doc) {
                    fields.extend(item);
                }
                format_json_to_clean_string(&doc)
            } else {
                warn!("{} returned {:?}", name, status);
                raw.clone()
            };

            DetailSection {
                endpoint: name.to_string(),
                label: endpoint.label().to_string(),
                raw,
                formatted,
                status,
            }
        }
        Err(e) => {
            warn!("{} failed: {}", name, e);
            DetailSection {
                endpoint: name.to_string(),
                label: endpoint.label().to_string(),
                raw: format!("{} 처리 중 오류: {}", name, e),
                formatted: format!("정보를 가져오는 데 실패했습니다: {}", e),
                status: SectionStatus::Failed { error: e.to_string() },
            }
        }
    }
}

fn render_reviews(posts: &[BlogReview]) -> String {
    let mut md = String::from("### 📝 네이버 블로그 리뷰\n\n");
    for post in posts {
        md.push_str(&format!("**[{}]({})** ({})\n", post.title, post.link, post.formatted_date()));
        md.push_str(&format!("> {}...\n\n", post.description));
    }
    md.trim_end().to_string()
}

/// Details for a web-search result: the title is searched again and the
/// raw result shown in both views.
pub async fn web_details(serp: &SerpClient, title: &str, table: &LookupTable) -> DetailReport {
    let title = title.trim();
    if title.is_empty() || table.is_empty() {
        return DetailReport::empty();
    }

    let section = match serp.search_title(title).await {
        Ok(doc) => {
            let raw = pretty(&doc);
            DetailSection {
                endpoint: "search".to_string(),
                label: "SerpAPI".to_string(),
                formatted: raw.clone(),
                raw,
                status: SectionStatus::Ok,
            }
        }
        Err(e) => {
            warn!("Web detail search for '{}' failed: {}", title, e);
            DetailSection {
                endpoint: "search".to_string(),
                label: "SerpAPI".to_string(),
                raw: format!("상세 정보 처리 중 오류: {}", e),
                formatted: "정보를 가져오는 데 실패했습니다.".to_string(),
                status: SectionStatus::Failed { error: e.to_string() },
            }
        }
    };

    DetailReport {
        title: title.to_string(),
        fields: table.get(title).map(|r| r.fields.clone()).unwrap_or_default(),
        sections: vec![section],
        ..Default::default()
    }
}
