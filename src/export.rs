//! Export of every listing matching a filter selection to CSV.
//!
//! Every remote page is walked, not just the one on screen. Each listing is
//! then expanded with its common and intro details, and with one row per
//! repeating-info item. Columns appear in first-seen order.

use chrono::Local;
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::api::client::ListingSource;
use crate::api::tour::DetailEndpoint;
use crate::api::types::{ListingQuery, ListingRecord};
use crate::detail::DetailSource;
use crate::error::{Result, TourError};
use crate::filters::{FilterSelection, QueryResolver};
use crate::normalize::extract_items;
use crate::output::formatter::{clean_html, extract_homepage, is_key_excluded};
use crate::pagination::total_pages;
use crate::progress::{messages, NoProgress, ProgressSink};

/// Rows requested per list page while exporting
pub const EXPORT_ROWS: u32 = 100;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Result of an export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// CSV written with this many data rows
    Written { path: PathBuf, rows: usize },
    /// The filters matched nothing
    NoData,
    /// Listings were found but none yielded a row
    NoDetails,
}

/// A listing merged with its common and intro details, plus its
/// repeating-info items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDetails {
    pub base: Map<String, Value>,
    pub info: Vec<Map<String, Value>>,
}

impl ItemDetails {
    /// One row per info item, or the base row when there are none
    pub fn rows(&self) -> Vec<Map<String, Value>> {
        if self.info.is_empty() {
            return vec![self.base.clone()];
        }
        self.info
            .iter()
            .map(|info| {
                let mut row = self.base.clone();
                row.extend(info.clone());
                row
            })
            .collect()
    }

    /// The base row with the first info item merged in
    pub fn flattened(&self) -> Map<String, Value> {
        let mut row = self.base.clone();
        if let Some(first) = self.info.first() {
            row.extend(first.clone());
        }
        row
    }
}

/// Ordered CSV header set; excluded keys never enter it
#[derive(Debug, Clone, Default)]
pub struct Headers {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl Headers {
    pub fn add(&mut self, key: &str) {
        if is_key_excluded(key) || self.seen.contains(key) {
            return;
        }
        self.seen.insert(key.to_string());
        self.order.push(key.to_string());
    }

    pub fn add_all(&mut self, row: &Map<String, Value>) {
        for key in row.keys() {
            self.add(key);
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Count the matches of `query`, then fetch every page of them
pub async fn collect_all(
    listing: &dyn ListingSource,
    query: &ListingQuery,
    progress: &dyn ProgressSink,
) -> Result<Vec<ListingRecord>> {
    progress.stage(messages::COUNTING, 1);
    let total_count = listing.fetch_page(query, 1, 1).await?.total_count;
    progress.advance(1);
    if total_count == 0 {
        return Ok(Vec::new());
    }

    let pages = total_pages(total_count, EXPORT_ROWS);
    progress.stage(messages::COLLECTING_LIST, u64::from(pages));

    let mut records = Vec::new();
    for page in 1..=pages {
        let fetch = listing.fetch_page(query, page, EXPORT_ROWS).await?;
        debug!("Collected page {}/{} ({} records)", page, pages, fetch.records.len());
        records.extend(fetch.records);
        progress.advance(1);
    }
    info!("Collected {} of {} listings", records.len(), total_count);
    Ok(records)
}

/// Items of one detail endpoint; an empty body contributes nothing
async fn detail_items(
    details: &dyn DetailSource,
    endpoint: DetailEndpoint,
    content_id: &str,
    content_type_id: Option<&str>,
) -> Result<Vec<Map<String, Value>>> {
    match details.fetch_detail(endpoint, content_id, content_type_id).await {
        Ok(doc) => Ok(extract_items(&doc)),
        Err(TourError::EmptyResponse) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Expand one listing with its common, intro and repeating-info details
pub async fn fetch_item_details(details: &dyn DetailSource, record: &ListingRecord) -> Result<ItemDetails> {
    let content_id = record
        .content_id
        .as_deref()
        .ok_or_else(|| TourError::NotFound(format!("content id for '{}'", record.title)))?;
    let type_id = record.content_type_id.as_deref();

    let mut base = record.fields.clone();
    for endpoint in [DetailEndpoint::Common, DetailEndpoint::Intro] {
        for item in detail_items(details, endpoint, content_id, type_id).await? {
            base.extend(item);
        }
    }
    let info = detail_items(details, DetailEndpoint::Info, content_id, type_id).await?;

    Ok(ItemDetails { base, info })
}

/// Text written to a CSV cell
pub fn clean_value(key: &str, value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) if key == "homepage" => extract_homepage(s),
        Value::String(s) => clean_html(s),
        other if key == "homepage" => extract_homepage(&other.to_string()),
        other => other.to_string(),
    }
}

/// Write rows as CSV with a UTF-8 BOM. Cells missing from a row are blank
/// and keys outside `headers` are dropped.
pub fn write_csv(path: &Path, headers: &[String], rows: &[Map<String, Value>]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(headers)?;
    for row in rows {
        let record: Vec<String> = headers
            .iter()
            .map(|key| row.get(key).map(|v| clean_value(key, v)).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// `tour_data_<timestamp>.csv`
pub fn export_file_name() -> String {
    format!("tour_data_{}.csv", Local::now().format("%Y%m%d_%H%M%S_%3f"))
}

/// Exports every listing matching a filter selection
pub struct Exporter<'a> {
    listing: &'a dyn ListingSource,
    details: &'a dyn DetailSource,
    resolver: &'a dyn QueryResolver,
    out_dir: PathBuf,
    progress: &'a dyn ProgressSink,
}

impl<'a> Exporter<'a> {
    pub fn new(
        listing: &'a dyn ListingSource,
        details: &'a dyn DetailSource,
        resolver: &'a dyn QueryResolver,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            listing,
            details,
            resolver,
            out_dir: out_dir.into(),
            progress: &NoProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Export everything matching `selection` to a new CSV in the output
    /// directory.
    ///
    /// Resolution, counting and list paging failures abort the export. A
    /// listing whose details fail is logged and skipped.
    pub async fn export_all(&self, selection: &FilterSelection) -> Result<ExportOutcome> {
        let query = self.resolver.resolve(selection).await?;
        let records = collect_all(self.listing, &query, self.progress).await?;
        if records.is_empty() {
            info!("Nothing to export for {}", selection.describe());
            return Ok(ExportOutcome::NoData);
        }

        let mut headers = Headers::default();
        let mut rows = Vec::new();

        self.progress.stage(messages::COLLECTING_DETAILS, records.len() as u64);
        for record in &records {
            if record.content_id.is_none() {
                debug!("Skipping '{}' without content id", record.title);
                self.progress.advance(1);
                continue;
            }

            match fetch_item_details(self.details, record).await {
                Ok(item) => {
                    headers.add_all(&item.base);
                    for info in &item.info {
                        headers.add_all(info);
                    }
                    rows.extend(item.rows());
                }
                Err(e) => warn!(
                    "Skipping '{}' ({:?}): {}",
                    record.title, record.content_id, e
                ),
            }
            self.progress.advance(1);
        }

        if rows.is_empty() || headers.is_empty() {
            return Ok(ExportOutcome::NoDetails);
        }

        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(export_file_name());
        write_csv(&path, headers.as_slice(), &rows)?;

        self.progress
            .finish(&format!("{}개 행을 {}에 저장했습니다.", rows.len(), path.display()));
        Ok(ExportOutcome::Written { path, rows: rows.len() })
    }
}
