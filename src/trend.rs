//! Search popularity around festival dates.
//!
//! For each festival with known event dates the daily search trend is
//! fetched from a month before the start to a month after the end (capped
//! at today) and written to one CSV alongside the festival rows it came
//! from. Graphs are rendered as text sparklines.

use chrono::{Duration, Local, NaiveDate};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

use crate::api::client::ListingSource;
use crate::api::naver::ReviewSource;
use crate::api::types::{ListingRecord, TrendPoint};
use crate::detail::DetailSource;
use crate::error::{Result, TourError};
use crate::export::{collect_all, fetch_item_details, write_csv, Headers};
use crate::filters::{FilterSelection, QueryResolver};
use crate::normalize::{value_to_string, LookupTable};
use crate::progress::{messages, NoProgress, ProgressSink};

/// Intermediate festival rows
pub const FESTIVAL_CSV: &str = "TourAPI_Festival.csv";
/// Trend rows of every analysed festival
pub const TREND_CSV: &str = "Festival_Trend_WithPeriod.csv";
/// Days added before the start and after the end of an event
pub const MARGIN_DAYS: i64 = 30;

const SPARK_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One character per point, scaled between the series minimum and maximum
pub fn sparkline(points: &[TrendPoint]) -> String {
    let (min, max) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.ratio), hi.max(p.ratio))
    });
    let span = max - min;
    let top = (SPARK_BARS.len() - 1) as f64;

    points
        .iter()
        .map(|p| {
            let level = if span > 0.0 { ((p.ratio - min) / span * top).round() } else { 0.0 };
            SPARK_BARS[(level as usize).min(SPARK_BARS.len() - 1)]
        })
        .collect()
}

/// Headline numbers of a trend series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub keyword: String,
    pub start: String,
    pub end: String,
    pub peak_period: String,
    pub peak_ratio: f64,
    pub average: f64,
    pub samples: usize,
}

impl TrendSummary {
    /// `None` for an empty series
    pub fn from_points(keyword: &str, points: &[TrendPoint]) -> Option<Self> {
        let first = points.first()?;
        let last = points.last()?;
        let peak = points
            .iter()
            .fold(first, |best, p| if p.ratio > best.ratio { p } else { best });
        let average = points.iter().map(|p| p.ratio).sum::<f64>() / points.len() as f64;

        Some(Self {
            keyword: keyword.to_string(),
            start: first.period.clone(),
            end: last.period.clone(),
            peak_period: peak.period.clone(),
            peak_ratio: peak.ratio,
            average,
            samples: points.len(),
        })
    }

    pub fn to_markdown(&self, points: &[TrendPoint]) -> String {
        format!(
            "**'{}' 검색어 트렌드** ({} ~ {})\n\n`{}`\n\n- 최고: {} ({:.1})\n- 평균: {:.1}",
            self.keyword,
            self.start,
            self.end,
            sparkline(points),
            self.peak_period,
            self.peak_ratio,
            self.average
        )
    }
}

/// Event dates of a festival and the trend window derived from them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FestivalWindow {
    pub keyword: String,
    pub event_start: NaiveDate,
    pub event_end: NaiveDate,
    pub query_start: NaiveDate,
    pub query_end: NaiveDate,
}

fn parse_event_date(row: &Map<String, Value>, key: &str) -> Option<NaiveDate> {
    let raw = row.get(key).and_then(value_to_string)?;
    NaiveDate::parse_from_str(raw.trim(), "%Y%m%d").ok()
}

/// Trend window for a festival row, `None` when the row has no title,
/// unparseable dates or starts after `today`
pub fn festival_window(row: &Map<String, Value>, today: NaiveDate) -> Option<FestivalWindow> {
    let keyword = row.get("title").and_then(value_to_string)?.trim().to_string();
    let event_start = parse_event_date(row, "eventstartdate")?;
    let event_end = parse_event_date(row, "eventenddate")?;
    if event_start > today {
        return None;
    }

    Some(FestivalWindow {
        keyword,
        event_start,
        event_end,
        query_start: event_start - Duration::days(MARGIN_DAYS),
        query_end: (event_end + Duration::days(MARGIN_DAYS)).min(today),
    })
}

/// A festival and its trend series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub window: FestivalWindow,
    pub points: Vec<TrendPoint>,
}

/// Outcome of an analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub series: Vec<TrendSeries>,
    pub festival_csv: Option<PathBuf>,
    pub trend_csv: Option<PathBuf>,
    pub message: String,
}

/// Fetches trend series for festival rows and writes the CSV outputs
pub struct TrendAnalyzer<'a> {
    reviews: &'a dyn ReviewSource,
    out_dir: PathBuf,
    today: NaiveDate,
    progress: &'a dyn ProgressSink,
}

impl<'a> TrendAnalyzer<'a> {
    pub fn new(reviews: &'a dyn ReviewSource, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            reviews,
            out_dir: out_dir.into(),
            today: Local::now().date_naive(),
            progress: &NoProgress,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Analyse detail rows of festivals.
    ///
    /// Rows whose trend lookup fails or comes back empty are skipped.
    /// Missing trend credentials abort the run.
    pub async fn analyze(&self, rows: &[Map<String, Value>]) -> Result<TrendReport> {
        fs::create_dir_all(&self.out_dir)?;

        let mut headers = Headers::default();
        for row in rows {
            headers.add_all(row);
        }
        let festival_csv = self.out_dir.join(FESTIVAL_CSV);
        write_csv(&festival_csv, headers.as_slice(), rows)?;

        let mut series = Vec::new();
        self.progress.stage(messages::TREND_LOOKUP, rows.len() as u64);
        for row in rows {
            self.progress.advance(1);
            let Some(window) = festival_window(row, self.today) else {
                continue;
            };

            match self
                .reviews
                .search_trend(&window.keyword, window.query_start, window.query_end)
                .await
            {
                Ok(points) if !points.is_empty() => series.push(TrendSeries { window, points }),
                Ok(_) => debug!("No trend data for '{}'", window.keyword),
                Err(e @ TourError::NoApiKey(_)) => return Err(e),
                Err(e) => warn!("Trend lookup for '{}' failed: {}", window.keyword, e),
            }
        }

        if series.is_empty() {
            self.progress.finish("트렌드 분석을 수행할 항목이 없습니다.");
            return Ok(TrendReport {
                series,
                festival_csv: Some(festival_csv),
                trend_csv: None,
                message: "트렌드 분석을 수행할 항목이 없습니다.".to_string(),
            });
        }

        let trend_csv = self.out_dir.join(TREND_CSV);
        write_csv(&trend_csv, &trend_headers(), &trend_rows(&series))?;

        let message = format!(
            "분석 완료! {}개 항목의 트렌드 분석 결과가 \"{}\" 폴더에 저장되었습니다.",
            series.len(),
            self.out_dir.display()
        );
        info!("{}", message);
        self.progress.finish(&message);

        Ok(TrendReport {
            series,
            festival_csv: Some(festival_csv),
            trend_csv: Some(trend_csv),
            message,
        })
    }
}

fn trend_headers() -> Vec<String> {
    ["period", "ratio", "keyword", "eventstartdate", "eventenddate"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn trend_rows(series: &[TrendSeries]) -> Vec<Map<String, Value>> {
    let mut rows = Vec::new();
    for s in series {
        for point in &s.points {
            let mut row = Map::new();
            row.insert("period".into(), Value::String(point.period.clone()));
            row.insert("ratio".into(), serde_json::json!(point.ratio));
            row.insert("keyword".into(), Value::String(s.window.keyword.clone()));
            row.insert("eventstartdate".into(), Value::String(s.window.event_start.to_string()));
            row.insert("eventenddate".into(), Value::String(s.window.event_end.to_string()));
            rows.push(row);
        }
    }
    rows
}

/// Detail rows for every festival matching a filter selection
pub async fn festival_rows_from_filters(
    listing: &dyn ListingSource,
    details: &dyn DetailSource,
    resolver: &dyn QueryResolver,
    selection: &FilterSelection,
    progress: &dyn ProgressSink,
) -> Result<Vec<Map<String, Value>>> {
    let query = resolver.resolve(selection).await?;
    let records = collect_all(listing, &query, progress).await?;
    Ok(detail_rows(details, &records, progress).await)
}

/// Detail rows for the listings of a lookup table (e.g. a nearby search)
pub async fn festival_rows_from_table(
    details: &dyn DetailSource,
    table: &LookupTable,
    progress: &dyn ProgressSink,
) -> Vec<Map<String, Value>> {
    detail_rows(details, table.records(), progress).await
}

/// One flattened row per listing. A listing without a content id, or whose
/// details fail, contributes its own fields.
async fn detail_rows(
    details: &dyn DetailSource,
    records: &[ListingRecord],
    progress: &dyn ProgressSink,
) -> Vec<Map<String, Value>> {
    progress.stage(messages::COLLECTING_DETAILS, records.len() as u64);
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let row = if record.content_id.is_none() {
            record.fields.clone()
        } else {
            match fetch_item_details(details, record).await {
                Ok(item) => item.flattened(),
                Err(e) => {
                    warn!("Details for '{}' failed: {}", record.title, e);
                    record.fields.clone()
                }
            }
        };
        rows.push(row);
        progress.advance(1);
    }
    rows
}
