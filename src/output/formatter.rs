use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::api::serp::FestivalInfo;
use crate::api::types::ListingRecord;
use crate::cli::OutputFormat;
use crate::detail::{DetailReport, SectionStatus};
use crate::error::{Result, TourError};
use crate::normalize::{extract_items, value_to_string, LookupTable};
use crate::pagination::PageView;
use crate::trend::{sparkline, TrendReport, TrendSummary};

/// Shown when a document has nothing left to display after filtering
pub const NOTHING_TO_SHOW: &str = "표시할 정보가 없습니다.";

/// Bookkeeping keys hidden from readable output and CSV exports
pub const EXCLUDED_KEYS: &[&str] = &[
    "createdtime",
    "modifiedtime",
    "cpyrhtDivCd",
    "areacode",
    "sigungucode",
    "lDongRegnCd",
    "lDongSignguCd",
    "lclsSystm1",
    "lclsSystm2",
    "lclsSystm3",
    "zipcode",
    "mapx",
    "mapy",
    "mlevel",
    "agelimit",
    "bookingplace",
    "placeinfo",
    "subevent",
    "program",
    "discountinfofestival",
    "spendtimefestival",
    "festivalgrade",
    "progresstype",
    "festivaltype",
    "serialnum",
    "infoname",
    "fldgubun",
];

const IMAGE_KEYS: [&str; 2] = ["firstimage", "firstimage2"];

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*?>").expect("valid tag regex"));
static HREF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href=["']([^"']*)["']"#).expect("valid href regex"));

/// Strip HTML tags and surrounding whitespace
pub fn clean_html(raw: &str) -> String {
    TAG_RE.replace_all(raw, "").trim().to_string()
}

/// Whether a key is hidden from readable output.
///
/// Identifier-like keys (containing `id`), category codes (`cat*`) and the
/// bookkeeping keys in [`EXCLUDED_KEYS`] are hidden; `eventenddate` is
/// always kept.
pub fn is_key_excluded(key: &str) -> bool {
    if key == "eventenddate" {
        return false;
    }
    if key.is_empty() {
        return true;
    }
    let lower = key.to_lowercase();
    lower.contains("id") || lower.starts_with("cat") || EXCLUDED_KEYS.contains(&key)
}

/// The link target of a homepage anchor, or the cleaned text when there is
/// no `href`
pub fn extract_homepage(raw: &str) -> String {
    match HREF_RE.captures(raw).and_then(|c| c.get(1)) {
        Some(url) => url.as_str().to_string(),
        None => clean_html(raw),
    }
}

/// Render the items of a catalog document as markdown.
///
/// Images come first as links, then `**key**: value` lines for every
/// displayable field; items are separated by `---`.
pub fn format_json_to_clean_string(doc: &Value) -> String {
    format_items(&extract_items(doc))
}

pub fn format_items(items: &[Map<String, Value>]) -> String {
    let mut blocks: Vec<String> = Vec::new();

    for item in items {
        let mut lines = Vec::new();
        for key in IMAGE_KEYS {
            if let Some(url) = item.get(key).and_then(value_to_string) {
                if url.contains("http") {
                    lines.push(format!("![{}]({})", key, url));
                }
            }
        }

        for (key, value) in item {
            if IMAGE_KEYS.contains(&key.as_str()) || is_key_excluded(key) {
                continue;
            }
            let Some(text) = value_to_string(value) else {
                continue;
            };
            let cleaned = if key == "homepage" {
                extract_homepage(&text)
            } else {
                clean_html(&text)
            };
            if !cleaned.is_empty() {
                lines.push(format!("**{}**: {}", key, cleaned));
            }
        }

        if !lines.is_empty() {
            blocks.push(lines.join("\n\n"));
        }
    }

    if blocks.is_empty() {
        NOTHING_TO_SHOW.to_string()
    } else {
        blocks.join("\n\n---\n\n")
    }
}

/// Address-like text of a listing from any source
fn record_address(record: &ListingRecord) -> String {
    ["addr1", "address", "snippet"]
        .iter()
        .find_map(|key| record.field(key))
        .map(|s| clean_html(&s))
        .unwrap_or_else(|| "-".to_string())
}

fn record_phone(record: &ListingRecord) -> String {
    ["tel", "phone"]
        .iter()
        .find_map(|key| record.field(key))
        .map(|s| clean_html(&s))
        .unwrap_or_else(|| "-".to_string())
}

pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Format one page of listings with its navigation state
    pub fn format_page(&self, view: &PageView) -> Result<String> {
        match self.format {
            OutputFormat::Table => Ok(self.format_page_table(view)),
            OutputFormat::Json => to_json(view),
            OutputFormat::Markdown => Ok(self.format_page_markdown(view)),
            OutputFormat::Csv => listings_csv(view.records(), row_offset(view)),
        }
    }

    /// Format a flat list of listings (nearby searches)
    pub fn format_listings(&self, heading: &str, table: &LookupTable) -> Result<String> {
        match self.format {
            OutputFormat::Table => {
                let mut result = format!(
                    "\n{} {} | Results: {}\n\n",
                    "📍".cyan(),
                    heading.bold(),
                    table.len().to_string().yellow()
                );
                result.push_str(&listings_table(table.records(), 0).to_string());
                append_collisions(&mut result, table);
                Ok(result)
            }
            OutputFormat::Json => to_json(table),
            OutputFormat::Markdown => {
                let mut result = format!("# {}\n\n", heading);
                result.push_str(&listings_markdown(table.records(), 0));
                Ok(result)
            }
            OutputFormat::Csv => listings_csv(table.records(), 0),
        }
    }

    /// Format an aggregated detail report
    pub fn format_detail(&self, report: &DetailReport) -> Result<String> {
        match self.format {
            OutputFormat::Table => Ok(self.format_detail_table(report)),
            OutputFormat::Json => to_json(report),
            OutputFormat::Markdown => {
                if report.is_empty() {
                    return Ok(String::new());
                }
                Ok(format!("# {}\n\n{}\n", report.title, report.to_markdown()))
            }
            OutputFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record(["항목", "내용"])?;
                for (key, value) in &report.fields {
                    if is_key_excluded(key) {
                        continue;
                    }
                    let cleaned = crate::export::clean_value(key, value);
                    wtr.write_record([key.as_str(), cleaned.as_str()])?;
                }
                finish_csv(wtr)
            }
        }
    }

    /// Format a list of names (sub-regions, festivals)
    pub fn format_names(&self, heading: &str, names: &[String]) -> Result<String> {
        match self.format {
            OutputFormat::Table => {
                let mut table = Table::new();
                table.set_header(vec![Cell::new("번호").fg(Color::Cyan), Cell::new(heading).fg(Color::Cyan)]);
                for (idx, name) in names.iter().enumerate() {
                    table.add_row(vec![Cell::new(idx + 1), Cell::new(name)]);
                }
                table.set_content_arrangement(ContentArrangement::Dynamic);
                Ok(table.to_string())
            }
            OutputFormat::Json => to_json(&names),
            OutputFormat::Markdown => Ok(format!(
                "# {}\n\n{}\n",
                heading,
                names.iter().map(|n| format!("- {}", n)).collect::<Vec<_>>().join("\n")
            )),
            OutputFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record([heading])?;
                for name in names {
                    wtr.write_record([name])?;
                }
                finish_csv(wtr)
            }
        }
    }

    /// Format festival overview/introduction
    pub fn format_festival(&self, info: &FestivalInfo) -> Result<String> {
        match self.format {
            OutputFormat::Table => Ok(format!(
                "\n{} {}\n{}\n{}\n{}\n\n{}\n{}\n",
                "🎉".cyan(),
                info.name.bold(),
                "=".repeat(80),
                "개요".bold(),
                info.overview,
                "소개".bold(),
                info.introduction
            )),
            OutputFormat::Json => to_json(info),
            OutputFormat::Markdown => Ok(format!(
                "# {}\n\n## 개요\n\n{}\n\n## 소개\n\n{}\n",
                info.name, info.overview, info.introduction
            )),
            OutputFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record(["이름", "개요", "소개"])?;
                wtr.write_record([&info.name, &info.overview, &info.introduction])?;
                finish_csv(wtr)
            }
        }
    }

    /// Format the outcome of a trend analysis
    pub fn format_trend(&self, report: &TrendReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record(["keyword", "eventstartdate", "eventenddate", "peak_period", "peak_ratio", "average"])?;
                for series in &report.series {
                    if let Some(summary) = TrendSummary::from_points(&series.window.keyword, &series.points) {
                        wtr.write_record([
                            summary.keyword.clone(),
                            series.window.event_start.to_string(),
                            series.window.event_end.to_string(),
                            summary.peak_period.clone(),
                            format!("{:.1}", summary.peak_ratio),
                            format!("{:.1}", summary.average),
                        ])?;
                    }
                }
                finish_csv(wtr)
            }
            OutputFormat::Table => {
                let mut table = Table::new();
                table.set_header(vec![
                    Cell::new("행사").fg(Color::Cyan),
                    Cell::new("기간").fg(Color::Cyan),
                    Cell::new("트렌드").fg(Color::Cyan),
                    Cell::new("최고").fg(Color::Cyan),
                ]);
                for series in &report.series {
                    let peak = TrendSummary::from_points(&series.window.keyword, &series.points)
                        .map(|s| format!("{} ({:.1})", s.peak_period, s.peak_ratio))
                        .unwrap_or_else(|| "-".to_string());
                    table.add_row(vec![
                        Cell::new(truncate_string(&series.window.keyword, 30)),
                        Cell::new(format!("{} ~ {}", series.window.event_start, series.window.event_end)),
                        Cell::new(truncate_string(&sparkline(&series.points), 40)),
                        Cell::new(peak),
                    ]);
                }
                table.set_content_arrangement(ContentArrangement::Dynamic);

                let mut result = format!("\n{} {}\n\n", "📈".cyan(), report.message);
                if !report.series.is_empty() {
                    result.push_str(&table.to_string());
                    result.push('\n');
                }
                Ok(result)
            }
            OutputFormat::Markdown => {
                let mut result = format!("# 트렌드 분석\n\n{}\n", report.message);
                for series in &report.series {
                    if let Some(summary) = TrendSummary::from_points(&series.window.keyword, &series.points) {
                        result.push_str(&format!("\n## {}\n\n{}\n", series.window.keyword, summary.to_markdown(&series.points)));
                    }
                }
                Ok(result)
            }
        }
    }

    fn format_page_table(&self, view: &PageView) -> String {
        let mut result = String::new();

        if let Some(error) = &view.error {
            result.push_str(&format!("\n{} {}\n", "⚠️".yellow(), error.red()));
        }

        result.push_str(&format!(
            "\n{} {} | Total: {} | Page: {}/{} | Results: {}\n\n",
            "📊".cyan(),
            view.filters.describe().bold(),
            view.total_count.to_string().yellow(),
            view.current_page.to_string().yellow(),
            view.total_pages.to_string().yellow(),
            view.records().len().to_string().yellow()
        ));

        result.push_str(&listings_table(view.records(), row_offset(view)).to_string());
        append_collisions(&mut result, &view.lookup);

        if view.nav.visible {
            result.push_str("\n\n");
            result.push_str(&navigation_line(view));
        }
        result
    }

    fn format_page_markdown(&self, view: &PageView) -> String {
        let mut result = String::from("# 검색 결과\n\n");
        result.push_str(&format!("- **조건**: {}\n", view.filters.describe()));
        result.push_str(&format!("- **총 결과**: {}\n", view.total_count));
        result.push_str(&format!("- **페이지**: {}/{}\n", view.current_page, view.total_pages));
        if let Some(error) = &view.error {
            result.push_str(&format!("- **오류**: {}\n", error));
        }
        result.push('\n');
        result.push_str(&listings_markdown(view.records(), row_offset(view)));
        result
    }

    fn format_detail_table(&self, report: &DetailReport) -> String {
        if report.is_empty() {
            return String::new();
        }

        let mut result = format!("\n{} {}\n", "📍".cyan(), report.title.bold());
        result.push_str(&"=".repeat(80));
        result.push('\n');

        if let Some(notice) = &report.notice {
            result.push_str(&format!("{}\n", notice.yellow()));
            return result;
        }

        for (i, section) in report.sections.iter().enumerate() {
            let badge = match &section.status {
                SectionStatus::Ok => "✅".to_string(),
                SectionStatus::Upstream { code, .. } => format!("⚠️ {}", code),
                SectionStatus::Failed { .. } => "❌".to_string(),
            };
            result.push_str(&format!("\n{} {} ({})\n", badge, section.label.bold(), section.endpoint));
            result.push_str(&"-".repeat(80));
            result.push('\n');
            result.push_str(&section.formatted);
            result.push('\n');

            if i == 0 {
                for block in &report.enrichment {
                    result.push('\n');
                    result.push_str(&"-".repeat(80));
                    result.push('\n');
                    result.push_str(block);
                    result.push('\n');
                }
            }
        }
        result
    }
}

fn row_offset(view: &PageView) -> u64 {
    u64::from(view.current_page.saturating_sub(1)) * u64::from(view.rows_per_page)
}

fn listings_table(records: &[ListingRecord], offset: u64) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("번호").fg(Color::Cyan),
        Cell::new("이름").fg(Color::Cyan),
        Cell::new("주소").fg(Color::Cyan),
        Cell::new("전화").fg(Color::Cyan),
    ]);

    for (idx, record) in records.iter().enumerate() {
        table.add_row(vec![
            Cell::new((offset + idx as u64 + 1).to_string()),
            Cell::new(truncate_string(&record.title, 40)),
            Cell::new(truncate_string(&record_address(record), 40)),
            Cell::new(record_phone(record)),
        ]);
    }

    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn listings_markdown(records: &[ListingRecord], offset: u64) -> String {
    let mut result = String::from("| 번호 | 이름 | 주소 | 전화 |\n|------|------|------|------|\n");
    for (idx, record) in records.iter().enumerate() {
        result.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            offset + idx as u64 + 1,
            escape_markdown(&record.title),
            escape_markdown(&record_address(record)),
            record_phone(record),
        ));
    }
    result
}

fn listings_csv(records: &[ListingRecord], offset: u64) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["번호", "이름", "주소", "전화", "contentid", "contenttypeid"])?;
    for (idx, record) in records.iter().enumerate() {
        wtr.write_record([
            (offset + idx as u64 + 1).to_string(),
            record.title.clone(),
            record_address(record),
            record_phone(record),
            record.content_id.clone().unwrap_or_default(),
            record.content_type_id.clone().unwrap_or_default(),
        ])?;
    }
    finish_csv(wtr)
}

fn append_collisions(result: &mut String, table: &LookupTable) {
    if table.collisions().is_empty() {
        return;
    }
    let hidden: Vec<&str> = table.collisions().iter().map(|r| r.title.as_str()).collect();
    result.push_str(&format!(
        "\n{} 같은 이름의 항목 {}개는 첫 번째 항목만 선택할 수 있습니다: {}",
        "ℹ️".cyan(),
        hidden.len(),
        hidden.join(", ")
    ));
}

/// `« ‹ [1] 2 3 4 5 › »`, with disabled controls dimmed
fn navigation_line(view: &PageView) -> String {
    let control = |label: &str, enabled: bool| {
        if enabled {
            label.bold().to_string()
        } else {
            label.dimmed().to_string()
        }
    };

    let pages: Vec<String> = view
        .window
        .pages()
        .into_iter()
        .map(|p| {
            if p == view.current_page {
                format!("[{}]", p).green().bold().to_string()
            } else {
                p.to_string()
            }
        })
        .collect();

    format!(
        "{} {} {} {} {}",
        control("«", view.nav.first),
        control("‹", view.nav.prev),
        pages.join(" "),
        control("›", view.nav.next),
        control("»", view.nav.last)
    )
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(TourError::Serialization)
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().map_err(|e| TourError::Other(e.to_string()))?;

    // Add BOM for Excel compatibility
    let mut result = vec![0xEF, 0xBB, 0xBF];
    result.extend_from_slice(&data);

    String::from_utf8(result).map_err(|e| TourError::Other(e.to_string()))
}

// Helper functions
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace('*', "\\*").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterSelection;
    use crate::api::types::SourceKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_clean_html() {
        assert_eq!(clean_html("  <b>경복궁</b> 야간<br/>개장 "), "경복궁 야간개장");
        assert_eq!(clean_html(""), "");
    }

    #[test]
    fn test_is_key_excluded() {
        assert!(is_key_excluded("contentid"));
        assert!(is_key_excluded("contentTypeId"));
        assert!(is_key_excluded("cat3"));
        assert!(is_key_excluded("mapx"));
        assert!(is_key_excluded(""));
        assert!(!is_key_excluded("eventenddate"));
        assert!(!is_key_excluded("overview"));
        assert!(!is_key_excluded("addr1"));
    }

    #[test]
    fn test_extract_homepage() {
        assert_eq!(
            extract_homepage("<a href=\"https://www.royalpalace.go.kr\" target=\"_blank\" title=\"새창\">www.royalpalace.go.kr</a>"),
            "https://www.royalpalace.go.kr"
        );
        assert_eq!(extract_homepage("<a href='http://a.kr'>a</a>"), "http://a.kr");
        assert_eq!(extract_homepage("<p>www.b.kr</p>"), "www.b.kr");
    }

    #[test]
    fn test_format_json_to_clean_string() {
        let doc = json!({
            "response": {"body": {"items": {"item": [
                {
                    "contentid": "126508",
                    "title": "경복궁",
                    "firstimage": "http://tong.visitkorea.or.kr/a.jpg",
                    "overview": "<p>조선 왕조의 법궁</p>",
                    "homepage": "<a href=\"https://www.royalpalace.go.kr\">홈</a>",
                    "mapx": "126.97",
                    "tel": ""
                },
                {"infoname": "입장료", "infotext": "3,000원"}
            ]}}}
        });
        assert_eq!(
            format_json_to_clean_string(&doc),
            "![firstimage](http://tong.visitkorea.or.kr/a.jpg)\n\n\
             **title**: 경복궁\n\n\
             **overview**: 조선 왕조의 법궁\n\n\
             **homepage**: https://www.royalpalace.go.kr\n\n---\n\n\
             **infotext**: 3,000원"
        );
        assert_eq!(format_json_to_clean_string(&json!({})), NOTHING_TO_SHOW);
        assert_eq!(
            format_json_to_clean_string(&json!({"response": {"body": {"items": {"item": {"contentid": "1"}}}}})),
            NOTHING_TO_SHOW
        );
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("짧은 이름", 10), "짧은 이름");
        assert_eq!(truncate_string("가나다라마바사아자차", 6), "가나다...");
    }

    fn view() -> PageView {
        let mut record = ListingRecord::new("경복궁", Some("126508".into()), Some("12".into()));
        record.fields.insert("addr1".into(), json!("서울특별시 종로구 사직로 161"));
        PageView {
            source: SourceKind::Tour,
            filters: FilterSelection::new("서울"),
            current_page: 2,
            total_pages: 10,
            total_count: 95,
            rows_per_page: 10,
            window: crate::pagination::PageWindow::compute(2, 10, 5),
            nav: crate::pagination::NavState::compute(2, 10),
            lookup: LookupTable::from_records(vec![record]),
            error: None,
        }
    }

    #[test]
    fn test_page_csv_numbers_rows_across_pages() {
        let csv = Formatter::new(OutputFormat::Csv).format_page(&view()).unwrap();
        let mut lines = csv.trim_start_matches('\u{feff}').lines();
        assert_eq!(lines.next(), Some("번호,이름,주소,전화,contentid,contenttypeid"));
        assert_eq!(lines.next(), Some("11,경복궁,서울특별시 종로구 사직로 161,-,126508,12"));
    }

    #[test]
    fn test_page_markdown() {
        let md = Formatter::new(OutputFormat::Markdown).format_page(&view()).unwrap();
        assert!(md.contains("- **페이지**: 2/10"));
        assert!(md.contains("| 11 | 경복궁 |"));
    }

    #[test]
    fn test_page_json_round_trips_fields() {
        let json = Formatter::new(OutputFormat::Json).format_page(&view()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_pages"], json!(10));
        assert_eq!(value["nav"]["first"], json!(true));
        assert_eq!(value["lookup"]["entries"][0]["title"], json!("경복궁"));
    }
}
