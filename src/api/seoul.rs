use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::client::{parse_json, send_for_text, ClientConfig, ListingSource};
use super::deserializers::{number_or_string, single_or_vec};
use super::types::{ListingQuery, ListingRecord, PageFetch, SourceKind};
use super::ApiType;
use crate::error::{Result, TourError};
use crate::normalize::value_to_string;
use crate::progress::ProgressSink;

const BASE_URL: &str = "http://openapi.seoul.go.kr:8088";
const SERVICE: &str = "TbVwAttractions";
const SUCCESS_CODE: &str = "INFO-000";

/// Largest range the dataset serves in one call
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Deserialize)]
struct SeoulResponse {
    #[serde(rename = "TbVwAttractions")]
    attractions: Option<AttractionPage>,
    #[serde(rename = "RESULT")]
    result: Option<SeoulResult>,
}

#[derive(Debug, Deserialize)]
struct AttractionPage {
    #[serde(default, deserialize_with = "number_or_string")]
    list_total_count: u64,
    #[serde(rename = "RESULT")]
    result: Option<SeoulResult>,
    #[serde(default, deserialize_with = "single_or_vec")]
    row: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct SeoulResult {
    #[serde(rename = "CODE")]
    code: String,
    #[serde(rename = "MESSAGE", default)]
    message: String,
}

/// One attraction: the row as sent upstream and its listing form
#[derive(Debug, Clone, PartialEq)]
pub struct SeoulAttraction {
    pub raw: Map<String, Value>,
    pub record: ListingRecord,
}

/// Seoul open-data attractions client
pub struct SeoulClient {
    config: ClientConfig,
    http: Client,
}

impl SeoulClient {
    pub fn new(config: ClientConfig, http: Client) -> Self {
        Self { config, http }
    }

    /// Fetch rows `start..=end` (1-based, inclusive) and the dataset size
    async fn fetch_range(&self, start: u64, end: u64) -> Result<(Vec<Map<String, Value>>, u64)> {
        if !self.config.is_configured() {
            return Err(TourError::NoApiKey(ApiType::Seoul));
        }

        let path = format!("{}/json/{}/{}/{}/", self.config.api_key, SERVICE, start, end);
        let url = self.config.endpoint_url(BASE_URL, &path);
        debug!("GET {} rows {}-{}", SERVICE, start, end);

        let text = send_for_text(self.http.get(&url)).await?;
        let response: SeoulResponse = serde_json::from_value(parse_json(&text)?)?;

        match response.attractions {
            Some(page) => {
                if let Some(result) = page.result {
                    check_result(result)?;
                }
                Ok((page.row, page.list_total_count))
            }
            None => match response.result {
                Some(result) => {
                    check_result(result)?;
                    Err(TourError::Parse(format!("'{}' missing from response", SERVICE)))
                }
                None => Err(TourError::Parse(format!("'{}' missing from response", SERVICE))),
            },
        }
    }

    /// One page of processed attractions plus the dataset size
    pub async fn attractions(&self, page: u32, rows: u32) -> Result<(Vec<SeoulAttraction>, u64)> {
        let (start, end) = row_range(page, rows);
        let (raw, total) = self.fetch_range(start, end).await?;
        Ok((process_rows(raw), total))
    }

    /// Every attraction in the dataset, fetched [`MAX_PAGE_SIZE`] rows at a time.
    ///
    /// A page that fails is logged and skipped; only the initial count
    /// request is fatal.
    pub async fn fetch_all(&self, progress: &dyn ProgressSink) -> Result<Vec<SeoulAttraction>> {
        let (_, total) = self.fetch_range(1, 1).await?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let pages = total.div_ceil(u64::from(MAX_PAGE_SIZE));
        progress.stage("서울 관광명소 수집 중", pages);

        let mut rows = Vec::new();
        for page in 0..pages {
            let start = page * u64::from(MAX_PAGE_SIZE) + 1;
            let end = start + u64::from(MAX_PAGE_SIZE) - 1;
            debug!("Fetching page {}/{} (rows {}-{})", page + 1, pages, start, end);
            match self.fetch_range(start, end).await {
                Ok((page_rows, _)) => rows.extend(page_rows),
                Err(e) => warn!("Seoul page {} failed, skipping: {}", page + 1, e),
            }
            progress.advance(1);
        }

        info!("Fetched {} raw Seoul rows", rows.len());
        let attractions = process_rows(rows);
        progress.finish(&format!("{}개 관광명소 수집 완료", attractions.len()));
        Ok(attractions)
    }
}

#[async_trait]
impl ListingSource for SeoulClient {
    async fn fetch_page(&self, _query: &ListingQuery, page: u32, rows: u32) -> Result<PageFetch> {
        let (attractions, total_count) = self.attractions(page, rows).await?;
        Ok(PageFetch {
            records: attractions.into_iter().map(|a| a.record).collect(),
            total_count,
        })
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Seoul
    }
}

fn check_result(result: SeoulResult) -> Result<()> {
    if result.code == SUCCESS_CODE {
        return Ok(());
    }
    Err(TourError::ApiError {
        code: result.code,
        message: result.message,
        hint: Some("Check SEOUL_TOUR_API_KEY or run: tourlens config set seoul.key YOUR_KEY".to_string()),
    })
}

/// Inclusive 1-based row range of a page
pub fn row_range(page: u32, rows: u32) -> (u64, u64) {
    let page = u64::from(page.max(1));
    let rows = u64::from(rows);
    ((page - 1) * rows + 1, page * rows)
}

/// Turn raw rows into attractions.
///
/// Rows are published once per language. Korean rows are kept when there
/// are any; otherwise rows are de-duplicated by `POST_SN`, the last row of
/// a serial number replacing earlier ones in place.
pub fn process_rows(rows: Vec<Map<String, Value>>) -> Vec<SeoulAttraction> {
    let has_korean = rows
        .iter()
        .any(|r| r.get("LANG_CODE_ID").and_then(Value::as_str) == Some("ko"));

    let selected: Vec<Map<String, Value>> = if has_korean {
        rows.into_iter()
            .filter(|r| r.get("LANG_CODE_ID").and_then(Value::as_str) == Some("ko"))
            .collect()
    } else {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut unique: Vec<Map<String, Value>> = Vec::new();
        for row in rows {
            let key = row.get("POST_SN").and_then(value_to_string).unwrap_or_default();
            match index.get(&key) {
                Some(&i) => unique[i] = row,
                None => {
                    index.insert(key, unique.len());
                    unique.push(row);
                }
            }
        }
        unique
    };

    selected
        .into_iter()
        .filter_map(|raw| {
            let record = attraction_record(&raw)?;
            Some(SeoulAttraction { raw, record })
        })
        .collect()
}

fn attraction_record(raw: &Map<String, Value>) -> Option<ListingRecord> {
    let text = |key: &str| raw.get(key).and_then(value_to_string);

    let title = text("POST_SJ")?.trim().to_string();
    let content_id = text("POST_SN");

    let mut fields = Map::new();
    let address = text("NEW_ADDRESS").or_else(|| text("ADDRESS"));
    for (key, value) in [
        ("contentid", content_id.clone()),
        ("title", Some(title.clone())),
        ("addr1", address),
        ("tel", text("CMMN_TELNO")),
        ("tags", text("TAG")),
    ] {
        if let Some(value) = value {
            fields.insert(key.to_string(), Value::String(value));
        }
    }

    Some(ListingRecord {
        title,
        content_id,
        content_type_id: None,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(sn: &str, lang: &str, title: &str) -> Map<String, Value> {
        json!({
            "POST_SN": sn,
            "LANG_CODE_ID": lang,
            "POST_SJ": title,
            "ADDRESS": "서울 중구",
            "NEW_ADDRESS": "",
            "CMMN_TELNO": "02-000-0000",
            "TAG": "궁궐"
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_row_range() {
        assert_eq!(row_range(1, 10), (1, 10));
        assert_eq!(row_range(3, 10), (21, 30));
        assert_eq!(row_range(0, 12), (1, 12));
    }

    #[test]
    fn test_korean_rows_preferred() {
        let rows = vec![
            row("1", "en", "Gyeongbokgung"),
            row("1", "ko", "경복궁"),
            row("2", "ja", "昌徳宮"),
            row("2", "ko", "창덕궁"),
        ];
        let titles: Vec<String> = process_rows(rows).into_iter().map(|a| a.record.title).collect();
        assert_eq!(titles, vec!["경복궁", "창덕궁"]);
    }

    #[test]
    fn test_dedup_by_serial_when_no_korean_rows() {
        let rows = vec![
            row("1", "en", "Gyeongbokgung"),
            row("2", "en", "Changdeokgung"),
            row("1", "ja", "景福宮"),
        ];
        let processed = process_rows(rows);
        let titles: Vec<&str> = processed.iter().map(|a| a.record.title.as_str()).collect();
        assert_eq!(titles, vec!["景福宮", "Changdeokgung"]);
    }

    #[test]
    fn test_processed_fields() {
        let processed = process_rows(vec![row("7", "ko", "덕수궁")]);
        let attraction = &processed[0];
        assert_eq!(attraction.record.content_id.as_deref(), Some("7"));
        // NEW_ADDRESS is blank so ADDRESS is used
        assert_eq!(attraction.record.field("addr1").as_deref(), Some("서울 중구"));
        assert_eq!(attraction.record.field("tags").as_deref(), Some("궁궐"));
        assert_eq!(attraction.raw.get("LANG_CODE_ID"), Some(&json!("ko")));
    }

    #[test]
    fn test_error_result_is_api_error() {
        let err = check_result(SeoulResult {
            code: "INFO-100".into(),
            message: "인증키가 유효하지 않습니다.".into(),
        })
        .unwrap_err();
        assert!(matches!(err, TourError::ApiError { ref code, .. } if code == "INFO-100"));
    }
}
