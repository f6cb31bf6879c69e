use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};

use super::client::{parse_json, send_for_text, ClientConfig, ListingSource, NearbySource};
use super::types::{Coordinates, ListingQuery, ListingRecord, PageFetch, SourceKind};
use super::ApiType;
use crate::error::{Result, TourError};
use crate::normalize::value_to_string;

const BASE_URL: &str = "https://serpapi.com";
const SEARCH_PATH: &str = "search.json";

/// Query used for nearby web searches
pub const NEARBY_QUERY: &str = "주변 관광지";
/// Default query for festival discovery
pub const DEFAULT_FESTIVAL_QUERY: &str = "2025 서울 행사";
/// Shown when the knowledge graph lacks a section
pub const NO_INFO: &str = "정보를 찾을 수 없습니다.";

/// Overview and introduction of a festival, from the knowledge graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FestivalInfo {
    pub name: String,
    pub overview: String,
    pub introduction: String,
}

/// SerpAPI web-search client
pub struct SerpClient {
    config: ClientConfig,
    http: Client,
}

impl SerpClient {
    pub fn new(config: ClientConfig, http: Client) -> Self {
        Self { config, http }
    }

    /// Run a search. `engine` defaults to `google` unless `params` sets one.
    pub async fn search(&self, params: &[(&'static str, String)]) -> Result<Value> {
        if !self.config.is_configured() {
            return Err(TourError::NoApiKey(ApiType::Serp));
        }

        let mut all_params: Vec<(&str, String)> = vec![
            ("api_key", self.config.api_key.clone()),
            ("gl", "kr".to_string()),
            ("hl", "ko".to_string()),
        ];
        if !params.iter().any(|(k, _)| *k == "engine") {
            all_params.push(("engine", "google".to_string()));
        }
        all_params.extend_from_slice(params);

        let url = self.config.endpoint_url(BASE_URL, SEARCH_PATH);
        debug!("SerpAPI search {:?}", params);

        let text = send_for_text(self.http.get(&url).query(&all_params)).await?;
        let doc = parse_json(&text)?;

        if let Some(message) = doc.get("error").and_then(Value::as_str) {
            return Err(TourError::ApiError {
                code: "SERPAPI".to_string(),
                message: message.to_string(),
                hint: None,
            });
        }
        Ok(doc)
    }

    /// Places around a point
    pub async fn nearby(&self, at: Coordinates) -> Result<Vec<ListingRecord>> {
        let params = [
            ("q", NEARBY_QUERY.to_string()),
            ("ll", format!("@{},{},15z", at.latitude, at.longitude)),
        ];
        let doc = self.search(&params).await?;
        Ok(place_records(&doc))
    }

    /// Re-search a title and return the raw result document
    pub async fn search_title(&self, title: &str) -> Result<Value> {
        self.search(&[("q", title.to_string())]).await
    }

    /// Festival names from the Naver engine's local results, de-duplicated
    /// in first-seen order
    pub async fn festivals(&self, query: &str) -> Result<Vec<String>> {
        let doc = self
            .search(&[("engine", "naver".to_string()), ("query", query.to_string())])
            .await?;

        let mut titles: Vec<String> = Vec::new();
        for place in local_places(&doc).unwrap_or_default() {
            if let Some(title) = place.get("title").and_then(value_to_string) {
                if !titles.contains(&title) {
                    titles.push(title);
                }
            }
        }
        info!("Found {} festival(s) for '{}'", titles.len(), query);
        Ok(titles)
    }

    /// Overview and introduction for one festival
    pub async fn festival_info(&self, name: &str) -> Result<FestivalInfo> {
        let query = format!("\"{}\" 기본정보", name);
        let doc = self
            .search(&[("engine", "naver".to_string()), ("query", query)])
            .await?;
        Ok(festival_info_from(name, &doc))
    }
}

#[async_trait]
impl NearbySource for SerpClient {
    async fn nearby_listings(&self, at: Coordinates) -> Result<Vec<ListingRecord>> {
        self.nearby(at).await
    }
}

#[async_trait]
impl ListingSource for SerpClient {
    async fn fetch_page(&self, query: &ListingQuery, page: u32, rows: u32) -> Result<PageFetch> {
        let keyword = query
            .keyword
            .clone()
            .ok_or_else(|| TourError::InvalidInput("검색어가 없습니다.".to_string()))?;

        let start = result_offset(page, rows);
        let params = [("q", keyword), ("start", start.to_string()), ("num", rows.to_string())];
        let doc = self.search(&params).await?;

        Ok(PageFetch {
            records: place_records(&doc),
            total_count: total_results(&doc),
        })
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Serp
    }
}

/// Zero-based `start` offset of a 1-based page
pub fn result_offset(page: u32, rows: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(rows)
}

fn local_places(doc: &Value) -> Option<Vec<Map<String, Value>>> {
    doc.pointer("/local_results/places")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(|v| v.as_object().cloned()).collect())
}

/// Result entries: local places when present, organic results otherwise
pub fn places(doc: &Value) -> Vec<Map<String, Value>> {
    local_places(doc).unwrap_or_else(|| {
        doc.get("organic_results")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(|v| v.as_object().cloned()).collect())
            .unwrap_or_default()
    })
}

/// Places with a title, as listing records
pub fn place_records(doc: &Value) -> Vec<ListingRecord> {
    places(doc)
        .into_iter()
        .filter_map(|place| {
            let title = place.get("title").and_then(value_to_string)?;
            Some(ListingRecord {
                title: title.trim().to_string(),
                content_id: place.get("place_id").and_then(value_to_string),
                content_type_id: None,
                fields: place,
            })
        })
        .collect()
}

/// `search_information.total_results`, 0 when absent
pub fn total_results(doc: &Value) -> u64 {
    match doc.pointer("/search_information/total_results") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().replace(',', "").parse().unwrap_or(0),
        _ => 0,
    }
}

/// Build festival info from a knowledge graph.
///
/// The overview lists every string field other than `title` and
/// `description` as `Key: value`; the introduction is the description.
pub fn festival_info_from(name: &str, doc: &Value) -> FestivalInfo {
    let Some(kg) = doc.get("knowledge_graph").and_then(Value::as_object) else {
        return FestivalInfo {
            name: name.to_string(),
            overview: NO_INFO.to_string(),
            introduction: NO_INFO.to_string(),
        };
    };

    let overview_lines: Vec<String> = kg
        .iter()
        .filter(|(key, _)| key.as_str() != "title" && key.as_str() != "description")
        .filter_map(|(key, value)| value.as_str().map(|v| format!("{}: {}", capitalize(key), v)))
        .collect();

    let overview = if overview_lines.is_empty() {
        "개요 정보를 찾을 수 없습니다.".to_string()
    } else {
        overview_lines.join("\n")
    };

    let introduction = kg
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| "소개 정보를 찾을 수 없습니다.".to_string());

    FestivalInfo {
        name: name.to_string(),
        overview,
        introduction,
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_offset() {
        assert_eq!(result_offset(1, 10), 0);
        assert_eq!(result_offset(0, 10), 0);
        assert_eq!(result_offset(3, 10), 20);
        assert_eq!(result_offset(u32::MAX, 10), (u64::from(u32::MAX) - 1) * 10);
    }

    #[test]
    fn test_local_places_preferred_over_organic() {
        let doc = json!({
            "local_results": {"places": [{"title": "남산서울타워", "place_id": "p1"}, {"rating": 4.5}]},
            "organic_results": [{"title": "무시됨"}]
        });
        let records = place_records(&doc);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "남산서울타워");
        assert_eq!(records[0].content_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_organic_fallback_and_total() {
        let doc = json!({
            "organic_results": [{"title": "서울 가볼만한 곳 10선", "link": "https://example.com"}],
            "search_information": {"total_results": 1230}
        });
        assert_eq!(place_records(&doc)[0].title, "서울 가볼만한 곳 10선");
        assert_eq!(total_results(&doc), 1230);
        assert_eq!(total_results(&json!({})), 0);
        assert!(place_records(&json!({})).is_empty());
    }

    #[test]
    fn test_festival_info_from_knowledge_graph() {
        let doc = json!({
            "knowledge_graph": {
                "title": "서울빛초롱축제",
                "description": "청계천 일대에서 열리는 등불 축제",
                "period": "2025.12.12 ~ 2026.01.04",
                "PLACE": "청계천",
                "images": ["a.png"]
            }
        });
        let info = festival_info_from("서울빛초롱축제", &doc);
        assert_eq!(info.overview, "Period: 2025.12.12 ~ 2026.01.04\nPlace: 청계천");
        assert_eq!(info.introduction, "청계천 일대에서 열리는 등불 축제");
    }

    #[test]
    fn test_festival_info_without_knowledge_graph() {
        let info = festival_info_from("없는축제", &json!({"organic_results": []}));
        assert_eq!(info.overview, NO_INFO);
        assert_eq!(info.introduction, NO_INFO);

        let info = festival_info_from("x", &json!({"knowledge_graph": {"title": "x"}}));
        assert_eq!(info.overview, "개요 정보를 찾을 수 없습니다.");
        assert_eq!(info.introduction, "소개 정보를 찾을 수 없습니다.");
    }

    #[tokio::test]
    async fn test_missing_key() {
        let client = SerpClient::new(ClientConfig::default(), Client::new());
        let err = client.search(&[]).await.unwrap_err();
        assert!(matches!(err, TourError::NoApiKey(ApiType::Serp)));
    }
}
