use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::client::{parse_json, send_for_text, ClientConfig};
use super::types::{BlogReview, TrendPoint};
use super::ApiType;
use crate::error::{Result, TourError};
use crate::output::formatter::clean_html;

const BASE_URL: &str = "https://openapi.naver.com";
const BLOG_PATH: &str = "v1/search/blog.json";
const DATALAB_PATH: &str = "v1/datalab/search";

#[derive(Debug, Deserialize)]
struct BlogSearchResponse {
    #[serde(default)]
    items: Vec<RawBlogItem>,
}

#[derive(Debug, Deserialize)]
struct RawBlogItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    postdate: String,
}

#[derive(Debug, Deserialize)]
struct TrendResponse {
    #[serde(default)]
    results: Vec<TrendGroup>,
}

#[derive(Debug, Deserialize)]
struct TrendGroup {
    #[serde(default)]
    data: Vec<TrendPoint>,
}

/// Review and popularity lookups used to enrich details
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn blog_reviews(&self, query: &str, display: u32) -> Result<Vec<BlogReview>>;
    async fn search_trend(&self, keyword: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<TrendPoint>>;
}

/// Naver open API client.
///
/// Blog search and datalab are separate applications on the Naver side,
/// each with its own client id/secret pair.
pub struct NaverClient {
    blog: ClientConfig,
    trend: ClientConfig,
    http: Client,
}

impl NaverClient {
    pub fn new(blog: ClientConfig, trend: ClientConfig, http: Client) -> Self {
        Self { blog, trend, http }
    }

    fn credentials(config: &ClientConfig, api: ApiType) -> Result<(&str, &str)> {
        match config.api_secret.as_deref() {
            Some(secret) if config.is_configured() && !secret.trim().is_empty() => {
                Ok((config.api_key.as_str(), secret))
            }
            _ => Err(TourError::NoApiKey(api)),
        }
    }

    /// Blog posts for `query`, most relevant first. HTML is stripped from
    /// titles and descriptions.
    pub async fn search_blog(&self, query: &str, display: u32) -> Result<Vec<BlogReview>> {
        let (id, secret) = Self::credentials(&self.blog, ApiType::NaverBlog)?;
        let url = self.blog.endpoint_url(BASE_URL, BLOG_PATH);
        debug!("Blog search '{}' ({} posts)", query, display);

        let request = self
            .http
            .get(&url)
            .header("X-Naver-Client-Id", id)
            .header("X-Naver-Client-Secret", secret)
            .query(&[("query", query.to_string()), ("display", display.to_string()), ("sort", "sim".to_string())]);

        let text = send_for_text(request).await?;
        let response: BlogSearchResponse = serde_json::from_value(parse_json(&text)?)?;

        Ok(response
            .items
            .into_iter()
            .map(|item| BlogReview {
                title: clean_html(&item.title),
                description: clean_html(&item.description),
                link: item.link,
                postdate: item.postdate,
            })
            .collect())
    }

    /// Daily relative search volume for `keyword` between two dates
    /// (inclusive). An empty result set yields an empty series.
    pub async fn datalab_trend(&self, keyword: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<TrendPoint>> {
        let (id, secret) = Self::credentials(&self.trend, ApiType::NaverTrend)?;
        let url = self.trend.endpoint_url(BASE_URL, DATALAB_PATH);

        let body = json!({
            "startDate": start.format("%Y-%m-%d").to_string(),
            "endDate": end.format("%Y-%m-%d").to_string(),
            "timeUnit": "date",
            "keywordGroups": [{"groupName": keyword, "keywords": [keyword]}],
        });
        debug!("Datalab trend '{}' {} ~ {}", keyword, start, end);

        let request = self
            .http
            .post(&url)
            .header("X-Naver-Client-Id", id)
            .header("X-Naver-Client-Secret", secret)
            .json(&body);

        let text = send_for_text(request).await?;
        let response: TrendResponse = serde_json::from_value(parse_json(&text)?)?;

        Ok(response
            .results
            .into_iter()
            .next()
            .map(|group| group.data)
            .unwrap_or_default())
    }
}

#[async_trait]
impl ReviewSource for NaverClient {
    async fn blog_reviews(&self, query: &str, display: u32) -> Result<Vec<BlogReview>> {
        self.search_blog(query, display).await
    }

    async fn search_trend(&self, keyword: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<TrendPoint>> {
        self.datalab_trend(keyword, start, end).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credentials() {
        let client = NaverClient::new(
            ClientConfig::with_key("id-only"),
            ClientConfig::default(),
            Client::new(),
        );

        let err = client.search_blog("경복궁 후기", 3).await.unwrap_err();
        assert!(matches!(err, TourError::NoApiKey(ApiType::NaverBlog)));

        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let err = client.datalab_trend("경복궁", day, day).await.unwrap_err();
        assert!(matches!(err, TourError::NoApiKey(ApiType::NaverTrend)));
    }

    #[test]
    fn test_trend_response_shapes() {
        let full: TrendResponse = serde_json::from_str(
            r#"{"results":[{"title":"경복궁","data":[{"period":"2025-01-01","ratio":12.5}]}]}"#,
        )
        .unwrap();
        assert_eq!(full.results[0].data[0].ratio, 12.5);

        let empty: TrendResponse = serde_json::from_str(r#"{"startDate":"2025-01-01"}"#).unwrap();
        assert!(empty.results.is_empty());
    }
}
