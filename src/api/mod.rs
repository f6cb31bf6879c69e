pub mod client;
pub mod deserializers;
pub mod http_client;
pub mod naver;
pub mod seoul;
pub mod serp;
pub mod tour;
pub mod types;

pub use client::{search_by_location, ApiClientFactory, ClientConfig, ListingSource, NearbySource};
pub use naver::{NaverClient, ReviewSource};

use std::fmt;

/// Upstream services the CLI talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiType {
    /// KorService2 tourism catalog (한국관광공사 TourAPI)
    Tour,
    /// Seoul open-data attractions dataset (서울 열린데이터광장)
    Seoul,
    /// SerpAPI web search
    Serp,
    /// Naver blog search
    NaverBlog,
    /// Naver datalab search trend
    NaverTrend,
}

impl ApiType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tour" | "tourapi" | "catalog" => Some(Self::Tour),
            "seoul" => Some(Self::Seoul),
            "serp" | "serpapi" | "web" => Some(Self::Serp),
            "blog" | "naver-blog" => Some(Self::NaverBlog),
            "trend" | "naver-trend" | "datalab" => Some(Self::NaverTrend),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tour => "tour",
            Self::Seoul => "seoul",
            Self::Serp => "serp",
            Self::NaverBlog => "naver-blog",
            Self::NaverTrend => "naver-trend",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Tour => "한국관광공사 TourAPI",
            Self::Seoul => "서울 열린데이터광장",
            Self::Serp => "SerpAPI",
            Self::NaverBlog => "네이버 블로그 검색",
            Self::NaverTrend => "네이버 데이터랩",
        }
    }

    /// Configuration key holding this API's credential
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Tour => "tour.key",
            Self::Seoul => "seoul.key",
            Self::Serp => "serp.key",
            Self::NaverBlog => "naver.blog.client_id",
            Self::NaverTrend => "naver.trend.client_id",
        }
    }

    pub fn signup_url(&self) -> &'static str {
        match self {
            Self::Tour => "https://www.data.go.kr",
            Self::Seoul => "https://data.seoul.go.kr",
            Self::Serp => "https://serpapi.com",
            Self::NaverBlog | Self::NaverTrend => "https://developers.naver.com",
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
