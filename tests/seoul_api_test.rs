use mockito::{Server, ServerGuard};
use pretty_assertions::assert_eq;
use reqwest::Client;
use serde_json::{json, Value};

use tourlens::api::client::ClientConfig;
use tourlens::api::seoul::SeoulClient;
use tourlens::filters::{FilterSelection, NoFilters};
use tourlens::pagination::Paginator;
use tourlens::progress::NoProgress;

const KEY: &str = "seoul-key";

fn client(server: &ServerGuard) -> SeoulClient {
    let config = ClientConfig {
        api_key: KEY.to_string(),
        base_url: Some(server.url()),
        ..Default::default()
    };
    SeoulClient::new(config, Client::new())
}

fn body(rows: Value, total: u64) -> String {
    json!({
        "TbVwAttractions": {
            "list_total_count": total,
            "RESULT": {"CODE": "INFO-000", "MESSAGE": "정상 처리되었습니다"},
            "row": rows
        }
    })
    .to_string()
}

fn row(sn: &str, lang: &str, title: &str) -> Value {
    json!({
        "POST_SN": sn,
        "LANG_CODE_ID": lang,
        "POST_SJ": title,
        "NEW_ADDRESS": "서울특별시 중구 세종대로 99",
        "CMMN_TELNO": "02-771-9955",
        "TAG": "궁궐,야경"
    })
}

#[tokio::test]
async fn test_page_keeps_korean_rows() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", format!("/{}/json/TbVwAttractions/11/20/", KEY).as_str())
        .with_status(200)
        .with_body(body(
            json!([
                row("KOP000072", "ko", "덕수궁"),
                row("KOP000072", "en", "Deoksugung Palace"),
                row("KOP000073", "ko", "서울시립미술관")
            ]),
            2450,
        ))
        .create_async()
        .await;

    let seoul = client(&server);
    let view = Paginator::new(&seoul, &NoFilters)
        .compute_page(&FilterSelection::default(), 2)
        .await;

    assert_eq!(view.error, None);
    assert_eq!(view.total_pages, 245);
    assert_eq!(view.lookup.titles(), vec!["덕수궁", "서울시립미술관"]);
    let record = view.lookup.get("덕수궁").unwrap();
    assert_eq!(record.field("addr1").as_deref(), Some("서울특별시 중구 세종대로 99"));
    assert_eq!(record.field("tags").as_deref(), Some("궁궐,야경"));
}

#[tokio::test]
async fn test_result_code_error_falls_back() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", format!("/{}/json/TbVwAttractions/1/10/", KEY).as_str())
        .with_status(200)
        .with_body(r#"{"RESULT":{"CODE":"INFO-100","MESSAGE":"인증키가 유효하지 않습니다."}}"#)
        .create_async()
        .await;

    let seoul = client(&server);
    let view = Paginator::new(&seoul, &NoFilters)
        .compute_page(&FilterSelection::default(), 1)
        .await;

    assert!(view.is_fallback());
    assert!(view.error.unwrap().contains("INFO-100"));
}

#[tokio::test]
async fn test_fetch_all_skips_failed_page() {
    let mut server = Server::new_async().await;
    let _count = server
        .mock("GET", format!("/{}/json/TbVwAttractions/1/1/", KEY).as_str())
        .with_status(200)
        .with_body(body(json!([row("A", "ko", "남산서울타워")]), 1500))
        .create_async()
        .await;
    let _first = server
        .mock("GET", format!("/{}/json/TbVwAttractions/1/1000/", KEY).as_str())
        .with_status(200)
        .with_body(body(
            json!([row("A", "en", "N Seoul Tower"), row("B", "en", "Namsangol"), row("A", "en", "N Seoul Tower (updated)")]),
            1500,
        ))
        .create_async()
        .await;
    let _second = server
        .mock("GET", format!("/{}/json/TbVwAttractions/1001/2000/", KEY).as_str())
        .with_status(500)
        .create_async()
        .await;

    let seoul = client(&server);
    let attractions = seoul.fetch_all(&NoProgress).await.unwrap();

    let titles: Vec<&str> = attractions.iter().map(|a| a.record.title.as_str()).collect();
    assert_eq!(titles, vec!["N Seoul Tower (updated)", "Namsangol"]);
    assert_eq!(attractions[0].raw["POST_SN"], json!("A"));
}
