use chrono::NaiveDate;
use mockito::{Matcher, Server, ServerGuard};
use pretty_assertions::assert_eq;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

use tourlens::api::client::ClientConfig;
use tourlens::api::tour::TourApiClient;
use tourlens::api::NaverClient;
use tourlens::export::{ExportOutcome, Exporter};
use tourlens::filters::{CatalogFilterResolver, FilterSelection};
use tourlens::trend::{TrendAnalyzer, FESTIVAL_CSV, TREND_CSV};

fn catalog_body(items: Value, total: u64) -> String {
    json!({
        "response": {
            "header": {"resultCode": "0000", "resultMsg": "OK"},
            "body": {"items": {"item": items}, "totalCount": total}
        }
    })
    .to_string()
}

fn tour(server: &ServerGuard) -> TourApiClient {
    let config = ClientConfig {
        api_key: "k".to_string(),
        base_url: Some(server.url()),
        ..Default::default()
    };
    TourApiClient::new(config, Client::new())
}

fn read_csv(path: &Path) -> String {
    let bytes = fs::read(path).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"), "missing BOM in {}", path.display());
    String::from_utf8(bytes[3..].to_vec()).unwrap()
}

#[tokio::test]
async fn test_export_all_walks_pages_and_skips_failed_items() {
    let mut server = Server::new_async().await;
    let _count = server
        .mock("GET", "/areaBasedList2")
        .match_query(Matcher::UrlEncoded("numOfRows".into(), "1".into()))
        .with_status(200)
        .with_body(catalog_body(json!({"title": "경복궁", "contentid": "1"}), 2))
        .create_async()
        .await;
    let _list = server
        .mock("GET", "/areaBasedList2")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("numOfRows".into(), "100".into()),
            Matcher::UrlEncoded("pageNo".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(catalog_body(
            json!([
                {"title": "경복궁", "contentid": "1", "contenttypeid": "12", "addr1": "서울 종로구", "mapx": "126.97"},
                {"title": "창덕궁", "contentid": "2", "contenttypeid": "12", "addr1": "서울 종로구"}
            ]),
            2,
        ))
        .create_async()
        .await;
    let _common = server
        .mock("GET", "/detailCommon2")
        .match_query(Matcher::UrlEncoded("contentId".into(), "1".into()))
        .with_status(200)
        .with_body(catalog_body(
            json!({
                "contentid": "1",
                "title": "경복궁",
                "overview": "<p>조선의 법궁</p>",
                "homepage": "<a href=\"https://www.royalpalace.go.kr\" target=\"_blank\">홈페이지</a>"
            }),
            1,
        ))
        .create_async()
        .await;
    let _common_failed = server
        .mock("GET", "/detailCommon2")
        .match_query(Matcher::UrlEncoded("contentId".into(), "2".into()))
        .with_status(500)
        .create_async()
        .await;
    let _intro = server
        .mock("GET", "/detailIntro2")
        .match_query(Matcher::UrlEncoded("contentId".into(), "1".into()))
        .with_status(200)
        .with_body(catalog_body(json!({"contentid": "1", "usetime": "09:00~18:00<br>"}), 1))
        .create_async()
        .await;
    let _info = server
        .mock("GET", "/detailInfo2")
        .match_query(Matcher::UrlEncoded("contentId".into(), "1".into()))
        .with_status(200)
        .with_body(catalog_body(
            json!([
                {"infoname": "입장료", "infotext": "3000원", "serialnum": "0"},
                {"infoname": "주차", "infotext": "불가", "serialnum": "1"}
            ]),
            2,
        ))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = tour(&server);
    let resolver = CatalogFilterResolver::new(&client);

    let outcome = Exporter::new(&client, &client, &resolver, dir.path())
        .export_all(&FilterSelection::new("서울"))
        .await
        .unwrap();

    let ExportOutcome::Written { path, rows } = outcome else {
        panic!("expected a written export, got {:?}", outcome);
    };
    assert_eq!(rows, 2);
    assert!(path.starts_with(dir.path()));
    assert_eq!(
        read_csv(&path),
        "title,addr1,overview,homepage,usetime,infotext\n\
         경복궁,서울 종로구,조선의 법궁,https://www.royalpalace.go.kr,09:00~18:00,3000원\n\
         경복궁,서울 종로구,조선의 법궁,https://www.royalpalace.go.kr,09:00~18:00,불가\n"
    );
}

#[tokio::test]
async fn test_export_without_matches_writes_nothing() {
    let mut server = Server::new_async().await;
    let _count = server
        .mock("GET", "/areaBasedList2")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(catalog_body(json!(""), 0))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = tour(&server);
    let resolver = CatalogFilterResolver::new(&client);

    let outcome = Exporter::new(&client, &client, &resolver, dir.path())
        .export_all(&FilterSelection::new("울릉도").with_category(Some("숙박".into())))
        .await;
    assert!(outcome.is_err());

    let outcome = Exporter::new(&client, &client, &resolver, dir.path())
        .export_all(&FilterSelection::new("경상북도").with_category(Some("숙박".into())))
        .await
        .unwrap();
    assert_eq!(outcome, ExportOutcome::NoData);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

fn festival(title: &str, start: &str, end: &str) -> Map<String, Value> {
    json!({"title": title, "contentid": "9", "eventstartdate": start, "eventenddate": end})
        .as_object()
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn test_trend_analysis_writes_both_files() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/datalab/search")
        .match_body(Matcher::PartialJson(json!({
            "startDate": "2025-01-30",
            "endDate": "2025-04-09",
            "keywordGroups": [{"groupName": "서울빛초롱축제"}]
        })))
        .with_status(200)
        .with_body(
            json!({"results": [{"data": [
                {"period": "2025-03-01", "ratio": 100},
                {"period": "2025-03-02", "ratio": 12.5}
            ]}]})
            .to_string(),
        )
        .create_async()
        .await;

    let app = ClientConfig {
        api_key: "id".to_string(),
        api_secret: Some("secret".to_string()),
        base_url: Some(server.url()),
        ..Default::default()
    };
    let naver = NaverClient::new(app.clone(), app, Client::new());
    let dir = tempfile::tempdir().unwrap();

    let rows = vec![
        festival("서울빛초롱축제", "20250301", "20250310"),
        festival("미래 축제", "20251201", "20251210"),
        festival("날짜 없음", "", ""),
    ];
    let report = TrendAnalyzer::new(&naver, dir.path())
        .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
        .analyze(&rows)
        .await
        .unwrap();

    assert_eq!(report.series.len(), 1);
    assert!(report.message.starts_with("분석 완료! 1개 항목"));

    let festivals = read_csv(&dir.path().join(FESTIVAL_CSV));
    assert_eq!(festivals.lines().next(), Some("title,eventstartdate,eventenddate"));
    assert_eq!(festivals.lines().count(), 4);

    assert_eq!(
        read_csv(&dir.path().join(TREND_CSV)),
        "period,ratio,keyword,eventstartdate,eventenddate\n\
         2025-03-01,100.0,서울빛초롱축제,2025-03-01,2025-03-10\n\
         2025-03-02,12.5,서울빛초롱축제,2025-03-01,2025-03-10\n"
    );
}
