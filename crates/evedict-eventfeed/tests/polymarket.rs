//! Integration tests for `PolymarketClient` using wiremock HTTP mocks.

use chrono::{TimeZone, Utc};
use evedict_eventfeed::{FeedError, PolymarketClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> PolymarketClient {
    PolymarketClient::with_base_url(30, base_url).expect("client construction should not fail")
}

#[tokio::test]
async fn events_are_filtered_server_side_and_mapped() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        {
            "id": "903",
            "title": "Fed decision in March?",
            "description": "Resolves on the FOMC statement.",
            "startDate": "2024-02-27T16:00:00Z",
            "image": "https://polymarket-upload.s3.amazonaws.com/fed.png",
            "volume": 1_250_000.5,
            "tags": [
                { "id": "2", "label": "Economy" },
                { "id": 100, "label": "Fed Rates" }
            ],
            "markets": [
                {
                    "id": "253591",
                    "question": "Fed decreases interest rates by 25 bps after March 2024 meeting?",
                    "description": "",
                    "outcomes": "[\"Yes\", \"No\"]",
                    "outcomePrices": "[\"0.115\", \"0.885\"]",
                    "volume": "654321.12",
                    "volumeNum": 654_321.12,
                    "active": true,
                    "closed": false
                }
            ]
        },
        {
            "id": 904,
            "title": "Multi-market event",
            "volume": "7000",
            "markets": [
                { "id": 1, "question": "A?", "outcomes": ["Yes", "No"], "outcomePrices": ["0.5", "0.5"] },
                { "id": 2, "question": "B?", "volume": null, "volumeNum": 12.5 }
            ]
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/events"))
        .and(query_param("start_date_min", "2024-02-24T09:15:00Z"))
        .and(query_param("volume_min", "5000"))
        .and(query_param("closed", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let since = Utc.with_ymd_and_hms(2024, 2, 24, 9, 15, 0).unwrap();
    let events = test_client(&server.uri())
        .fetch_events_since(since)
        .await
        .expect("should parse events");

    assert_eq!(events.len(), 2);

    let fed = &events[0];
    assert_eq!(fed.id, "903");
    assert!(fed.is_single_market());
    assert!(fed.start_date.is_some());
    assert_eq!(fed.tag_labels(), vec!["Economy".to_string(), "Fed Rates".to_string()]);
    assert_eq!(fed.tags[1].id, "100");

    let snapshot = fed.snapshot().expect("has a market");
    assert_eq!(snapshot.external_id, "253591");
    assert_eq!(snapshot.volume, "654321.12");
    assert_eq!(
        snapshot.image_url.as_deref(),
        Some("https://polymarket-upload.s3.amazonaws.com/fed.png")
    );
    assert_eq!(snapshot.outcome_labels().unwrap(), vec!["Yes", "No"]);

    let multi = &events[1];
    assert_eq!(multi.id, "904");
    assert!((multi.volume - 7000.0).abs() < f64::EPSILON);
    assert!(!multi.is_single_market());
    assert_eq!(multi.markets[0].outcomes, r#"["Yes","No"]"#);
    assert_eq!(multi.markets[1].volume, "12.5");
    assert_eq!(multi.markets[1].outcomes, "[]");
}

#[tokio::test]
async fn server_error_maps_to_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .fetch_top_events()
        .await
        .unwrap_err();

    assert!(matches!(err, FeedError::UnexpectedStatus { status: 503, .. }));
}

#[tokio::test]
async fn non_array_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"events": []})))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .fetch_top_events()
        .await
        .unwrap_err();

    assert!(matches!(err, FeedError::Deserialize { .. }));
}
