//! Integration tests for the Facebook Graph adapter.

use std::collections::HashMap;

use placegrab_core::{AppConfig, Term};
use placegrab_providers::{ApiClient, FacebookAdapter, Provider};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client() -> ApiClient {
    let config = AppConfig {
        input_dir: ".".into(),
        request_timeout_secs: 5,
        max_attempts: 1,
        request_delay_ms: 0,
        user_agent: "placegrab-test/0.1".to_owned(),
        log_level: "info".to_owned(),
    };
    ApiClient::new(&config).unwrap()
}

fn test_keys() -> HashMap<String, String> {
    HashMap::from([("access_token".to_owned(), "tok".to_owned())])
}

// ---------------------------------------------------------------------------
// Search then per-place detail calls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_defaults_limit_and_fetches_details() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3.2/search"))
        .and(query_param("q", "market"))
        .and(query_param("type", "place"))
        .and(query_param("limit", "100"))
        .and(query_param("center", "52.5,13.4"))
        .and(query_param("access_token", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "data": [{"id": "111"}, {"id": "222"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    for id in ["111", "222"] {
        Mock::given(method("GET"))
            .and(path(format!("/v3.3/{id}")))
            .and(query_param("access_token", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
                "id": id,
                "name": format!("Place {id}"),
                "link": format!("https://facebook.test/{id}"),
                "overall_star_rating": 4.5,
                "rating_count": 10,
                "engagement": {"count": 77},
                "checkins": 5
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let terms: Vec<Term> = vec![[("q", "market"), ("latitude", "52.5"), ("longitude", "13.4")]
        .into_iter()
        .collect()];
    let mut adapter = FacebookAdapter::new(test_client(), &test_keys(), terms)
        .unwrap()
        .with_base_url(server.uri());

    let mut rows = Vec::new();
    adapter.run(&mut rows).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id.as_deref(), Some("'111"));
    assert_eq!(rows[0].likes_amount.as_deref(), Some("77"));
    assert_eq!(rows[0].query, "market|52.5|13.4");

    // Every detail call asked for the full fixed field list.
    let detail = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.url.path() == "/v3.3/111")
        .expect("detail request for place 111");
    let fields = detail
        .url
        .query_pairs()
        .find(|(k, _)| k == "fields")
        .map(|(_, v)| v.into_owned())
        .expect("fields parameter");
    assert!(fields.contains("overall_star_rating"));
    assert!(fields.contains("single_line_address"));
}

// ---------------------------------------------------------------------------
// A known page ID in the term skips the search phase
// ---------------------------------------------------------------------------

#[tokio::test]
async fn direct_page_id_goes_straight_to_details() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3.3/999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "id": "999",
            "name": "Known Page"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let terms: Vec<Term> = vec![[("facebook_id", "999")].into_iter().collect()];
    let mut adapter = FacebookAdapter::new(test_client(), &test_keys(), terms)
        .unwrap()
        .with_base_url(server.uri());

    let mut rows = Vec::new();
    adapter.run(&mut rows).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name.as_deref(), Some("Known Page"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
