//! Integration tests for the Yelp adapter's search and pagination flow.

use std::collections::HashMap;

use placegrab_core::{AppConfig, Term};
use placegrab_providers::{ApiClient, Provider, YelpAdapter};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
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
    HashMap::from([("apikey".to_owned(), "testkey".to_owned())])
}

fn business_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Business {id}"),
        "url": format!("https://yelp.test/biz/{id}"),
        "is_closed": false,
        "review_count": 12,
        "rating": 4.0
    })
}

fn page_json(total: i64, businesses: Vec<Value>) -> Value {
    json!({"total": total, "businesses": businesses})
}

// ---------------------------------------------------------------------------
// Single search when the limit fits in one page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn small_limit_issues_exactly_one_search() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/businesses/search"))
        .and(header("Authorization", "Bearer testkey"))
        .and(query_param("term", "pizza"))
        .and(query_param("limit", "20"))
        .and(query_param_is_missing("offset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page_json(
            57,
            vec![business_json("b1"), business_json("b2")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let terms: Vec<Term> = vec![[("term", "pizza"), ("location", "Berlin"), ("limit", "20")]
        .into_iter()
        .collect()];
    let mut adapter = YelpAdapter::new(test_client(), &test_keys(), terms)
        .unwrap()
        .with_base_url(server.uri());

    let mut rows = Vec::new();
    adapter.run(&mut rows).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].total_api.as_deref(), Some("57"));
    assert_eq!(rows[0].total_extracted.as_deref(), Some("2"));
    assert_eq!(rows[0].query, "pizza|Berlin|20");
}

// ---------------------------------------------------------------------------
// Offset pagination for limits beyond one page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn large_limit_pages_with_fixed_offsets() {
    let server = MockServer::start().await;

    for (offset, page) in [
        ("0", page_json(120, vec![business_json("b1"), business_json("b2")])),
        ("50", page_json(120, vec![business_json("b3")])),
        ("100", page_json(120, vec![business_json("b4")])),
    ] {
        Mock::given(method("GET"))
            .and(path("/v3/businesses/search"))
            .and(query_param("limit", "50"))
            .and(query_param("offset", offset))
            .respond_with(ResponseTemplate::new(200).set_body_json(&page))
            .expect(1)
            .mount(&server)
            .await;
    }

    let terms: Vec<Term> = vec![[("term", "pizza"), ("location", "Berlin"), ("limit", "120")]
        .into_iter()
        .collect()];
    let mut adapter = YelpAdapter::new(test_client(), &test_keys(), terms)
        .unwrap()
        .with_base_url(server.uri());

    let mut rows = Vec::new();
    adapter.run(&mut rows).await.unwrap();

    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.total_api.as_deref() == Some("120")));
    assert!(rows.iter().all(|r| r.total_extracted.as_deref() == Some("4")));
}

#[tokio::test]
async fn pagination_stops_on_an_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/businesses/search"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page_json(
            2,
            vec![business_json("b1"), business_json("b2")],
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/businesses/search"))
        .and(query_param("offset", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page_json(2, vec![])))
        .expect(1)
        .mount(&server)
        .await;

    let terms: Vec<Term> = vec![[("term", "pizza"), ("location", "Berlin"), ("limit", "500")]
        .into_iter()
        .collect()];
    let mut adapter = YelpAdapter::new(test_client(), &test_keys(), terms)
        .unwrap()
        .with_base_url(server.uri());

    let mut rows = Vec::new();
    adapter.run(&mut rows).await.unwrap();

    // No request for offset 100 is mounted; reaching it would fail the run.
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn unparseable_limit_falls_back_to_a_single_search() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/businesses/search"))
        .and(query_param("limit", "abc"))
        .and(query_param_is_missing("offset"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&page_json(1, vec![business_json("b1")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let terms: Vec<Term> = vec![[("term", "pizza"), ("location", "Berlin"), ("limit", "abc")]
        .into_iter()
        .collect()];
    let mut adapter = YelpAdapter::new(test_client(), &test_keys(), terms)
        .unwrap()
        .with_base_url(server.uri());

    let mut rows = Vec::new();
    adapter.run(&mut rows).await.unwrap();

    assert_eq!(rows.len(), 1);
}

// ---------------------------------------------------------------------------
// Terms without a locator are skipped without a request
// ---------------------------------------------------------------------------

#[tokio::test]
async fn term_without_location_or_coordinates_is_skipped() {
    let server = MockServer::start().await;

    let terms: Vec<Term> = vec![[("term", "pizza"), ("limit", "20")].into_iter().collect()];
    let mut adapter = YelpAdapter::new(test_client(), &test_keys(), terms)
        .unwrap()
        .with_base_url(server.uri());

    let mut rows = Vec::new();
    adapter.run(&mut rows).await.unwrap();

    assert!(rows.is_empty());
    assert!(adapter.last_response().is_none());
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}
