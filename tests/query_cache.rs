//! Integration tests for the query layer over a mock character API.

use explorer::api::{ApiClient, ApiError, CharacterQuery};
use explorer::query::{Lookup, Queries, QueryPolicy};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::num::NonZeroUsize;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn policy() -> QueryPolicy {
    QueryPolicy {
        stale_time: Duration::from_secs(300),
        retries: 1,
        retry_delay: Duration::from_millis(10),
        capacity: NonZeroUsize::new(16).unwrap(),
    }
}

fn page_body() -> serde_json::Value {
    json!({
        "info": {"count": 1, "pages": 1, "next": null, "prev": null},
        "results": [{
            "id": 1,
            "name": "Rick Sanchez",
            "status": "Alive",
            "species": "Human",
            "type": "",
            "gender": "Male",
            "origin": {"name": "Earth", "url": ""},
            "location": {"name": "Earth", "url": ""},
            "image": "",
            "episode": []
        }]
    })
}

fn alive() -> CharacterQuery {
    CharacterQuery {
        status: Some("Alive".to_string()),
        ..CharacterQuery::default()
    }
}

async fn request_urls(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.to_string())
        .collect()
}

#[tokio::test]
async fn test_server_error_retried_once_then_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/character"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let api = ApiClient::new(reqwest::Client::new(), &server.uri()).unwrap();
    let queries = Queries::new(policy());

    let err = queries.fetch_characters(&api, alive()).await.unwrap_err();
    assert!(matches!(
        err.api_error(),
        ApiError::HttpStatus { status: 500, .. }
    ));
    assert_eq!(request_urls(&server).await.len(), 2);

    // Failures are not cached: trying again issues the same request again
    assert_eq!(queries.characters.lookup(&alive()), Lookup::Missing);
    queries.fetch_characters(&api, alive()).await.unwrap_err();

    let urls = request_urls(&server).await;
    assert_eq!(urls.len(), 4);
    assert!(urls.iter().all(|u| *u == urls[0]));
    assert!(urls[0].ends_with("/character?page=1&status=Alive"));
}

#[tokio::test]
async fn test_fresh_page_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/character"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body()))
        .expect(1)
        .mount(&server)
        .await;
    let api = ApiClient::new(reqwest::Client::new(), &server.uri()).unwrap();
    let queries = Queries::new(policy());

    let first = queries.fetch_characters(&api, alive()).await.unwrap();
    let cached = queries
        .characters
        .get(alive(), || async { Err(ApiError::InsecureBaseUrl) })
        .await
        .unwrap();

    assert_eq!(first, cached);
    assert!(matches!(queries.characters.lookup(&alive()), Lookup::Fresh(_)));
}

#[tokio::test]
async fn test_different_filters_are_different_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/character"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body()))
        .expect(2)
        .mount(&server)
        .await;
    let api = ApiClient::new(reqwest::Client::new(), &server.uri()).unwrap();
    let queries = Queries::new(policy());

    queries.fetch_characters(&api, alive()).await.unwrap();
    queries
        .fetch_characters(&api, CharacterQuery::default())
        .await
        .unwrap();

    assert!(matches!(
        queries.characters.lookup(&CharacterQuery::default()),
        Lookup::Fresh(_)
    ));
    assert!(matches!(queries.characters.lookup(&alive()), Lookup::Fresh(_)));
}

#[tokio::test]
async fn test_concurrent_detail_requests_share_one_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/character/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body()["results"][0].clone())
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let api = ApiClient::new(reqwest::Client::new(), &server.uri()).unwrap();
    let queries = Queries::new(policy());

    let (a, b) = tokio::join!(
        queries.fetch_character(&api, 1),
        queries.fetch_character(&api, 1)
    );

    assert_eq!(a.unwrap().name, "Rick Sanchez");
    assert_eq!(b.unwrap().name, "Rick Sanchez");
}
