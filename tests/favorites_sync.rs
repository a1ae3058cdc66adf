//! Integration tests for favorites persistence, batch fetching and
//! cross-store synchronization.
//!
//! Each test uses its own in-memory database and mock server. The mock
//! answers any `/character/{ids}` lookup by echoing records for the
//! requested IDs, shaped like the real API (bare object for one ID).

use explorer::api::ApiClient;
use explorer::favorites::FavoritesHub;
use explorer::storage::{Database, FAVORITES_KEY};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn character_json(id: i64) -> Value {
    json!({
        "id": id,
        "name": format!("Character {id}"),
        "status": "Alive",
        "species": "Human",
        "type": "",
        "gender": "Female",
        "origin": {"name": "Earth", "url": ""},
        "location": {"name": "Earth", "url": ""},
        "image": "",
        "episode": []
    })
}

fn echo_ids(request: &Request) -> ResponseTemplate {
    let ids: Vec<i64> = request
        .url
        .path()
        .rsplit('/')
        .next()
        .unwrap_or("")
        .split(',')
        .filter_map(|id| id.parse().ok())
        .collect();
    let body = match ids.as_slice() {
        [id] => character_json(*id),
        many => Value::Array(many.iter().map(|id| character_json(*id)).collect()),
    };
    ResponseTemplate::new(200).set_body_json(body)
}

async fn setup(persisted: Option<&str>) -> (MockServer, Database, FavoritesHub) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/character/[0-9,]+$"))
        .respond_with(echo_ids)
        .mount(&server)
        .await;

    let db = Database::open(":memory:").await.unwrap();
    if let Some(value) = persisted {
        db.set_item(FAVORITES_KEY, value).await.unwrap();
    }
    let api = ApiClient::new(reqwest::Client::new(), &server.uri()).unwrap();
    let hub = FavoritesHub::new(db.clone(), api);
    (server, db, hub)
}

async fn request_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

fn record_ids(store: &explorer::favorites::FavoritesStore) -> Vec<i64> {
    store.favorite_characters().iter().map(|c| c.id).collect()
}

// ============================================================================
// Initialization
// ============================================================================

#[tokio::test]
async fn test_persisted_ids_fetched_in_one_request() {
    let (server, _db, hub) = setup(Some("[1,2]")).await;
    let mut store = hub.store();

    store.initialize().await;

    assert_eq!(request_paths(&server).await, vec!["/character/1,2"]);
    assert_eq!(record_ids(&store), vec![1, 2]);
    assert!(store.is_initialized());
    assert!(!store.is_loading());
    assert!(store.error().is_none());
}

#[tokio::test]
async fn test_single_persisted_id_normalized() {
    let (_server, _db, hub) = setup(Some("[42]")).await;
    let mut store = hub.store();

    store.initialize().await;

    assert_eq!(record_ids(&store), vec![42]);
}

#[tokio::test]
async fn test_empty_and_malformed_storage_skip_network() {
    for persisted in [None, Some("[]"), Some("{not json")] {
        let (server, _db, hub) = setup(persisted).await;
        let mut store = hub.store();

        store.initialize().await;

        assert_eq!(store.count(), 0, "{persisted:?}");
        assert!(store.is_initialized());
        assert!(request_paths(&server).await.is_empty());
    }
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_add_persists_and_refetches() {
    let (server, db, hub) = setup(Some("[1]")).await;
    let mut store = hub.store();
    store.initialize().await;

    let pending = store.add(3).await.unwrap();
    store.drive(pending).await;

    assert_eq!(
        db.get_item(FAVORITES_KEY).await.unwrap().as_deref(),
        Some("[1,3]")
    );
    assert_eq!(record_ids(&store), vec![1, 3]);
    assert_eq!(
        request_paths(&server).await,
        vec!["/character/1", "/character/1,3"]
    );
}

#[tokio::test]
async fn test_double_toggle_restores_membership() {
    let (_server, db, hub) = setup(Some("[1,2,3]")).await;
    let mut store = hub.store();
    store.initialize().await;

    let pending = store.toggle(2).await.unwrap();
    store.drive(pending).await;
    assert!(!store.is_favorite(2));

    let pending = store.toggle(2).await.unwrap();
    store.drive(pending).await;

    assert!(store.is_favorite(2));
    assert_eq!(store.ids(), &[1, 3, 2]);
    assert_eq!(
        db.get_item(FAVORITES_KEY).await.unwrap().as_deref(),
        Some("[1,3,2]")
    );
}

#[tokio::test]
async fn test_removing_last_favorite_clears_records() {
    let (server, _db, hub) = setup(Some("[5]")).await;
    let mut store = hub.store();
    store.initialize().await;

    let pending = store.remove(5).await.unwrap();
    assert!(pending.is_none());

    assert_eq!(store.count(), 0);
    assert!(store.favorite_characters().is_empty());
    assert_eq!(request_paths(&server).await.len(), 1);
}

// ============================================================================
// Synchronization
// ============================================================================

#[tokio::test]
async fn test_change_in_one_store_reaches_another() {
    let (_server, _db, hub) = setup(Some("[1]")).await;
    let mut list = hub.store();
    let mut detail = hub.store();
    list.initialize().await;
    detail.initialize().await;

    let pending = detail.add(8).await.unwrap();
    detail.drive(pending).await;

    let pending = list.sync().await;
    assert!(pending.is_some());
    list.drive(pending).await;

    assert!(list.is_favorite(8));
    assert_eq!(record_ids(&list), vec![1, 8]);
}

#[tokio::test]
async fn test_own_changes_do_not_trigger_reload() {
    let (_server, _db, hub) = setup(Some("[1]")).await;
    let mut store = hub.store();
    store.initialize().await;

    let pending = store.add(2).await.unwrap();
    store.drive(pending).await;

    assert!(store.sync().await.is_none());
}

#[tokio::test]
async fn test_hub_subscribers_see_every_change() {
    let (_server, _db, hub) = setup(None).await;
    let mut rx = hub.subscribe();
    let mut store = hub.store();
    store.initialize().await;

    let pending = store.add(4).await.unwrap();
    store.drive(pending).await;

    let event = rx.try_recv().unwrap();
    assert_eq!(event.origin, store.instance());
}
