//! E2E tests for batch entry sync

mod common;

use common::TestServer;
use serde_json::{Value, json};

async fn sync(server: &TestServer, token: &str, entries: Value) -> Value {
    let response = server
        .client
        .post(server.url("/api/entries/sync"))
        .bearer_auth(token)
        .json(&json!({ "entries": entries }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_sync_same_item_twice_updates_in_place() {
    let server = TestServer::new().await;
    let token = server.login("dune@example.com").await;

    let first = sync(
        &server,
        &token,
        json!([{ "media": {"title": "Dune", "type": "movie"}, "status": "planned" }]),
    )
    .await;
    assert_eq!(first["count"], 1);
    assert_eq!(first["message"], "Entries synced successfully");
    assert!(first.get("errors").is_none());

    let second = sync(
        &server,
        &token,
        json!([{
            "media": {"title": "Dune", "type": "movie"},
            "status": "completed",
            "rating": 5.0
        }]),
    )
    .await;
    assert_eq!(second["count"], 1);
    assert_eq!(
        second["synced_entries"][0]["id"],
        first["synced_entries"][0]["id"]
    );
    assert_eq!(
        second["synced_entries"][0]["media"]["id"],
        first["synced_entries"][0]["media"]["id"]
    );
    assert_eq!(second["synced_entries"][0]["status"], "completed");

    let media: Vec<Value> = server
        .client
        .get(server.url("/api/media/search?q=Dune&type=movie"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(media.len(), 1);

    let entries: Vec<Value> = server
        .client
        .get(server.url("/api/entries"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["rating"], 5.0);
}

#[tokio::test]
async fn test_sync_reuses_existing_catalog_item() {
    let server = TestServer::new().await;
    let token = server.login("reuse@example.com").await;
    let existing = server.create_media(&token, "Portal 2", "game").await;

    let report = sync(
        &server,
        &token,
        json!([{ "media": {"title": "Portal 2", "type": "game"}, "status": "in_progress" }]),
    )
    .await;

    assert_eq!(report["synced_entries"][0]["media_id"], existing["id"]);
}

#[tokio::test]
async fn test_sync_records_failed_items_without_aborting() {
    let server = TestServer::new().await;
    let token = server.login("partial@example.com").await;

    let report = sync(
        &server,
        &token,
        json!([
            { "media": {"title": "Heat", "type": "movie"}, "status": "completed" },
            { "media": {"title": "   ", "type": "book"}, "status": "planned" },
            { "media": {"title": "Ronin", "type": "movie"}, "status": "planned" }
        ]),
    )
    .await;

    assert_eq!(report["count"], 2);
    assert_eq!(report["synced_entries"].as_array().unwrap().len(), 2);
    assert_eq!(report["errors"].as_array().unwrap().len(), 1);
    assert_eq!(report["message"], "Synced 2 entries with 1 errors");
}

#[tokio::test]
async fn test_sync_is_per_user() {
    let server = TestServer::new().await;
    let alice = server.login("alice@example.com").await;
    let bob = server.login("bob@example.com").await;
    let item = json!([{ "media": {"title": "Akira", "type": "anime"}, "status": "completed" }]);

    let from_alice = sync(&server, &alice, item.clone()).await;
    let from_bob = sync(&server, &bob, item).await;

    assert_ne!(
        from_alice["synced_entries"][0]["id"],
        from_bob["synced_entries"][0]["id"]
    );
    assert_eq!(
        from_alice["synced_entries"][0]["media"]["id"],
        from_bob["synced_entries"][0]["media"]["id"]
    );
}

#[tokio::test]
async fn test_sync_requires_authentication() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/api/entries/sync"))
        .json(&json!({ "entries": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}
