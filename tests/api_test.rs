//! End-to-end tests driving the HTTP router
//!
//! Requests go through `tower::ServiceExt::oneshot`; storage is in memory,
//! wrapped to count every backend call.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

use watchlist::api::create_store_router;
use watchlist::storage::memory::MemoryStorage;
use watchlist::storage::StorageBackend;
use watchlist::store::DocumentStore;
use watchlist::Error;

#[derive(Default)]
struct CountingStorage {
    inner: MemoryStorage,
    calls: AtomicUsize,
}

impl CountingStorage {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageBackend for CountingStorage {
    async fn get(&self, key: &str) -> watchlist::Result<Option<Bytes>> {
        self.tick();
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, data: Bytes) -> watchlist::Result<()> {
        self.tick();
        self.inner.put(key, data).await
    }

    async fn delete(&self, key: &str) -> watchlist::Result<()> {
        self.tick();
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> watchlist::Result<bool> {
        self.tick();
        self.inner.exists(key).await
    }

    async fn list(&self, prefix: &str) -> watchlist::Result<Vec<String>> {
        self.tick();
        self.inner.list(prefix).await
    }
}

/// Memory storage whose reads, writes and listings fail once `broken` is set
#[derive(Default)]
struct FailingStorage {
    inner: MemoryStorage,
    broken: AtomicBool,
}

impl FailingStorage {
    fn check(&self) -> watchlist::Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(Error::storage("injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FailingStorage {
    async fn get(&self, key: &str) -> watchlist::Result<Option<Bytes>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, data: Bytes) -> watchlist::Result<()> {
        self.check()?;
        self.inner.put(key, data).await
    }

    async fn delete(&self, key: &str) -> watchlist::Result<()> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> watchlist::Result<bool> {
        self.check()?;
        self.inner.exists(key).await
    }

    async fn list(&self, prefix: &str) -> watchlist::Result<Vec<String>> {
        self.check()?;
        self.inner.list(prefix).await
    }
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, String) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

struct TestApp {
    router: Router,
    storage: Arc<CountingStorage>,
}

impl TestApp {
    async fn new() -> Self {
        let storage = Arc::new(CountingStorage::default());
        let store = DocumentStore::open(storage.clone()).await.unwrap();
        let router = create_store_router(Arc::new(store), "test-node");
        Self { router, storage }
    }

    async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, String) {
        send(&self.router, method, uri, body).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.call("GET", uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, String) {
        self.call("POST", uri, Some(body)).await
    }

    async fn get_json(&self, uri: &str) -> Value {
        let (status, body) = self.get(uri).await;
        assert_eq!(status, StatusCode::OK, "GET {uri} failed: {body}");
        serde_json::from_str(&body).unwrap()
    }
}

#[tokio::test]
async fn members_scenario() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/addTeam", json!({ "name": "Lions" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Team added successfully");

    assert_eq!(app.get_json("/getTeams").await, json!(["Lions"]));

    let (status, body) = app
        .call(
            "PUT",
            "/updateMembers?teamName=Lions",
            Some(json!({ "Alice": {} })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Members updated successfully");

    assert_eq!(
        app.get_json("/getMembers?teamName=Lions").await,
        json!({ "Alice": {} })
    );

    let (status, body) = app
        .call("DELETE", "/deleteMember?teamName=Lions&memberName=Alice", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Member deleted successfully");

    assert_eq!(app.get_json("/getMembers?teamName=Lions").await, json!({}));
}

#[tokio::test]
async fn add_team_twice_lists_it_once() {
    let app = TestApp::new().await;
    app.post("/addTeam", json!({ "name": "Lions" })).await;
    app.post("/addTeam", json!({ "name": "Tigers" })).await;
    app.post("/addTeam", json!({ "name": "Lions" })).await;

    assert_eq!(app.get_json("/getTeams").await, json!(["Lions", "Tigers"]));
}

#[tokio::test]
async fn deleted_team_has_no_members() {
    let app = TestApp::new().await;
    app.post("/addTeam", json!({ "name": "Lions" })).await;

    let (status, body) = app.call("DELETE", "/deleteTeam?teamName=Lions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Team deleted successfully");

    let (status, body) = app.get("/getMembers?teamName=Lions").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Team not found");

    // deleting a missing team still succeeds
    let (status, _) = app.get("/deleteTeam?teamName=Lions").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn delete_missing_member_is_404_and_keeps_members() {
    let app = TestApp::new().await;
    app.post("/addTeam", json!({ "name": "Lions" })).await;
    app.post("/updateMembers?teamName=Lions", json!({ "Bob": { "role": "lead" } }))
        .await;

    let (status, body) = app
        .get("/deleteMember?teamName=Lions&memberName=Alice")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Member not found");

    let (status, body) = app
        .get("/deleteMember?teamName=Ghosts&memberName=Alice")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Team not found");

    assert_eq!(
        app.get_json("/getMembers?teamName=Lions").await,
        json!({ "Bob": { "role": "lead" } })
    );
}

#[tokio::test]
async fn update_members_on_missing_team_is_404() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post("/updateMembers?teamName=Ghosts", json!({ "Alice": {} }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Team not found");
    assert_eq!(app.get_json("/getTeams").await, json!([]));
}

#[tokio::test]
async fn change_team_name_moves_members() {
    let app = TestApp::new().await;
    app.post("/addTeam", json!({ "name": "A" })).await;
    app.post("/updateMembers?teamName=A", json!({ "Alice": "x" })).await;

    let (status, body) = app
        .call("PUT", "/changeTeamName?oldTeamName=A&newTeamName=B", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Team name changed successfully");

    let (status, _) = app.get("/getMembers?teamName=A").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.get_json("/getMembers?teamName=B").await,
        json!({ "Alice": "x" })
    );
    assert_eq!(app.get_json("/getTeams").await, json!(["B"]));

    let (status, body) = app
        .get("/changeTeamName?oldTeamName=A&newTeamName=C")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Old team not found");
}

#[tokio::test]
async fn watch_list_lifecycle() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/createWatchList",
            json!({ "teamName": "Lions", "listName": "night", "timestamp": 1700000000 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Watch list created successfully");

    assert_eq!(
        app.get_json("/getWatchList?teamName=Lions&listName=night").await,
        json!({ "timestamp": 1700000000 })
    );

    let (status, body) = app
        .post(
            "/saveSchedule?teamName=Lions&listName=night",
            json!({ "monday": ["Alice"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Schedule successfully saved!");

    app.post(
        "/saveSchedule?teamName=Lions&listName=night",
        json!({ "tuesday": ["Bob"] }),
    )
    .await;

    assert_eq!(
        app.get_json("/getWatchList?teamName=Lions&listName=night").await,
        json!({ "timestamp": 1700000000, "monday": ["Alice"], "tuesday": ["Bob"] })
    );

    assert_eq!(
        app.get_json("/getWatchLists?teamName=Lions").await,
        json!([{
            "timestamp": 1700000000,
            "monday": ["Alice"],
            "tuesday": ["Bob"],
            "listName": "night"
        }])
    );

    let (status, body) = app
        .call("DELETE", "/deleteWatchList?teamName=Lions&listName=night", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Watch list deleted successfully");

    let (status, body) = app.get("/getWatchList?teamName=Lions&listName=night").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Document not found");
}

#[tokio::test]
async fn null_timestamp_is_returned_as_stored() {
    let app = TestApp::new().await;
    app.post(
        "/createWatchList",
        json!({ "teamName": "Lions", "listName": "night", "timestamp": 1 }),
    )
    .await;

    let (status, _) = app
        .post(
            "/saveSchedule?teamName=Lions&listName=night",
            json!({ "timestamp": null, "x": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        app.get_json("/getWatchList?teamName=Lions&listName=night").await,
        json!({ "timestamp": null, "x": 1 })
    );
    assert_eq!(
        app.get_json("/getWatchLists?teamName=Lions").await,
        json!([{ "timestamp": null, "x": 1, "listName": "night" }])
    );
}

#[tokio::test]
async fn save_schedule_on_missing_list_is_404() {
    let app = TestApp::new().await;
    let (status, _) = app
        .post(
            "/saveSchedule?teamName=Lions&listName=night",
            json!({ "monday": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_list_and_delete_list() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/addList?teamName=Lions",
            json!({ "listData": { "listName": "day", "timestamp": 7, "shifts": [1, 2] } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "");

    assert_eq!(
        app.get_json("/getWatchList?teamName=Lions&listName=day").await,
        json!({ "listName": "day", "timestamp": 7, "shifts": [1, 2] })
    );

    let (status, body) = app
        .call("DELETE", "/deleteList?teamName=Lions&listName=day", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Document successfully deleted!");

    assert_eq!(app.get_json("/getWatchLists?teamName=Lions").await, json!([]));
}

#[tokio::test]
async fn delete_team_leaves_watch_lists() {
    let app = TestApp::new().await;
    app.post("/addTeam", json!({ "name": "Lions" })).await;
    app.post(
        "/createWatchList",
        json!({ "teamName": "Lions", "listName": "night", "timestamp": 1 }),
    )
    .await;

    app.get("/deleteTeam?teamName=Lions").await;

    assert_eq!(app.get_json("/getTeams").await, json!([]));
    let lists = app.get_json("/getWatchLists?teamName=Lions").await;
    assert_eq!(lists.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_parameters_are_400_without_storage_calls() {
    let app = TestApp::new().await;
    let cases: Vec<(&str, &str, Option<Value>, &str)> = vec![
        ("POST", "/addTeam", Some(json!({})), "Team name is required"),
        ("POST", "/addTeam", None, "Team name is required"),
        ("POST", "/addTeam", Some(json!({ "name": "" })), "Team name is required"),
        ("DELETE", "/deleteTeam", None, "Team name is required"),
        ("GET", "/getMembers?teamName=", None, "Team name is required"),
        (
            "PUT",
            "/updateMembers",
            Some(json!({ "Alice": {} })),
            "Team name and members are required",
        ),
        (
            "PUT",
            "/updateMembers?teamName=Lions",
            None,
            "Team name and members are required",
        ),
        (
            "DELETE",
            "/deleteMember?teamName=Lions",
            None,
            "Team name and member name are required",
        ),
        (
            "PUT",
            "/changeTeamName?oldTeamName=A",
            None,
            "Old team name and new team name are required",
        ),
        ("GET", "/getWatchLists", None, "Team name is required"),
        (
            "POST",
            "/createWatchList",
            Some(json!({ "teamName": "Lions", "listName": "night" })),
            "Team name, list name, and timestamp are required",
        ),
        (
            "POST",
            "/createWatchList",
            Some(json!({ "teamName": "Lions", "listName": "night", "timestamp": null })),
            "Team name, list name, and timestamp are required",
        ),
        (
            "POST",
            "/createWatchList",
            Some(json!({ "teamName": "Lions", "listName": "night", "timestamp": 0 })),
            "Team name, list name, and timestamp are required",
        ),
        (
            "POST",
            "/createWatchList",
            Some(json!({ "teamName": "Lions", "listName": "night", "timestamp": false })),
            "Team name, list name, and timestamp are required",
        ),
        (
            "DELETE",
            "/deleteWatchList?teamName=Lions",
            None,
            "Team name and list name are required",
        ),
        (
            "GET",
            "/getWatchList?listName=night",
            None,
            "Team name and list name are required",
        ),
        (
            "POST",
            "/saveSchedule?teamName=Lions&listName=night",
            None,
            "Team name, list name, and schedule data are required",
        ),
        (
            "POST",
            "/addList",
            Some(json!({ "listData": { "listName": "day" } })),
            "Team name and list data are required",
        ),
        (
            "POST",
            "/addList?teamName=Lions",
            Some(json!({})),
            "Team name and list data are required",
        ),
        (
            "POST",
            "/addList?teamName=Lions",
            Some(json!({ "listData": { "timestamp": 1 } })),
            "List name is required",
        ),
        (
            "DELETE",
            "/deleteList?listName=day",
            None,
            "Team name and list name are required",
        ),
    ];

    for (method, uri, body, expected) in cases {
        let (status, text) = app.call(method, uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(text, expected, "{method} {uri}");
    }

    // only the journal scan on open touched storage
    assert_eq!(app.storage.calls(), 1);
}

#[tokio::test]
async fn malformed_json_body_is_400() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/addTeam")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.storage.calls(), 1);
}

#[tokio::test]
async fn invalid_names_are_400() {
    let app = TestApp::new().await;
    let (status, body) = app.post("/addTeam", json!({ "name": "a/b" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("Invalid name"), "{body}");
}

#[tokio::test]
async fn health_reports_node_and_team_count() {
    let app = TestApp::new().await;
    app.post("/addTeam", json!({ "name": "Lions" })).await;

    let health = app.get_json("/health").await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["node_id"], "test-node");
    assert_eq!(health["teams"], 1);
}

#[tokio::test]
async fn storage_failures_are_500_with_action() {
    let storage = Arc::new(FailingStorage::default());
    let store = DocumentStore::open(storage.clone()).await.unwrap();
    let router = create_store_router(Arc::new(store), "test-node");
    storage.broken.store(true, Ordering::SeqCst);

    let (status, body) = send(&router, "GET", "/getMembers?teamName=Lions", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Error getting members: Storage error: injected failure");

    let (status, body) = send(&router, "POST", "/addTeam", Some(json!({ "name": "Lions" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Error adding team: Storage error: injected failure");

    storage.broken.store(false, Ordering::SeqCst);
    let (status, body) = send(&router, "GET", "/getTeams", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}
