//! Integration tests for the admin HTTP endpoints.
//!
//! These tests drive the admin router end to end against a real scheduler:
//! 1. Cycle registration, lookup and deletion
//! 2. Per-cycle resume/stop/reset answer 404 for unknown ids
//! 3. Scheduler start/shutdown always answer 200
//! 4. The manual toggle accepts `true`/`false` bodies

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use publish_carousel::adapters::http::{admin_router, AdminAppState};
use publish_carousel::adapters::metadata::ObjectStoreMetadataReadWriter;
use publish_carousel::adapters::native::InMemoryNativeStore;
use publish_carousel::adapters::storage::InMemoryObjectStore;
use publish_carousel::application::{CycleDeps, PublishError, PublishTask, Scheduler, Toggles};
use publish_carousel::domain::filter::FilterChain;

// =============================================================================
// Test Infrastructure
// =============================================================================

struct NoopPublisher;

#[async_trait]
impl PublishTask for NoopPublisher {
    async fn publish(&self, _origin: &str, _collection: &str, _uuid: &str) -> Result<(), PublishError> {
        Ok(())
    }
}

fn app(toggles: Toggles) -> (Router, Arc<Scheduler>) {
    let scheduler = Arc::new(Scheduler::new(
        CycleDeps {
            store: Arc::new(InMemoryNativeStore::new()),
            publisher: Arc::new(NoopPublisher),
            filters: FilterChain::new(),
        },
        Arc::new(ObjectStoreMetadataReadWriter::new(Arc::new(InMemoryObjectStore::new()))),
        Duration::from_secs(60),
        toggles,
    ));
    let router = admin_router().with_state(AdminAppState::new(scheduler.clone()));
    (router, scheduler)
}

fn disabled() -> Toggles {
    Toggles {
        automatic_enabled: false,
        manual_enabled: false,
    }
}

fn definition() -> Value {
    json!({
        "name": "methode-whole-archive",
        "type": "ThrottledWholeCollection",
        "origin": "methode-web-pub",
        "collection": "methode",
        "coolDown": "5m",
        "throttle": "30s"
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create(app: &Router, definition: Value) -> (StatusCode, Value) {
    send(app, "POST", "/cycles", Body::from(definition.to_string())).await
}

// =============================================================================
// Cycles
// =============================================================================

#[tokio::test]
async fn created_cycle_is_listed_and_fetched() {
    let (app, _) = app(disabled());

    let (status, created) = create(&app, definition()).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["type"], "ThrottledWholeCollection");
    assert_eq!(created["throttle"], "30s");
    assert_eq!(created["metadata"]["state"], json!(["stopped"]));

    let (status, listed) = send(&app, "GET", "/cycles", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, fetched) = send(&app, "GET", &format!("/cycles/{}", id), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "methode-whole-archive");
}

#[tokio::test]
async fn duplicate_cycle_conflicts() {
    let (app, _) = app(disabled());

    create(&app, definition()).await;
    let (status, body) = create(&app, definition()).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn invalid_definition_is_rejected() {
    let (app, scheduler) = app(disabled());
    let mut missing_throttle = definition();
    missing_throttle.as_object_mut().unwrap().remove("throttle");

    let (status, body) = create(&app, missing_throttle).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(scheduler.cycles().await.is_empty());
}

#[tokio::test]
async fn deleted_cycle_is_gone() {
    let (app, scheduler) = app(disabled());
    let (_, created) = create(&app, definition()).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "DELETE", &format!("/cycles/{}", id), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(scheduler.cycles().await.is_empty());

    let (status, _) = send(&app, "GET", &format!("/cycles/{}", id), Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cycle_actions_on_unknown_ids_are_not_found() {
    let (app, _) = app(disabled());

    for action in ["resume", "stop", "reset"] {
        let uri = format!("/cycles/0123456789abcdef/{}", action);
        let (status, body) = send(&app, "POST", &uri, Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", action);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn cycle_actions_on_known_ids_succeed() {
    let (app, scheduler) = app(disabled());
    let (_, created) = create(&app, definition()).await;
    let id = created["id"].as_str().unwrap().to_string();

    for action in ["resume", "stop", "reset", "stop"] {
        let uri = format!("/cycles/{}/{}", id, action);
        let (status, _) = send(&app, "POST", &uri, Body::empty()).await;
        assert_eq!(status, StatusCode::OK, "{}", action);
    }

    let cycle = scheduler.cycle(&id).await.unwrap();
    assert!(!cycle.is_running().await);
}

// =============================================================================
// Scheduler
// =============================================================================

#[tokio::test]
async fn start_and_shutdown_always_answer_ok() {
    let (app, _) = app(disabled());

    let (status, body) = send(&app, "POST", "/scheduler/start", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["running"], false);
    assert!(body["message"].as_str().unwrap().contains("not enabled"));

    let (status, _) = send(&app, "POST", "/scheduler/shutdown", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn manual_toggle_starts_and_stops_the_scheduler() {
    let (app, scheduler) = app(Toggles {
        automatic_enabled: true,
        manual_enabled: false,
    });

    let (status, body) = send(&app, "POST", "/scheduler/toggle", Body::from("true")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["manualEnabled"], true);
    assert_eq!(body["enabled"], true);
    assert!(scheduler.is_running().await);

    let (_, body) = send(&app, "POST", "/scheduler/toggle", Body::from("maybe")).await;
    assert_eq!(body["manualEnabled"], false);
    assert_eq!(body["running"], false);
    assert!(!scheduler.is_running().await);
}

#[tokio::test]
async fn scheduler_status_reports_flags() {
    let (app, _) = app(Toggles {
        automatic_enabled: false,
        manual_enabled: true,
    });

    let (status, body) = send(&app, "GET", "/scheduler", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["automaticEnabled"], false);
    assert_eq!(body["manualEnabled"], true);
    assert_eq!(body["enabled"], false);
}
