//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sh_api::{ApiClient, Backend};
use sh_core::config::{AppConfig, BackendConfig, ConfigHandle, MigrationConfig};
use sh_models::SnapshotDb;
use sh_services::event_bus::{AppEvent, EventBus};
use sh_services::liveness::scripted::{FrameScript, ScriptedFrame};
use sh_services::notification::NotificationCenter;

/// Default configuration with a short success countdown.
pub fn create_test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.liveness.success_countdown_secs = 1;
    config
}

pub fn create_test_config_handle() -> ConfigHandle {
    ConfigHandle::new(create_test_config())
}

/// Create an EventBus with a small buffer suitable for tests.
pub fn create_test_event_bus() -> EventBus {
    EventBus::new(64)
}

pub fn create_test_notifications(bus: &EventBus) -> NotificationCenter {
    NotificationCenter::new(bus.clone())
}

/// Backend config pointing at a mock server.
pub fn backend_config(server: &MockServer) -> BackendConfig {
    BackendConfig {
        url: server.uri(),
        anon_key: "anon".into(),
        access_token: "user-jwt".into(),
        ..Default::default()
    }
}

/// Start a mock backend and return a client for it.
pub async fn create_mock_backend() -> (MockServer, Backend) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&backend_config(&server)).expect("mock backend client");
    (server, Backend::Available(client))
}

pub fn unavailable_backend() -> Backend {
    Backend::Unavailable {
        reason: "backend url is not configured".into(),
    }
}

/// Answer `method /rest/v1/{table}` with a JSON body.
pub async fn mount_json(server: &MockServer, http_method: &str, table: &str, status: u16, body: Value) {
    Mock::given(method(http_method))
        .and(path(format!("/rest/v1/{table}")))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Create a temporary snapshot database.
/// Returns the SnapshotDb and the TempDir (must be held alive for the duration of the test).
pub fn create_test_snapshot() -> (SnapshotDb, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("snapshot.db");
    let db = SnapshotDb::open(&path, &MigrationConfig::default()).expect("failed to open snapshot");
    (db, dir)
}

/// A script that passes: two blinks, left turn, right turn.
pub fn passing_script() -> Arc<FrameScript> {
    Arc::new(FrameScript::new(vec![
        ScriptedFrame::no_face(),
        ScriptedFrame::blink(),
        ScriptedFrame::blink(),
        ScriptedFrame::look(-25.0),
        ScriptedFrame::look(25.0),
    ]))
}

/// Drain every event currently buffered on a receiver.
pub fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<AppEvent>) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn provider_row(id: &str, user_id: &str, balance: i64, available: bool) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "business_name": "Plomberie Akpro",
        "category": "Plumbing",
        "country_code": "BJ",
        "city_id": 1,
        "hourly_rate": 7500.4,
        "rating": 4.6,
        "review_count": 12,
        "is_available": available,
        "balance": balance
    })
}

pub fn profile_row(id: &str, verified: bool, status: &str) -> Value {
    json!({
        "id": id,
        "full_name": "Afi Mensah",
        "role": "client",
        "verification_status": status,
        "liveness_verified": verified
    })
}
