//! Video session integration tests.

mod common;

use axum::http::StatusCode;
use common::{user_header, TestHarness};
use serde_json::json;

async fn start(harness: &TestHarness, user: &str) -> serde_json::Value {
    let (name, value) = user_header(user);
    let response = harness
        .server
        .post("/api/video/start")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    body["session"].clone()
}

async fn balance(harness: &TestHarness, user: &str) -> i64 {
    let (name, value) = user_header(user);
    let body: serde_json::Value = harness
        .server
        .get("/api/credits")
        .add_header(name, value)
        .await
        .json();
    body["credits"].as_i64().unwrap()
}

#[tokio::test]
async fn start_does_not_charge() {
    let harness = TestHarness::new();

    let session = start(&harness, "u1").await;

    assert_eq!(session["creatorUserId"], "u1");
    assert_eq!(session["costCredits"], 1);
    assert!(session["endedAt"].is_null());
    assert_eq!(balance(&harness, "u1").await, 3);
}

#[tokio::test]
async fn end_charges_once() {
    let harness = TestHarness::new();
    let session = start(&harness, "u1").await;
    let id = session["id"].as_str().unwrap();
    let (name, value) = user_header("u1");

    let response = harness
        .server
        .post(&format!("/api/video/{id}/end"))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["session"]["endedAt"].is_string());
    assert_eq!(balance(&harness, "u1").await, 2);

    let response = harness
        .server
        .post(&format!("/api/video/{id}/end"))
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "already_ended");
    assert_eq!(balance(&harness, "u1").await, 2);
}

#[tokio::test]
async fn end_unknown_session_is_not_found() {
    let harness = TestHarness::new();
    let (name, value) = user_header("u1");

    let response = harness
        .server
        .post("/api/video/00000000-0000-0000-0000-000000000000/end")
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_not_found();

    let response = harness
        .server
        .post("/api/video/not-a-session/end")
        .add_header(name, value)
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn end_without_credits_still_ends_the_session() {
    let harness = TestHarness::new();
    let (name, value) = user_header("u1");
    harness
        .server
        .post("/api/credits/consume")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "amount": 1 }))
        .await
        .assert_status_not_found();

    let session = start(&harness, "u1").await;
    let id = session["id"].as_str().unwrap();
    harness
        .server
        .post("/api/credits/consume")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "amount": 3 }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post(&format!("/api/video/{id}/end"))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["details"]["session"]["id"], id);
    assert!(body["error"]["details"]["session"]["endedAt"].is_string());

    // The session cannot be ended (or charged) a second time.
    harness
        .server
        .post(&format!("/api/video/{id}/end"))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn peer_join_and_history() {
    let harness = TestHarness::new();
    let session = start(&harness, "u1").await;
    let id = session["id"].as_str().unwrap();
    let (name, value) = user_header("u2");

    let response = harness
        .server
        .post(&format!("/api/video/{id}/peer"))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["session"]["peerUserId"], "u2");

    let response = harness
        .server
        .get("/api/video/history")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["id"], id);
}

#[tokio::test]
async fn history_is_per_user() {
    let harness = TestHarness::new();
    start(&harness, "u1").await;
    start(&harness, "u1").await;
    start(&harness, "u2").await;
    let (name, value) = user_header("u1");

    let body: serde_json::Value = harness
        .server
        .get("/api/video/history")
        .add_header(name, value)
        .await
        .json();

    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s["creatorUserId"] == "u1"));
}
