//! Integration test: the full onboarding journey over the HTTP API.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use plutor_integration_tests::{memory_manager, WALLETS};
use plutor_node::{build_router, AppState, MemoryMailer};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> (Router, Arc<MemoryMailer>) {
    let (manager, _clock) = memory_manager();
    let mailer = Arc::new(MemoryMailer::new());
    let state = Arc::new(AppState {
        manager,
        mailer: mailer.clone(),
    });
    (build_router(state), mailer)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_onboarding_journey() {
    let (app, mailer) = app();

    let (status, created) = call(
        &app,
        "POST",
        "/api/v1/users",
        Some(json!({ "wallet_address": WALLETS[0], "email": "ops@acme.example" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = created["user_id"].as_str().unwrap().to_string();
    let did = created["did"].as_str().unwrap().to_string();

    let message = mailer.last_for("ops@acme.example").unwrap();
    let (status, assessment) = call(
        &app,
        "POST",
        &format!("/api/v1/users/{}/verify-code", user_id),
        Some(json!({ "code": message.code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assessment["score"], 20);

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/v1/users/{}/profile", user_id),
        Some(json!({ "company_name": "Acme Freight", "country": "US" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, metadata) = call(
        &app,
        "PUT",
        &format!("/api/v1/users/{}/trust-score", user_id),
        Some(json!({
            "email_verified": true,
            "business_verified": true,
            "invoice_count": 6,
            "on_time_payment_rate": 0.8
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // 20 + 40 + 3 + 12
    assert_eq!(metadata["trust_score"], "75");
    assert_eq!(metadata["verification_status"], "fully_verified");

    let (status, record) = call(&app, "GET", &format!("/api/v1/users/did/{}", did), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["user"]["email_verified"], true);
    assert_eq!(record["user"]["onboarding_completed"], true);
    assert_eq!(record["profile"]["company_name"], "Acme Freight");

    let (status, hits) = call(&app, "GET", "/api/v1/profiles?q=freight&limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits[0]["did"], did.as_str());
    assert_eq!(hits[0]["trust_score"], 75);
}

#[tokio::test]
async fn test_verification_failures_look_alike() {
    let (app, _) = app();
    let (_, created) = call(
        &app,
        "POST",
        "/api/v1/users",
        Some(json!({ "wallet_address": WALLETS[1], "email": "b@x.com" })),
    )
    .await;
    let user_id = created["user_id"].as_str().unwrap();

    let (wrong_status, wrong_body) = call(
        &app,
        "POST",
        &format!("/api/v1/users/{}/verify-code", user_id),
        Some(json!({ "code": "000000" })),
    )
    .await;
    let (unknown_status, unknown_body) = call(
        &app,
        "POST",
        &format!("/api/v1/users/{}/verify-code", "0190a5f0-0000-7000-8000-000000000000"),
        Some(json!({ "code": "000000" })),
    )
    .await;
    assert_eq!(wrong_status, StatusCode::NOT_FOUND);
    assert_eq!(unknown_status, StatusCode::NOT_FOUND);
    assert_eq!(wrong_body, unknown_body);

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/verify-email",
        Some(json!({ "token": "not-a-token" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], false);
}
