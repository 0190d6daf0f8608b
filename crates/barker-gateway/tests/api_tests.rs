// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route-level tests driving the router with `tower::ServiceExt::oneshot`
//! over a temp SQLite ledger.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use barker_gateway::{AuthConfig, GatewayState, router};
use barker_test_utils::TestHarness;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app(harness: &TestHarness) -> Router {
    router(GatewayState::new(harness.ledger()), AuthConfig::default())
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    call_with_token(app, method, uri, body, None).await
}

async fn call_with_token(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_is_public() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = router(
        GatewayState::new(harness.ledger()),
        AuthConfig {
            bearer_token: Some("s3cret".into()),
        },
    );

    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "sqlite");
}

#[tokio::test]
async fn bearer_token_guards_api_routes() {
    let harness = TestHarness::builder().with_bots(1).build().await.unwrap();
    let app = router(
        GatewayState::new(harness.ledger()),
        AuthConfig {
            bearer_token: Some("s3cret".into()),
        },
    );

    let (status, body) = call(&app, Method::GET, "/bot", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
    assert_eq!(body["kind"], "unauthorized");

    let (status, _) =
        call_with_token(&app, Method::GET, "/bot", None, Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        call_with_token(&app, Method::GET, "/bot", None, Some("s3cret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn bot_admin_and_rotation() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness).await;

    let (status, body) = call(&app, Method::POST, "/bot/next", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
    assert_eq!(body["entity"], "bot");

    let (status, created) = call(
        &app,
        Method::POST,
        "/bot",
        Some(json!({"title": "alpha", "token": "t-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/bot/{id}"),
        Some(json!({"title": "alpha-2", "token": "t-2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["title"], "alpha-2");

    let (status, next) = call(&app, Method::POST, "/bot/next", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["data"]["id"].as_i64(), Some(id));

    let (status, _) = call(&app, Method::GET, "/bot/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, "/bot?page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn users_merge_on_put() {
    let harness = TestHarness::builder().with_bots(1).build().await.unwrap();
    let app = app(&harness).await;
    let bot_id = harness.bot(0).bot.id;

    call(
        &app,
        Method::PUT,
        &format!("/bot/{bot_id}/user"),
        Some(json!({"telegram_id": 42, "first_name": "Ada", "user_name": "ada"})),
    )
    .await;
    let (status, merged) = call(
        &app,
        Method::PUT,
        &format!("/bot/{bot_id}/user"),
        Some(json!({"telegram_id": 42, "first_name": "", "last_name": "Lovelace"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(merged["data"]["first_name"], "Ada");
    assert_eq!(merged["data"]["last_name"], "Lovelace");
    assert_eq!(merged["data"]["user_name"], "ada");

    let (status, _) = call(&app, Method::GET, &format!("/bot/{bot_id}/user/7"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = call(&app, Method::GET, &format!("/bot/{bot_id}/user"), None).await;
    assert_eq!(list["paging"]["total_items"], 1);
}

#[tokio::test]
async fn campaign_validation_and_ownership() {
    let harness = TestHarness::builder()
        .with_bots(2)
        .with_campaigns(1)
        .build()
        .await
        .unwrap();
    let app = app(&harness).await;
    let owner = harness.bot(0);
    let other = harness.bot(1).bot.id;
    let campaign_id = owner.campaigns[0].id;

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/bot/{}/campaign", owner.bot.id),
        Some(json!({"title": "", "message": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/bot/{other}/campaign/{campaign_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/bot/{}/campaign/{campaign_id}", owner.bot.id),
        Some(json!({"title": "renamed", "message": "hi", "active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["active"], false);
}

#[tokio::test]
async fn dispatch_flow_over_http() {
    let harness = TestHarness::builder()
        .with_bots(1)
        .with_users(2)
        .with_campaigns(1)
        .build()
        .await
        .unwrap();
    let app = app(&harness).await;
    let seeded = harness.bot(0);
    let bot_id = seeded.bot.id;
    let campaign_id = seeded.campaigns[0].id;
    let base = format!("/bot/{bot_id}/campaign/{campaign_id}");

    let (status, first) = call(&app, Method::POST, &format!("{base}/delivery"), None).await;
    assert_eq!(status, StatusCode::OK);
    let first_tid = first["data"]["user"]["telegram_id"].as_i64().unwrap();
    assert_eq!(first["data"]["delivery"]["state"], "progress");
    assert_eq!(first["data"]["campaign"]["id"].as_i64(), Some(campaign_id));

    let (_, second) = call(&app, Method::POST, &format!("/bot/{bot_id}/delivery"), None).await;
    let second_tid = second["data"]["user"]["telegram_id"].as_i64().unwrap();
    assert_ne!(first_tid, second_tid);

    let (status, exhausted) = call(&app, Method::POST, &format!("{base}/delivery"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(exhausted["data"].is_null());

    let (status, state) = call(
        &app,
        Method::PUT,
        &format!("{base}/delivery/{first_tid}/state/success"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["data"], "success");

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("{base}/delivery/{first_tid}/state/success"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, conflict) = call(
        &app,
        Method::PUT,
        &format!("{base}/delivery/{first_tid}/state/fail"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["kind"], "invalid_transition");
    assert_eq!(conflict["from"], "success");

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("{base}/delivery/{second_tid}/state/3"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("{base}/delivery/{second_tid}/state/bogus"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, state) = call(
        &app,
        Method::GET,
        &format!("{base}/delivery/{second_tid}/state"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["data"], "fail");

    let (status, _) = call(&app, Method::GET, &format!("{base}/delivery/5/state"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, stats) = call(
        &app,
        Method::GET,
        &format!("{base}/aggregatedStatistics"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["data"]["recipients"], 2);
    assert_eq!(stats["data"]["delivered"], 1);
    assert_eq!(stats["data"]["errors"], 1);
    assert_eq!(stats["data"]["pending"], 0);
}

#[tokio::test]
async fn claim_for_unknown_bot_is_not_found() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness).await;
    let (status, body) = call(&app, Method::POST, "/bot/3/delivery?telegram_id=1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}
