use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use chrono::{TimeZone, Utc};
use engine::{Engine, FixedClock, Role};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

const PASSWORD: &str = "secret-pass";

async fn setup() -> (Router, Arc<Engine>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .clock(FixedClock(Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap()))
        .password_cost(4)
        .build()
        .await
        .unwrap();
    let engine = Arc::new(engine);
    (server::router(engine.clone()), engine)
}

fn basic(email: &str) -> String {
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{email}:{PASSWORD}"));
    format!("Basic {token}")
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(email) = user {
        builder = builder.header(header::AUTHORIZATION, basic(email));
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
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn sign_up(app: &Router, email: &str, name: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/signup",
        None,
        Some(json!({ "email": email, "password": PASSWORD, "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn admin(engine: &Engine) -> String {
    engine
        .create_user("admin@hamtdaa.mn", PASSWORD, "Admin", Role::Admin)
        .await
        .unwrap();
    "admin@hamtdaa.mn".to_string()
}

#[tokio::test]
async fn signup_is_public_and_other_routes_require_credentials() {
    let (app, _) = setup().await;
    let user = sign_up(&app, "Bold@Example.mn", "Bold").await;
    assert_eq!(user["email"], "bold@example.mn");
    assert_eq!(user["role"], "user");

    let (status, body) = send(&app, "GET", "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "GET", "/me", Some("bold@example.mn"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Bold");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let (app, _) = setup().await;
    sign_up(&app, "bold@example.mn", "Bold").await;

    let token = base64::engine::general_purpose::STANDARD.encode("bold@example.mn:nope-nope");
    let request = Request::builder()
        .uri("/me")
        .header(header::AUTHORIZATION, format!("Basic {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let (app, _) = setup().await;
    sign_up(&app, "bold@example.mn", "Bold").await;
    let (status, body) = send(
        &app,
        "POST",
        "/signup",
        None,
        Some(json!({ "email": "BOLD@example.mn", "password": PASSWORD, "name": "Other" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn third_member_of_a_two_seat_group_is_refused() {
    let (app, _) = setup().await;
    for (email, name) in [
        ("a@example.mn", "A"),
        ("b@example.mn", "B"),
        ("c@example.mn", "C"),
    ] {
        sign_up(&app, email, name).await;
    }

    let (status, group) = send(
        &app,
        "POST",
        "/groups",
        Some("a@example.mn"),
        Some(json!({ "name": "Family", "monthly_contribution": 50000, "max_members": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let group_id = group["id"].as_str().unwrap().to_string();
    let join = format!("/groups/{group_id}/join");

    let (status, member) = send(&app, "POST", &join, Some("a@example.mn"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["rotation_order"], 1);
    let (_, member) = send(&app, "POST", &join, Some("b@example.mn"), None).await;
    assert_eq!(member["rotation_order"], 2);

    let (status, body) = send(&app, "POST", &join, Some("c@example.mn"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "Group is full" }));
}

#[tokio::test]
async fn qpay_payment_shows_on_the_dashboard() {
    let (app, _) = setup().await;
    sign_up(&app, "a@example.mn", "A").await;
    let (_, group) = send(
        &app,
        "POST",
        "/groups",
        Some("a@example.mn"),
        Some(json!({ "name": "Family", "monthly_contribution": 50000, "max_members": 5 })),
    )
    .await;
    let group_id = group["id"].as_str().unwrap().to_string();
    send(
        &app,
        "POST",
        &format!("/groups/{group_id}/join"),
        Some("a@example.mn"),
        None,
    )
    .await;

    let (status, payment) = send(
        &app,
        "POST",
        "/payments",
        Some("a@example.mn"),
        Some(json!({ "group_id": group_id, "method": "qpay" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["status"], "verified");
    assert_eq!(payment["amount"], 50000);

    let (status, dashboard) = send(&app, "GET", "/dashboard", Some("a@example.mn"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["month"], "2024-06");
    assert_eq!(dashboard["groups"][0]["paid_this_month"], true);
    assert_eq!(dashboard["groups"][0]["latest_payment_status"], "verified");
}

#[tokio::test]
async fn admin_routes_reject_ordinary_users() {
    let (app, _) = setup().await;
    sign_up(&app, "a@example.mn", "A").await;
    let (status, body) = send(&app, "GET", "/admin/payments", Some("a@example.mn"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Permission denied: admin role required");
}

#[tokio::test]
async fn admin_reviews_a_bank_transfer() {
    let (app, engine) = setup().await;
    let admin = admin(&engine).await;
    sign_up(&app, "a@example.mn", "A").await;
    let (_, group) = send(
        &app,
        "POST",
        "/groups",
        Some("a@example.mn"),
        Some(json!({ "name": "Family", "monthly_contribution": 50000, "max_members": 5 })),
    )
    .await;
    let group_id = group["id"].as_str().unwrap().to_string();
    send(
        &app,
        "POST",
        &format!("/groups/{group_id}/join"),
        Some("a@example.mn"),
        None,
    )
    .await;
    let (_, payment) = send(
        &app,
        "POST",
        "/payments",
        Some("a@example.mn"),
        Some(json!({ "group_id": group_id, "method": "bank_transfer", "note": "khan bank" })),
    )
    .await;
    assert_eq!(payment["status"], "pending");
    let payment_id = payment["id"].as_str().unwrap().to_string();

    let (status, pending) = send(
        &app,
        "GET",
        "/admin/payments?status=pending",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending[0]["payer_name"], "A");
    assert_eq!(pending[0]["group_name"], "Family");

    let status_uri = format!("/admin/payments/{payment_id}/status");
    let (status, approved) = send(
        &app,
        "POST",
        &status_uri,
        Some(&admin),
        Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");

    let (status, _) = send(
        &app,
        "POST",
        &status_uri,
        Some(&admin),
        Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        &status_uri,
        Some(&admin),
        Some(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, progress) = send(&app, "GET", "/progress", Some("a@example.mn"), None).await;
    assert_eq!(progress.as_array().unwrap().len(), 1);
    assert_eq!(progress[0]["paid"], true);
    assert_eq!(progress[0]["note"], "Approved by admin");

    let (_, overview) = send(&app, "GET", "/admin/overview", Some(&admin), None).await;
    assert_eq!(overview["settled_revenue"], 50000);
    assert_eq!(overview["pending_payments"], 0);
}

#[tokio::test]
async fn invite_is_answered_through_the_notification() {
    let (app, _) = setup().await;
    sign_up(&app, "a@example.mn", "A").await;
    sign_up(&app, "b@example.mn", "B").await;

    let (_, account) = send(
        &app,
        "POST",
        "/savings",
        Some("a@example.mn"),
        Some(json!({ "name": "Trip" })),
    )
    .await;
    let account_id = account["id"].as_str().unwrap().to_string();

    let (status, member) = send(
        &app,
        "POST",
        &format!("/savings/{account_id}/members"),
        Some("a@example.mn"),
        Some(json!({ "email": "B@Example.mn" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["status"], "invited");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/savings/{account_id}/deposits"),
        Some("b@example.mn"),
        Some(json!({ "amount": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, inbox) = send(
        &app,
        "GET",
        "/notifications?unread_only=true",
        Some("b@example.mn"),
        None,
    )
    .await;
    assert_eq!(inbox[0]["kind"], "savings_invite");
    let notification_id = inbox[0]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/notifications/{notification_id}/accept"),
        Some("b@example.mn"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/savings/{account_id}/deposits"),
        Some("b@example.mn"),
        Some(json!({ "amount": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, detail) = send(
        &app,
        "GET",
        &format!("/savings/{account_id}"),
        Some("a@example.mn"),
        None,
    )
    .await;
    assert_eq!(detail["balance"], 1000);
}
