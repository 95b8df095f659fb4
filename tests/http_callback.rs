//! HTTP surface tests: routes, extractors and error mapping over the
//! in-memory engine.

mod common;

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use payment_reconciler::adapters::http::payment_router;
use payment_reconciler::domain::payment::PaymentStatus;

use common::{plan, TestApp};

fn router(app: &TestApp) -> Router {
    payment_router().with_state(app.app_state())
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn form_callback(fields: &[(String, String)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/payments/callback")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(serde_urlencoded::to_string(fields).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_live_gateway() {
    let app = TestApp::new();

    let response = router(&app)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["gateway"], "live");
}

#[tokio::test]
async fn signed_form_callback_is_acknowledged() {
    let app = TestApp::new();
    let intent = app.pending("owner-1", plan("basic")).await;

    let response = router(&app)
        .oneshot(form_callback(&app.signed_fields(&intent, "Complete")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["acknowledged"], true);
    assert_eq!(body["outcome"], "settled");
    assert_eq!(body["payment_id"], intent.id.to_string());
    assert_eq!(app.stored(&intent).await.status, PaymentStatus::Completed);
}

#[tokio::test]
async fn redelivered_callback_is_acknowledged_as_duplicate() {
    let app = TestApp::new();
    let intent = app.pending("owner-2", plan("basic")).await;
    let fields = app.signed_fields(&intent, "Complete");

    router(&app).oneshot(form_callback(&fields)).await.unwrap();
    let response = router(&app).oneshot(form_callback(&fields)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["outcome"], "duplicate");
}

#[tokio::test]
async fn json_callback_is_accepted() {
    let app = TestApp::new();
    let intent = app.pending("owner-3", plan("premium")).await;
    let fields: serde_json::Map<String, Value> = app
        .signed_fields(&intent, "Cancelled")
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    let request = Request::builder()
        .method("POST")
        .uri("/api/payments/callback")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(Value::Object(fields).to_string()))
        .unwrap();
    let response = router(&app).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.stored(&intent).await.status, PaymentStatus::Cancelled);
}

#[tokio::test]
async fn forged_callback_is_unauthorized() {
    let app = TestApp::new();
    let intent = app.pending("owner-4", plan("basic")).await;
    let fields: Vec<(String, String)> = app
        .signed_fields(&intent, "Complete")
        .into_iter()
        .map(|(k, v)| if k == "HashCheck" { (k, "00".repeat(32)) } else { (k, v) })
        .collect();

    let response = router(&app).oneshot(form_callback(&fields)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error_code"], "INVALID_SIGNATURE");
    assert_eq!(app.stored(&intent).await.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn create_payment_requires_caller_identity() {
    let app = TestApp::new();

    let request = Request::builder()
        .method("POST")
        .uri("/api/payments")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"purpose":{"kind":"subscription","plan":"basic"}}"#))
        .unwrap();
    let response = router(&app).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.intents.count(), 0);
}

#[tokio::test]
async fn payment_status_is_private_to_owner() {
    let app = TestApp::new();
    let intent = app.pending("owner-5", plan("basic")).await;
    let uri = format!("/api/payments/{}", intent.id);

    let own = router(&app)
        .oneshot(
            Request::get(&uri)
                .header("X-User-Id", "owner-5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(own.status(), StatusCode::OK);
    let body = json_body(own).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["amount_cents"], 4_900);

    let other = router(&app)
        .oneshot(
            Request::get(&uri)
                .header("X-User-Id", "someone-else")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_payment_id_is_bad_request() {
    let app = TestApp::new();

    let response = router(&app)
        .oneshot(
            Request::get("/api/payments/not-a-uuid")
                .header("X-User-Id", "owner-6")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_quota_starts_empty() {
    let app = TestApp::new();

    let response = router(&app)
        .oneshot(
            Request::get("/api/listing-quota")
                .header("X-User-Id", "owner-7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["owner_id"], "owner-7");
    assert_eq!(body["purchased_slots"], 0);
}
