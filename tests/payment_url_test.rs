//! Redirect route: URL construction and the API-key gate.

mod common;

use axum::http::StatusCode;
use common::*;
use payment_relay::{
    middleware::{API_KEY_HEADER, API_SECRET_HEADER},
    models::PaymentRecord,
    services::{HmacSigner, Signer},
};
use std::sync::Arc;

const GATEWAY: &str = "http://127.0.0.1:9/pay";

#[tokio::test]
async fn test_payment_url_carries_signed_record() {
    let app = TestApp::new(GATEWAY).router();
    let (status, _, body) = post_json(app, "/payment_url", &submission(), &[]).await;
    assert_eq!(status, StatusCode::OK);

    let response = json_body(&body);
    let url = reqwest::Url::parse(response["paymentUrl"].as_str().unwrap()).unwrap();
    assert_eq!(url.host_str(), Some("checkout.example.com"));
    assert_eq!(url.path(), "/pay");

    let record: PaymentRecord = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let signature = response["signature"].as_str().unwrap();

    assert_eq!(record.get("signature"), Some(signature));
    assert_eq!(record.get("access_key"), Some(ACCESS_KEY));
    assert_eq!(record.get("transaction_uuid"), Some(TRANSACTION_UUID));
    assert!(HmacSigner::new(SECRET).verify(&record, signature).unwrap());
    assert!(!HmacSigner::new("wrong").verify(&record, signature).unwrap());
}

#[tokio::test]
async fn test_payment_url_absent_without_checkout() {
    let mut app = TestApp::new(GATEWAY);
    app.checkout_url = None;

    let (status, _, _) = post_json(app.router(), "/payment_url", &submission(), &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_api_credentials_rejected_before_signing() {
    let signer = Arc::new(CountingSigner::new(SECRET));
    let app = TestApp::new(GATEWAY)
        .api_credentials("key-1", "secret-1")
        .signer(signer.clone())
        .router();

    let (status, _, body) = post_json(app, "/payment_url", &submission(), &[]).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error_code"], "UNAUTHORIZED");
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn test_wrong_api_secret_rejected_before_signing() {
    let signer = Arc::new(CountingSigner::new(SECRET));
    let app = TestApp::new(GATEWAY)
        .api_credentials("key-1", "secret-1")
        .signer(signer.clone())
        .router();

    let headers = [(API_KEY_HEADER, "key-1"), (API_SECRET_HEADER, "secret-2")];
    let (status, _, _) = post_json(app, "/payment_url", &submission(), &headers).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn test_valid_api_credentials_sign_once() {
    let signer = Arc::new(CountingSigner::new(SECRET));
    let app = TestApp::new(GATEWAY)
        .api_credentials("key-1", "secret-1")
        .signer(signer.clone())
        .router();

    let headers = [(API_KEY_HEADER, "key-1"), (API_SECRET_HEADER, "secret-1")];
    let (status, _, body) = post_json(app, "/payment_url", &submission(), &headers).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(signer.calls(), 1);
    assert!(json_body(&body)["signature"].is_string());
}

#[tokio::test]
async fn test_api_gate_does_not_cover_proxy_route() {
    let signer = Arc::new(CountingSigner::new(SECRET));
    let app = TestApp::new(GATEWAY)
        .api_credentials("key-1", "secret-1")
        .signer(signer.clone())
        .router();

    let mut body = submission();
    body.as_object_mut().unwrap().remove("amount");
    let (status, _, _) = post_json(app, "/payment_form", &body, &[]).await;

    // Rejected by field validation, not by the gate, and never signed.
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    let app = TestApp::new(GATEWAY).router();
    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("strict-transport-security"));
}

#[test]
fn test_counting_signer_matches_hmac() {
    let record: PaymentRecord = [
        ("amount", "10.00"),
        ("currency", "USD"),
        ("signed_field_names", "amount,currency"),
    ]
    .into_iter()
    .collect();
    let spy = CountingSigner::new(SECRET);
    assert_eq!(
        spy.sign_record(&record).unwrap(),
        "aQc8NHtXzbqT+POhNAnoLK7CEXgxwuC654euGW89czE="
    );
    assert_eq!(spy.calls(), 1);
}
