#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{Request, StatusCode},
    Router,
};
use payment_relay::{
    config::Environment,
    create_router,
    error::SigningError,
    handlers::{AppState, HealthState},
    middleware::ApiCredentials,
    models::{PaymentRecord, SignedFieldNames},
    services::{
        payment_form::DEFAULT_SIGNED_FIELD_NAMES, CheckoutLinkBuilder, GatewayClient,
        HmacSigner, MerchantCredentials, PaymentDefaults, PaymentFormPreparer, Signer,
        TransactionIdGenerator,
    },
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const SECRET: &str = "s3cret";
pub const ACCESS_KEY: &str = "ak-123";
pub const PROFILE_ID: &str = "profile-9";
pub const TRANSACTION_UUID: &str = "txn-0001";
pub const CHECKOUT_URL: &str = "https://checkout.example.com/pay";

pub struct FixedId;

impl TransactionIdGenerator for FixedId {
    fn generate(&self) -> String {
        TRANSACTION_UUID.to_string()
    }
}

/// Signer that counts how often it was asked to sign.
pub struct CountingSigner {
    inner: HmacSigner,
    calls: AtomicUsize,
}

impl CountingSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            inner: HmacSigner::new(secret),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Signer for CountingSigner {
    fn sign(
        &self,
        record: &PaymentRecord,
        fields: &SignedFieldNames,
    ) -> Result<String, SigningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.sign(record, fields)
    }
}

pub struct TestApp {
    pub gateway_url: String,
    pub timeout: Duration,
    pub checkout_url: Option<String>,
    pub api_credentials: Option<ApiCredentials>,
    pub signer: Arc<dyn Signer>,
}

impl TestApp {
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            timeout: Duration::from_secs(5),
            checkout_url: Some(CHECKOUT_URL.to_string()),
            api_credentials: None,
            signer: Arc::new(HmacSigner::new(SECRET)),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_credentials(mut self, key: &str, secret: &str) -> Self {
        self.api_credentials = Some(ApiCredentials::new(key, secret));
        self
    }

    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = signer;
        self
    }

    pub fn router(self) -> Router {
        let preparer = PaymentFormPreparer::new(
            MerchantCredentials {
                access_key: ACCESS_KEY.to_string(),
                profile_id: PROFILE_ID.to_string(),
            },
            PaymentDefaults::default(),
            DEFAULT_SIGNED_FIELD_NAMES.parse().unwrap(),
            Arc::new(FixedId),
        );
        let state = AppState {
            preparer: Arc::new(preparer),
            signer: self.signer,
            gateway: Arc::new(GatewayClient::new(&self.gateway_url, self.timeout).unwrap()),
            checkout: self
                .checkout_url
                .map(|url| Arc::new(CheckoutLinkBuilder::new(&url).unwrap())),
        };

        create_router(
            state,
            HealthState::new(Environment::Test),
            self.api_credentials,
        )
    }
}

/// A submission carrying every client-supplied signed field.
pub fn submission() -> Value {
    json!({
        "reference_number": "INV-42",
        "amount": "10.00",
        "bill_to_address_line1": "Calle 50",
        "bill_to_address_city": "Panama",
        "bill_to_email": "payer@example.com",
        "bill_to_forename": "Ana",
        "bill_to_surname": "Diaz",
        "req_tax_amount": "0.70"
    })
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: &Value,
    headers: &[(&str, &str)],
) -> (StatusCode, Option<String>, Bytes) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let response = app
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, body)
}

pub fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

/// Gateway that accepts connections and never answers.
pub async fn silent_gateway() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}/pay")
}

/// Address nothing is listening on.
pub async fn closed_gateway() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/pay")
}
