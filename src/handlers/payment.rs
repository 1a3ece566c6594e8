use crate::{
    config::Config,
    error::{RelayError, SigningError},
    models::{PaymentRecord, PaymentUrlResponse, SIGNATURE},
    services::{
        CheckoutLinkBuilder, GatewayClient, GatewayResponse, HmacSigner, MerchantCredentials,
        PaymentFormPreparer, Signer,
    },
};
use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub preparer: Arc<PaymentFormPreparer>,
    pub signer: Arc<dyn Signer>,
    pub gateway: Arc<GatewayClient>,
    pub checkout: Option<Arc<CheckoutLinkBuilder>>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let preparer = PaymentFormPreparer::new(
            MerchantCredentials {
                access_key: config.access_key.clone(),
                profile_id: config.profile_id.clone(),
            },
            config.payment_defaults.clone(),
            config.signed_field_names.clone(),
            config.transaction_id_strategy.generator(),
        );
        let checkout = config
            .checkout_url
            .as_deref()
            .map(CheckoutLinkBuilder::new)
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            preparer: Arc::new(preparer),
            signer: Arc::new(HmacSigner::new(config.secret_key.expose_secret())),
            gateway: Arc::new(GatewayClient::new(
                &config.gateway_url,
                config.gateway_timeout,
            )?),
            checkout,
        })
    }
}

type JsonObject = Map<String, Value>;

fn read_record(payload: Result<Json<JsonObject>, JsonRejection>) -> Result<PaymentRecord, RelayError> {
    let Json(object) = payload.map_err(|e| RelayError::InvalidPayload(e.body_text()))?;
    PaymentRecord::from_json(object)
}

fn relay_response(reply: GatewayResponse) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK);
    let mut response = (status, reply.body).into_response();

    let content_type = reply
        .content_type
        .and_then(|v| HeaderValue::from_str(&v).ok());
    match content_type {
        Some(value) => {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        None => {
            response.headers_mut().remove(header::CONTENT_TYPE);
        }
    }
    response
}

/// Signs the submission and posts it to the gateway, relaying the reply.
pub async fn payment_form(
    State(state): State<AppState>,
    payload: Result<Json<JsonObject>, JsonRejection>,
) -> Result<Response, RelayError> {
    let submission = read_record(payload)?;
    let signed = state
        .preparer
        .prepare_signed(submission, Utc::now(), state.signer.as_ref())?;

    let reply = state.gateway.submit(&signed.record).await?;

    tracing::info!(
        transaction_uuid = signed.transaction_uuid().unwrap_or_default(),
        status = reply.status,
        "Payment form relayed to gateway"
    );

    Ok(relay_response(reply))
}

/// Signs the submission and returns a checkout redirect carrying it.
pub async fn payment_url(
    State(state): State<AppState>,
    payload: Result<Json<JsonObject>, JsonRejection>,
) -> Result<Json<PaymentUrlResponse>, RelayError> {
    let checkout = state
        .checkout
        .clone()
        .ok_or_else(|| RelayError::InternalError("checkout URL not configured".to_string()))?;

    let submission = read_record(payload)?;
    let signed = state
        .preparer
        .prepare_signed(submission, Utc::now(), state.signer.as_ref())?;

    let url = checkout.payment_url(&signed.record);

    tracing::info!(
        transaction_uuid = signed.transaction_uuid().unwrap_or_default(),
        "Payment URL issued"
    );

    Ok(Json(PaymentUrlResponse {
        payment_url: url.to_string(),
        signature: signed.signature,
    }))
}

/// Forwards a record prepared earlier, after checking its signature still
/// holds.
pub async fn relay_prepared(
    State(state): State<AppState>,
    payload: Result<Json<JsonObject>, JsonRejection>,
) -> Result<Response, RelayError> {
    let record = read_record(payload)?;
    let signature = record
        .get(SIGNATURE)
        .ok_or_else(|| SigningError::MissingField(SIGNATURE.to_string()))?;

    if !state.signer.verify(&record, signature)? {
        return Err(RelayError::InvalidSignature);
    }

    let reply = state.gateway.submit(&record).await?;

    tracing::info!(
        transaction_uuid = record.get("transaction_uuid").unwrap_or_default(),
        status = reply.status,
        "Prepared payment relayed to gateway"
    );

    Ok(relay_response(reply))
}
