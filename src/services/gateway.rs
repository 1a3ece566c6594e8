use crate::{error::RelayError, models::PaymentRecord};
use anyhow::Result;
use axum::body::Bytes;
use reqwest::Url;
use std::time::Duration;

/// Hosted-checkout endpoints for each gateway environment.
pub const TEST_GATEWAY_URL: &str = "https://testsecureacceptance.cybersource.com/pay";
pub const PRODUCTION_GATEWAY_URL: &str = "https://secureacceptance.cybersource.com/pay";

/// Upstream reply, relayed to the caller as-is.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Server-to-server POST of signed forms to the payment gateway.
#[derive(Clone)]
pub struct GatewayClient {
    url: Url,
    client: reqwest::Client,
    timeout: Duration,
}

impl GatewayClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url,
            client,
            timeout,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Sends the record as `application/x-www-form-urlencoded`.
    ///
    /// Non-2xx replies are reported as [`RelayError::GatewayStatus`].
    pub async fn submit(&self, record: &PaymentRecord) -> Result<GatewayResponse, RelayError> {
        let response = self
            .client
            .post(self.url.clone())
            .form(record)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                gateway = %self.url,
                "Payment gateway returned an error status"
            );
            return Err(RelayError::GatewayStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        tracing::debug!(
            status = status.as_u16(),
            bytes = body.len(),
            "Payment gateway responded"
        );

        Ok(GatewayResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    fn classify(&self, err: reqwest::Error) -> RelayError {
        if err.is_timeout() {
            RelayError::GatewayTimeout(format!(
                "no response from {} within {:?}",
                self.url, self.timeout
            ))
        } else {
            RelayError::Gateway(err)
        }
    }
}
