use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Redirect variant result: where to send the shopper, and the signature
/// embedded in that URL.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUrlResponse {
    pub payment_url: String,
    pub signature: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_url_uses_camel_case_keys() {
        let response = PaymentUrlResponse {
            payment_url: "https://checkout.example.com/?amount=1".to_string(),
            signature: "abc=".to_string(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["paymentUrl"], "https://checkout.example.com/?amount=1");
        assert_eq!(value["signature"], "abc=");
    }
}
