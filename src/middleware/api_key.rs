use crate::{config::SecretString, error::RelayError, services::signer::constant_time_eq};
use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use std::fmt;
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_SECRET_HEADER: &str = "x-api-secret";

/// Static key/secret pair callers must present.
#[derive(Clone)]
pub struct ApiCredentials {
    key: SecretString,
    secret: SecretString,
}

impl ApiCredentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: SecretString::new(key),
            secret: SecretString::new(secret),
        }
    }

    /// Both halves are always compared so timing does not reveal which one failed.
    pub fn matches(&self, key: Option<&str>, secret: Option<&str>) -> bool {
        let (Some(key), Some(secret)) = (key, secret) else {
            return false;
        };
        let key_ok = constant_time_eq(self.key.expose_secret().as_bytes(), key.as_bytes());
        let secret_ok =
            constant_time_eq(self.secret.expose_secret().as_bytes(), secret.as_bytes());
        key_ok & secret_ok
    }

    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<(), RelayError> {
        let header = |name: &str| headers.get(name).and_then(|h| h.to_str().ok());
        if self.matches(header(API_KEY_HEADER), header(API_SECRET_HEADER)) {
            Ok(())
        } else {
            Err(RelayError::Unauthorized)
        }
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("key", &self.key)
            .field("secret", &self.secret)
            .finish()
    }
}

// Axum middleware function
pub async fn api_key_layer(
    credentials: Arc<ApiCredentials>,
    request: Request,
    next: Next,
) -> Result<Response, RelayError> {
    credentials.verify_headers(request.headers())?;
    Ok(next.run(request).await)
}
