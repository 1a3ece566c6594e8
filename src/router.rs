use crate::{
    handlers::{health_check, payment_form, payment_url, relay_prepared, AppState, HealthState},
    middleware::{add_security_headers, api_key_layer, ApiCredentials},
};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Form submissions are small; anything larger is rejected before parsing.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Builds the relay routes.
///
/// `POST /payment_url` exists only when a checkout URL is configured, and is
/// gated by `api_credentials` when given. Rate limiting is applied by the
/// caller since it needs the peer address from the listener.
pub fn create_router(
    state: AppState,
    health: HealthState,
    api_credentials: Option<ApiCredentials>,
) -> Router {
    let mut payments = Router::new()
        .route("/payment_form", post(payment_form))
        .route("/relay", post(relay_prepared));

    if state.checkout.is_some() {
        let mut redirect = post(payment_url);
        match api_credentials {
            Some(credentials) => {
                let credentials = Arc::new(credentials);
                redirect = redirect.layer(axum_middleware::from_fn(move |req, next| {
                    let credentials = credentials.clone();
                    async move { api_key_layer(credentials, req, next).await }
                }));
            }
            None => tracing::warn!("API_KEY not configured, /payment_url is open to any caller"),
        }
        payments = payments.route("/payment_url", redirect);
    }

    let payments: Router = payments.with_state(state);
    let app: Router = Router::new()
        .route("/health", get(health_check))
        .with_state(health)
        .merge(payments)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    add_security_headers(app)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
}
