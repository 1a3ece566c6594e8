pub mod api_key;
pub mod rate_limit;
pub mod security_headers;

pub use api_key::{api_key_layer, ApiCredentials, API_KEY_HEADER, API_SECRET_HEADER};
pub use rate_limit::{client_ip_layer, with_rate_limit};
pub use security_headers::add_security_headers;
