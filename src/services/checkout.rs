use crate::models::PaymentRecord;
use anyhow::{bail, Result};
use reqwest::Url;

/// Builds redirect URLs to the checkout front-end with the signed record as
/// query parameters.
#[derive(Debug, Clone)]
pub struct CheckoutLinkBuilder {
    base: Url,
}

impl CheckoutLinkBuilder {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            bail!("Checkout URL cannot carry query parameters: {}", base);
        }
        Ok(Self { base })
    }

    /// Appends every record field to any query the base URL already has.
    pub fn payment_url(&self, record: &PaymentRecord) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut().extend_pairs(record.iter());
        url
    }
}
