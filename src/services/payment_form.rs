use crate::{
    error::{RelayError, SigningError},
    models::{PaymentRecord, SignedFieldNames, SIGNATURE, SIGNED_FIELD_NAMES},
    services::{Signer, TransactionIdGenerator},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const DEFAULT_SIGNED_FIELD_NAMES: &str = "access_key,profile_id,transaction_uuid,\
signed_field_names,unsigned_field_names,signed_date_time,locale,transaction_type,\
reference_number,amount,currency,bill_to_address_line1,bill_to_address_city,\
bill_to_address_country,bill_to_email,bill_to_forename,bill_to_surname,req_tax_amount,\
line_item_count,item_0_unit_price,item_0_quantity";

/// Gateway timestamp format: UTC, second precision.
const SIGNED_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone)]
pub struct MerchantCredentials {
    pub access_key: String,
    pub profile_id: String,
}

/// Fixed values injected into every payment form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDefaults {
    pub locale: String,
    pub transaction_type: String,
    pub currency: String,
    pub bill_to_address_country: String,
}

impl Default for PaymentDefaults {
    fn default() -> Self {
        Self {
            locale: "es-es".to_string(),
            transaction_type: "sale,create_payment_token".to_string(),
            currency: "USD".to_string(),
            bill_to_address_country: "PA".to_string(),
        }
    }
}

/// A record ready to leave the relay, with its signature attached.
#[derive(Debug, Clone)]
pub struct SignedPayment {
    pub record: PaymentRecord,
    pub signature: String,
}

impl SignedPayment {
    pub fn transaction_uuid(&self) -> Option<&str> {
        self.record.get("transaction_uuid")
    }
}

/// Turns a client submission into a complete, signed payment form.
pub struct PaymentFormPreparer {
    credentials: MerchantCredentials,
    defaults: PaymentDefaults,
    signed_fields: SignedFieldNames,
    ids: Arc<dyn TransactionIdGenerator>,
}

impl PaymentFormPreparer {
    pub fn new(
        credentials: MerchantCredentials,
        defaults: PaymentDefaults,
        signed_fields: SignedFieldNames,
        ids: Arc<dyn TransactionIdGenerator>,
    ) -> Self {
        Self {
            credentials,
            defaults,
            signed_fields,
            ids,
        }
    }

    /// Injects credentials and per-request metadata. Injected values win over
    /// anything the client sent under the same name.
    pub fn prepare(&self, mut record: PaymentRecord, now: DateTime<Utc>) -> PaymentRecord {
        record.remove(SIGNATURE);

        record.insert("access_key", self.credentials.access_key.as_str());
        record.insert("profile_id", self.credentials.profile_id.as_str());
        record.insert("transaction_uuid", self.ids.generate());
        record.insert(SIGNED_FIELD_NAMES, self.signed_fields.to_string());
        record.insert("unsigned_field_names", "");
        record.insert(
            "signed_date_time",
            now.format(SIGNED_DATE_TIME_FORMAT).to_string(),
        );
        record.insert("locale", self.defaults.locale.as_str());
        record.insert("transaction_type", self.defaults.transaction_type.as_str());
        record.insert("currency", self.defaults.currency.as_str());
        record.insert(
            "bill_to_address_country",
            self.defaults.bill_to_address_country.as_str(),
        );

        if let Some(amount) = record.get("amount").map(str::to_string) {
            record.insert("line_item_count", "1");
            record.insert("item_0_unit_price", amount);
            record.insert("item_0_quantity", "1");
        }

        record
    }

    /// Prepares, validates and signs a submission.
    ///
    /// Every configured signed field must resolve before the signer runs.
    pub fn prepare_signed(
        &self,
        submission: PaymentRecord,
        now: DateTime<Utc>,
        signer: &dyn Signer,
    ) -> Result<SignedPayment, RelayError> {
        let mut record = self.prepare(submission, now);
        if let Some(missing) = self.signed_fields.first_missing(&record) {
            return Err(SigningError::MissingField(missing.to_string()).into());
        }

        let signature = signer.sign(&record, &self.signed_fields)?;
        record.insert(SIGNATURE, signature.as_str());

        tracing::info!(
            transaction_uuid = record.get("transaction_uuid").unwrap_or_default(),
            reference_number = record.get("reference_number").unwrap_or_default(),
            "Payment form signed"
        );

        Ok(SignedPayment { record, signature })
    }
}
