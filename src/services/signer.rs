//! Canonical signed-string construction and HMAC-SHA256 signing.
//!
//! The gateway recomputes the signature over `name=value` pairs joined with
//! `,`, in exactly the order listed in `signed_field_names`. Values are
//! interpolated raw: no escaping, no quoting.

use crate::error::SigningError;
use crate::models::{PaymentRecord, SignedFieldNames};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Builds `k1=v1,k2=v2,...` for the listed fields.
///
/// Fails on the first listed field the record does not carry.
pub fn canonical_payload(
    record: &PaymentRecord,
    fields: &SignedFieldNames,
) -> Result<String, SigningError> {
    let segments = fields
        .iter()
        .map(|name| {
            record
                .get(name)
                .map(|value| format!("{name}={value}"))
                .ok_or_else(|| SigningError::MissingField(name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(segments.join(","))
}

pub trait Signer: Send + Sync {
    /// Signs the listed fields of `record`, returning the encoded signature.
    fn sign(&self, record: &PaymentRecord, fields: &SignedFieldNames)
        -> Result<String, SigningError>;

    /// Signs using the list carried in the record's own `signed_field_names`.
    fn sign_record(&self, record: &PaymentRecord) -> Result<String, SigningError> {
        let fields = record.signed_field_names()?;
        self.sign(record, &fields)
    }

    /// Recomputes the signature over the record's declared fields and compares
    /// it with `signature` in constant time.
    fn verify(&self, record: &PaymentRecord, signature: &str) -> Result<bool, SigningError> {
        let expected = self.sign_record(record)?;
        Ok(constant_time_eq(expected.as_bytes(), signature.as_bytes()))
    }
}

/// HMAC-SHA256 over the canonical payload, base64 (standard alphabet, padded).
pub struct HmacSigner {
    key: Zeroizing<Vec<u8>>,
}

impl HmacSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: Zeroizing::new(secret.as_ref().to_vec()),
        }
    }
}

impl Signer for HmacSigner {
    fn sign(
        &self,
        record: &PaymentRecord,
        fields: &SignedFieldNames,
    ) -> Result<String, SigningError> {
        let payload = canonical_payload(record, fields)?;
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// Constant-time comparison that leaks neither content nor length.
///
/// Both sides are hashed to fixed-size digests before the comparison.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let ha = Sha256::digest(a);
    let hb = Sha256::digest(b);
    ha.ct_eq(&hb).into()
}
