use crate::error::{RelayError, SigningError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Record field that carries the ordered list of signed field names.
pub const SIGNED_FIELD_NAMES: &str = "signed_field_names";
/// Record field the computed signature is attached under.
pub const SIGNATURE: &str = "signature";

/// One payment-form submission: field name to raw string value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentRecord {
    fields: BTreeMap<String, String>,
}

impl PaymentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from an inbound JSON object.
    ///
    /// Strings are taken verbatim; numbers and booleans are stringified.
    /// Nulls, arrays and nested objects have no form encoding and are rejected.
    pub fn from_json(object: Map<String, Value>) -> Result<Self, RelayError> {
        let mut record = Self::new();
        for (name, value) in object {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => {
                    return Err(RelayError::InvalidField {
                        field: name,
                        reason: "null is not a form value".to_string(),
                    })
                }
                Value::Array(_) | Value::Object(_) => {
                    return Err(RelayError::InvalidField {
                        field: name,
                        reason: "nested values are not form values".to_string(),
                    })
                }
            };
            record.fields.insert(name, value);
        }
        Ok(record)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses the record's own `signed_field_names` value.
    pub fn signed_field_names(&self) -> Result<SignedFieldNames, SigningError> {
        let raw = self
            .get(SIGNED_FIELD_NAMES)
            .ok_or_else(|| SigningError::MissingField(SIGNED_FIELD_NAMES.to_string()))?;
        raw.parse()
    }
}

impl<K, V> FromIterator<(K, V)> for PaymentRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Ordered list of field names covered by a signature.
///
/// Order is significant and kept exactly as given; names are not trimmed
/// or sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedFieldNames(Vec<String>);

impl SignedFieldNames {
    pub fn new<I, S>(names: I) -> Result<Self, SigningError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(SigningError::EmptyFieldList);
        }
        for (position, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(SigningError::EmptyFieldName(position));
            }
            if names[..position].contains(name) {
                return Err(SigningError::DuplicateField(name.clone()));
            }
        }
        Ok(Self(names))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First listed name the record cannot resolve, if any.
    pub fn first_missing(&self, record: &PaymentRecord) -> Option<&str> {
        self.iter().find(|name| !record.contains(name))
    }
}

impl FromStr for SignedFieldNames {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(SigningError::EmptyFieldList);
        }
        Self::new(s.split(','))
    }
}

impl fmt::Display for SignedFieldNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}
