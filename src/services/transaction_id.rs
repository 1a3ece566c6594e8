//! Per-request transaction correlation identifiers.
//!
//! These are correlation tokens, not secrets; the default generator is not
//! required to be cryptographically strong.

use rand::Rng;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

pub const TRANSACTION_UUID_ALPHABET: &[u8; 63] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-";

pub const DEFAULT_TRANSACTION_UUID_LENGTH: usize = 50;

pub trait TransactionIdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniform draw from [`TRANSACTION_UUID_ALPHABET`].
#[derive(Debug, Clone)]
pub struct RandomTokenGenerator {
    length: usize,
}

impl RandomTokenGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomTokenGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSACTION_UUID_LENGTH)
    }
}

impl TransactionIdGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| {
                let index = rng.gen_range(0..TRANSACTION_UUID_ALPHABET.len());
                TRANSACTION_UUID_ALPHABET[index] as char
            })
            .collect()
    }
}

/// Random v4 UUID, hyphen-free.
#[derive(Debug, Clone, Default)]
pub struct UuidGenerator;

impl TransactionIdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionIdStrategy {
    #[default]
    Random,
    Uuid,
}

impl TransactionIdStrategy {
    pub fn generator(self) -> Arc<dyn TransactionIdGenerator> {
        match self {
            TransactionIdStrategy::Random => Arc::new(RandomTokenGenerator::default()),
            TransactionIdStrategy::Uuid => Arc::new(UuidGenerator),
        }
    }
}

impl FromStr for TransactionIdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(TransactionIdStrategy::Random),
            "uuid" => Ok(TransactionIdStrategy::Uuid),
            other => Err(format!("Unknown transaction id strategy: {other}")),
        }
    }
}
