pub mod checkout;
pub mod gateway;
pub mod payment_form;
pub mod signer;
pub mod transaction_id;

pub use checkout::CheckoutLinkBuilder;
pub use gateway::{GatewayClient, GatewayResponse};
pub use payment_form::{MerchantCredentials, PaymentDefaults, PaymentFormPreparer, SignedPayment};
pub use signer::{canonical_payload, HmacSigner, Signer};
pub use transaction_id::{
    RandomTokenGenerator, TransactionIdGenerator, TransactionIdStrategy, UuidGenerator,
};
