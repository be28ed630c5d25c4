//! Common error types for ChainVault.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for ChainVault operations.
///
/// Every failure is classified where it originates and handed back to the
/// caller unchanged. Nothing in the core retries on its own.
#[derive(Debug, Error)]
pub enum Error {
    /// No signing account is configured, so no transaction can be sent.
    #[error("Wallet unavailable: no signing account configured")]
    WalletUnavailable,

    /// The ledger denied access to the record.
    ///
    /// A wrong access tag and a missing record are reported identically so
    /// that tag guesses reveal nothing about which records exist.
    #[error("Record not found or access denied")]
    AuthorizationOrNotFound,

    /// The stored ciphertext could not be decrypted under the derived key.
    #[error("Decryption failed")]
    DecryptionFailure,

    /// The ledger rejected a write for a domain reason.
    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    /// The transaction was submitted but no confirmation arrived in time.
    #[error("Confirmation not received within {0:?}")]
    ConfirmationTimeout(Duration),

    /// Transport-level failure talking to the ledger endpoint.
    #[error("Network error: {0}")]
    Network(String),

    /// A text field does not fit its fixed-width encoding.
    #[error("Input too long: {field} is {len} bytes, maximum is {max}")]
    InputTooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Encoded length in bytes.
        len: usize,
        /// Maximum encodable length in bytes.
        max: usize,
    },

    /// Cryptographic operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller may reasonably resubmit the operation.
    ///
    /// Only transport failures qualify. Resubmitting is always the
    /// caller's decision since ledger writes are not idempotent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ConfirmationTimeout(_) | Error::Network(_))
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
