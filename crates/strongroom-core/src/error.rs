//! Error types for the strongroom transaction compiler
//!
//! Every input reaches the compiler from a remote backend, so malformed data
//! surfaces as one of these variants rather than a panic.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Vault address is missing from the transaction context")]
    MissingVault,

    #[error("Chain id is missing from the transaction context")]
    MissingChain,

    #[error("Contract address missing: {0}")]
    MissingContractAddresses(String),

    #[error("Invalid whitelist: {0}")]
    InvalidWhitelist(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::InvalidHex(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
