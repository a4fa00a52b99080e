//! Error type for salt generation and hashing

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("Cost factor {0} outside the accepted range 4..=31")]
    InvalidCostFactor(u32),

    #[error("Malformed salt: {0}")]
    MalformedSalt(&'static str),

    #[error("Malformed stored hash")]
    MalformedStoredHash,

    #[error("bcrypt backend error: {0}")]
    Backend(String),
}

impl From<bcrypt::BcryptError> for HashError {
    fn from(e: bcrypt::BcryptError) -> Self {
        match e {
            bcrypt::BcryptError::CostNotAllowed(cost) => HashError::InvalidCostFactor(cost),
            other => HashError::Backend(other.to_string()),
        }
    }
}
