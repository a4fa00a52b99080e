//! Service configuration
//!
//! The hash cost belongs to the service, never to a request: callers cannot
//! force a cheap (or ruinously expensive) hash.

use thiserror::Error;

use crate::algorithm::{DEFAULT_COST, EntropySource, MAX_COST, MIN_COST};

/// Largest accepted request payload in bytes
pub const DEFAULT_MAX_PAYLOAD: usize = 200;

/// Environment variable overriding the hash cost
pub const ENV_COST: &str = "HASHBOX_COST";

/// Environment variable overriding the payload limit
pub const ENV_MAX_PAYLOAD: &str = "HASHBOX_MAX_PAYLOAD";

/// Environment variable selecting the entropy source (`os` or `time`)
pub const ENV_ENTROPY: &str = "HASHBOX_ENTROPY";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("hash cost {0} is outside 4..=31")]
    InvalidCost(u32),

    #[error("payload limit must be at least one byte")]
    ZeroPayloadLimit,
}

/// Effective service settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// bcrypt cost used for every `hash` request
    pub cost: u32,
    /// Requests longer than this are rejected before parsing
    pub max_payload_bytes: usize,
    /// Preferred seed for the randomness source
    pub entropy: EntropySource,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cost: DEFAULT_COST,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD,
            entropy: EntropySource::Os,
        }
    }
}

impl ServiceConfig {
    /// Reject settings the dispatcher cannot run with
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(MIN_COST..=MAX_COST).contains(&self.cost) {
            return Err(ConfigError::InvalidCost(self.cost));
        }
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::ZeroPayloadLimit);
        }
        Ok(self)
    }
}
