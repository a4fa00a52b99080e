//! # Hashbox Core
//!
//! Salted, adaptively-costed password hashing in the bcrypt `$2b$` family,
//! with salts drawn from a process-owned ISAAC generator.
//!
//! ## Pipeline
//!
//! ```text
//! RandomSource --64 bytes--> SaltGenerator --$2b$NN$...--> HashEngine
//! ```
//!
//! - Salts are 29 characters: `$2b$` + two cost digits + `$` + 22 radix64
//!   characters encoding 16 random bytes.
//! - Hashes are 60 characters: the salt followed by a 31 character digest.
//! - Cost factors run from 4 to 31; each step doubles the work.
//!
//! ## Example
//!
//! ```rust
//! use hashbox_core::{EntropySource, HashEngine};
//!
//! let engine = HashEngine::seeded(EntropySource::Os);
//! let hash = engine.compute_hash("hunter2", 4).unwrap();
//!
//! assert_eq!(hash.len(), 60);
//! assert!(engine.verify("hunter2", &hash));
//! assert!(!engine.verify("hunter3", &hash));
//! ```

mod engine;
mod error;
mod isaac;
mod params;
mod salt;

pub use engine::{HashEngine, constant_time_eq, extract_salt, hash_with_salt, verify};
pub use error::HashError;
pub use isaac::{EntropySource, Isaac, RandomSource};
pub use params::*;
pub use salt::{Salt, SaltGenerator, Scheme};

#[cfg(test)]
mod tests;
