//! Hashbox Service Library
//!
//! A minimal credential-hashing service: given text it returns a salted
//! bcrypt hash, given text and a stored hash it reports whether they match.
//!
//! # Overview
//!
//! - [`algorithm`] is the hashing core (randomness source, salts, hash/compare)
//! - [`dispatch`] turns JSON request payloads into core calls and responses
//! - [`invocation`] is the newline-delimited request/response loop
//!
//! # Example
//!
//! ```rust
//! use hashbox::config::ServiceConfig;
//! use hashbox::dispatch::{Dispatcher, Response};
//!
//! let config = ServiceConfig { cost: 4, ..ServiceConfig::default() };
//! let dispatcher = Dispatcher::from_config(&config);
//!
//! let reply = dispatcher.dispatch(r#"{"action":"hash","text":"hello"}"#);
//! let Response::Hash { hash } = reply.body else { panic!("expected a hash") };
//!
//! let payload = format!(r#"{{"action":"compare","text":"hello","hash":"{hash}"}}"#);
//! assert_eq!(dispatcher.dispatch(&payload).body, Response::Match { matched: true });
//! ```

// Re-export the core algorithm
pub use hashbox_core as algorithm;

pub mod config;
pub mod dispatch;
pub mod invocation;
pub mod logging;

// Convenience re-exports
pub use algorithm::{EntropySource, HashEngine};
pub use dispatch::{Dispatcher, Reply, Request, Response};
