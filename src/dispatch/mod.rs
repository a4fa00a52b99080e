//! Request dispatcher
//!
//! Maps one JSON request payload to one JSON response payload:
//!
//! ```text
//! {"action":"hash","text":"..."}                  -> {"hash":"$2b$12$..."}
//! {"action":"compare","text":"...","hash":"..."}  -> {"match":true}
//! anything else                                   -> {"Error":"..."}
//! ```
//!
//! Every failure is answered with the same small error shape; the specific
//! reason is only logged.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::algorithm::{HashEngine, HashError};
use crate::config::ServiceConfig;

/// Content type of every response payload
pub const CONTENT_TYPE: &str = "application/json";

/// Public message for oversized payloads
const TOO_LONG: &str = "Too long";

/// Public message for every other request problem
const INVALID_REQUEST: &str = "Invalid request";

/// Public message when the hashing core fails
const HASH_FAILED: &str = "Hashing failed";

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("payload is not a JSON request object")]
    MalformedPayload,

    #[error("request has no action")]
    MissingAction,

    #[error("unknown action")]
    UnknownAction(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error(transparent)]
    Hash(#[from] HashError),
}

impl DispatchError {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::PayloadTooLarge { .. } => "PayloadTooLarge",
            DispatchError::MalformedPayload => "MalformedPayload",
            DispatchError::MissingAction => "MissingAction",
            DispatchError::UnknownAction(_) => "UnknownAction",
            DispatchError::MissingField(_) => "MissingField",
            DispatchError::Hash(HashError::InvalidCostFactor(_)) => "InvalidCostFactor",
            DispatchError::Hash(HashError::MalformedStoredHash) => "MalformedStoredHash",
            DispatchError::Hash(_) => "HashFailure",
        }
    }

    /// The only text a caller ever sees
    pub fn public_message(&self) -> &'static str {
        match self {
            DispatchError::PayloadTooLarge { .. } => TOO_LONG,
            DispatchError::Hash(_) => HASH_FAILED,
            _ => INVALID_REQUEST,
        }
    }
}

/// A validated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Hash { text: String },
    Compare { text: String, hash: String },
}

/// Wire shape of an incoming payload; unknown fields are ignored
#[derive(Debug, Deserialize)]
struct RawRequest {
    action: Option<String>,
    text: Option<String>,
    hash: Option<String>,
}

/// Response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Hash {
        hash: String,
    },
    Match {
        #[serde(rename = "match")]
        matched: bool,
    },
    Error {
        #[serde(rename = "Error")]
        message: String,
    },
}

/// One complete answer to one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub success: bool,
    pub content_type: &'static str,
    pub body: Response,
}

impl Reply {
    fn success(body: Response) -> Self {
        Self {
            success: true,
            content_type: CONTENT_TYPE,
            body,
        }
    }

    fn failure(error: &DispatchError) -> Self {
        Self {
            success: false,
            content_type: CONTENT_TYPE,
            body: Response::Error {
                message: error.public_message().to_string(),
            },
        }
    }

    /// Serialized body as sent on the wire
    pub fn payload(&self) -> String {
        serde_json::to_string(&self.body)
            .unwrap_or_else(|_| format!(r#"{{"Error":"{INVALID_REQUEST}"}}"#))
    }
}

/// Validates requests and runs them against a hash engine
///
/// Holds no per-request state; one dispatcher serves every invocation.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    engine: Arc<HashEngine>,
    cost: u32,
    max_payload_bytes: usize,
}

impl Dispatcher {
    pub fn new(engine: Arc<HashEngine>, config: &ServiceConfig) -> Self {
        Self {
            engine,
            cost: config.cost,
            max_payload_bytes: config.max_payload_bytes,
        }
    }

    /// Dispatcher over a newly seeded engine
    pub fn from_config(config: &ServiceConfig) -> Self {
        let dispatcher = Self::new(Arc::new(HashEngine::seeded(config.entropy)), config);
        tracing::info!(
            cost = config.cost,
            max_payload = config.max_payload_bytes,
            entropy = %dispatcher.engine.salts().origin(),
            "hash engine ready"
        );
        dispatcher
    }

    pub fn engine(&self) -> &HashEngine {
        &self.engine
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    /// Handle one payload end to end. Never fails; errors become error replies.
    pub fn dispatch(&self, payload: &str) -> Reply {
        match self.parse(payload).and_then(|request| self.execute(request)) {
            Ok(body) => Reply::success(body),
            Err(e) => self.reject(&e),
        }
    }

    /// Error reply for a request refused before or during dispatch
    pub fn reject(&self, error: &DispatchError) -> Reply {
        tracing::debug!(kind = error.kind(), error = %error, "request rejected");
        Reply::failure(error)
    }

    /// Size check, JSON shape, action and required fields
    pub fn parse(&self, payload: &str) -> Result<Request, DispatchError> {
        if payload.len() > self.max_payload_bytes {
            return Err(DispatchError::PayloadTooLarge {
                len: payload.len(),
                max: self.max_payload_bytes,
            });
        }

        let value: Value =
            serde_json::from_str(payload).map_err(|_| DispatchError::MalformedPayload)?;
        if !value.is_object() {
            return Err(DispatchError::MalformedPayload);
        }
        let raw = RawRequest::deserialize(value).map_err(|_| DispatchError::MalformedPayload)?;

        let action = raw.action.ok_or(DispatchError::MissingAction)?;
        match action.as_str() {
            "hash" => Ok(Request::Hash {
                text: raw.text.ok_or(DispatchError::MissingField("text"))?,
            }),
            "compare" => Ok(Request::Compare {
                text: raw.text.ok_or(DispatchError::MissingField("text"))?,
                hash: raw.hash.ok_or(DispatchError::MissingField("hash"))?,
            }),
            _ => Err(DispatchError::UnknownAction(action)),
        }
    }

    /// Run a validated request; blocks for the duration of the hash
    pub fn execute(&self, request: Request) -> Result<Response, DispatchError> {
        match request {
            Request::Hash { text } => {
                let hash = self.engine.compute_hash(&text, self.cost)?;
                Ok(Response::Hash { hash })
            }
            Request::Compare { text, hash } => Ok(Response::Match {
                matched: self.engine.verify(&text, &hash),
            }),
        }
    }
}
