//! bcrypt `$2b$` scheme parameters
//!
//! The textual lengths here are wire format: other implementations of the
//! scheme produce and expect exactly these sizes.

/// Smallest cost factor the scheme accepts
pub const MIN_COST: u32 = 4;

/// Largest cost factor the scheme accepts
pub const MAX_COST: u32 = 31;

/// Cost used by the service unless configured otherwise
pub const DEFAULT_COST: u32 = 12;

/// Scheme identifier written into new salts (`$2b$`)
pub const SCHEME_ID: &str = "2b";

/// Raw salt bytes consumed by the scheme
pub const RAW_SALT_LEN: usize = 16;

/// Radix64 characters encoding the raw salt
pub const ENCODED_SALT_LEN: usize = 22;

/// `$2b$12$` header: two `$`, scheme id, `$`, two cost digits, `$`
pub const SALT_HEADER_LEN: usize = 7;

/// Full salt string length (29)
pub const SALT_LEN: usize = SALT_HEADER_LEN + ENCODED_SALT_LEN;

/// Radix64 characters of the digest following the salt
pub const DIGEST_LEN: usize = 31;

/// Full hash string length (60)
pub const HASH_LEN: usize = SALT_LEN + DIGEST_LEN;

/// Bytes drawn from the generator per salt
pub const RANDOM_BLOCK_SIZE: usize = 64;

/// Words in the ISAAC result and memory tables
pub const ISAAC_WORDS: usize = 256;

/// Input bytes the scheme considers; the rest is ignored by the algorithm
pub const MAX_INPUT_LEN: usize = 72;
