//! Hash and compare
//!
//! A hash is its 29-character salt followed by a 31-character digest, so the
//! salt needed to re-derive a stored hash is recovered by truncation:
//!
//! ```text
//! $2b$12$R9h/cIPz0gi.URNNX3kh2O PST9/PgBkqquzi.Ss7KIUgO2t0jWMUW
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!        salt (29)                      digest (31)
//! ```
//!
//! Only the first 72 bytes of the text take part in the hash, and text after
//! an embedded NUL byte is ignored; both are properties of the scheme.

use subtle::ConstantTimeEq;

use crate::error::HashError;
use crate::isaac::EntropySource;
use crate::params::{HASH_LEN, SALT_LEN};
use crate::salt::{Salt, SaltGenerator};

/// Salted bcrypt hashing backed by one salt generator
#[derive(Debug)]
pub struct HashEngine {
    salts: SaltGenerator,
}

impl HashEngine {
    pub fn new(salts: SaltGenerator) -> Self {
        Self { salts }
    }

    /// Engine over a freshly seeded randomness source
    pub fn seeded(preferred: EntropySource) -> Self {
        Self::new(SaltGenerator::seeded(preferred))
    }

    /// Hash `text` under a fresh salt at `cost`; always 60 characters
    pub fn compute_hash(&self, text: &str, cost: u32) -> Result<String, HashError> {
        let salt = self.salts.generate(cost)?;
        hash_with_salt(text, &salt)
    }

    /// See [`verify`]
    pub fn verify(&self, text: &str, stored_hash: &str) -> bool {
        verify(text, stored_hash)
    }

    pub fn salts(&self) -> &SaltGenerator {
        &self.salts
    }
}

/// Hash `text` under an existing salt, keeping the salt's scheme identifier
pub fn hash_with_salt(text: &str, salt: &Salt) -> Result<String, HashError> {
    let parts = bcrypt::hash_with_salt(scheme_input(text), salt.cost(), *salt.raw())?;
    let hash = parts.format_for_version(salt.scheme().version());
    if hash.len() != HASH_LEN {
        return Err(HashError::Backend(format!(
            "unexpected hash length {}",
            hash.len()
        )));
    }
    Ok(hash)
}

/// Whether `text` hashes to `stored_hash`.
///
/// The salt is taken from the first 29 bytes of `stored_hash`. Anything that
/// cannot be parsed as a salt, including input shorter than that, is a
/// mismatch rather than an error. The final comparison runs in constant time
/// over the full length.
pub fn verify(text: &str, stored_hash: &str) -> bool {
    let salt = match extract_salt(stored_hash) {
        Ok(salt) => salt,
        Err(e) => {
            tracing::debug!(error = %e, "stored hash rejected");
            return false;
        }
    };

    match hash_with_salt(text, &salt) {
        Ok(recomputed) => constant_time_eq(recomputed.as_bytes(), stored_hash.as_bytes()),
        Err(e) => {
            tracing::debug!(error = %e, "re-derivation failed");
            false
        }
    }
}

/// Salt prefix of a stored hash, never reading past `SALT_LEN` bytes
pub fn extract_salt(stored_hash: &str) -> Result<Salt, HashError> {
    if stored_hash.len() < SALT_LEN {
        return Err(HashError::MalformedStoredHash);
    }
    let prefix = stored_hash
        .get(..SALT_LEN)
        .ok_or(HashError::MalformedStoredHash)?;
    Salt::parse(prefix)
}

/// Byte equality that inspects every byte regardless of where they differ
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// The bytes the scheme sees: everything before the first NUL
fn scheme_input(text: &str) -> &[u8] {
    let bytes = text.as_bytes();
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_salt_clamps_short_input() {
        assert_eq!(extract_salt(""), Err(HashError::MalformedStoredHash));
        assert_eq!(extract_salt("$2b$12$"), Err(HashError::MalformedStoredHash));
    }

    #[test]
    fn extract_salt_ignores_digest_and_trailing_bytes() {
        let stored = "$2b$04$abcdefghijklmnopqrstuuTHIS IS NOT A DIGEST AT ALL, plus trailing junk";
        let salt = extract_salt(stored).unwrap();
        assert_eq!(salt.as_str(), "$2b$04$abcdefghijklmnopqrstuu");
    }

    #[test]
    fn extract_salt_rejects_split_character() {
        // 28 ASCII bytes then a two-byte character straddling the salt boundary
        let stored = format!("$2b$04${}é", "a".repeat(21));
        assert!(extract_salt(&stored).is_err());
    }

    #[test]
    fn verify_cost_comes_from_the_stored_hash() {
        let stored = format!("$2b$31${}", ".".repeat(53));
        assert_eq!(extract_salt(&stored).map(|salt| salt.cost()), Ok(31));
    }

    #[test]
    fn scheme_input_stops_at_nul() {
        assert_eq!(scheme_input("abc\0def"), b"abc");
        assert_eq!(scheme_input("abc"), b"abc");
        assert_eq!(scheme_input(""), b"");
    }

    #[test]
    fn constant_time_eq_handles_lengths() {
        assert!(constant_time_eq(b"same", b"same"));
        assert!(!constant_time_eq(b"same", b"sane"));
        assert!(!constant_time_eq(b"same", b"same-but-longer"));
        assert!(constant_time_eq(b"", b""));
    }
}
