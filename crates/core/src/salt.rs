//! Salt generation and the `$2b$NN$<radix64>` salt encoding

use core::fmt;
use std::sync::{Mutex, PoisonError};

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::error::HashError;
use crate::isaac::{EntropySource, RandomSource};
use crate::params::*;

/// bcrypt's radix64: base64 with the `./A-Za-z0-9` alphabet and no padding.
///
/// Trailing bits of the last character are ignored when decoding, the same
/// way crypt_blowfish reads stored salts.
pub(crate) const RADIX64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::BCRYPT,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Scheme identifiers understood when re-deriving a stored hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    TwoA,
    TwoB,
    TwoY,
}

impl Scheme {
    /// Identifier as written between the first two `$`
    pub fn id(self) -> &'static str {
        match self {
            Scheme::TwoA => "2a",
            Scheme::TwoB => SCHEME_ID,
            Scheme::TwoY => "2y",
        }
    }

    fn from_id(id: &str) -> Option<Self> {
        match id {
            "2a" => Some(Scheme::TwoA),
            "2b" => Some(Scheme::TwoB),
            "2y" => Some(Scheme::TwoY),
            _ => None,
        }
    }

    pub(crate) fn version(self) -> bcrypt::Version {
        match self {
            Scheme::TwoA => bcrypt::Version::TwoA,
            Scheme::TwoB => bcrypt::Version::TwoB,
            Scheme::TwoY => bcrypt::Version::TwoY,
        }
    }
}

/// A 29-character salt: scheme id, cost, 16 random bytes in radix64
#[derive(Clone, PartialEq, Eq)]
pub struct Salt {
    scheme: Scheme,
    cost: u32,
    raw: [u8; RAW_SALT_LEN],
    text: String,
}

impl Salt {
    /// Canonical salt encoding.
    ///
    /// Only the first 16 bytes of `random` are used; shorter input is
    /// rejected.
    pub fn encode(scheme: Scheme, cost: u32, random: &[u8]) -> Result<Self, HashError> {
        check_cost(cost)?;
        let raw: [u8; RAW_SALT_LEN] = random
            .get(..RAW_SALT_LEN)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(HashError::MalformedSalt("fewer than 16 random bytes"))?;

        Ok(Self::from_parts(scheme, cost, raw))
    }

    /// Parse an exactly-29-character salt string
    pub fn parse(text: &str) -> Result<Self, HashError> {
        let bytes = text.as_bytes();
        if bytes.len() != SALT_LEN {
            return Err(HashError::MalformedSalt("wrong length"));
        }
        if bytes[0] != b'$' || bytes[3] != b'$' || bytes[6] != b'$' {
            return Err(HashError::MalformedSalt("missing separator"));
        }

        // Separators sit at ASCII positions, so these slices fall on char boundaries
        let scheme = Scheme::from_id(&text[1..3])
            .ok_or(HashError::MalformedSalt("unsupported scheme identifier"))?;

        let digits = &bytes[4..6];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(HashError::MalformedSalt("cost is not two digits"));
        }
        let cost = u32::from(digits[0] - b'0') * 10 + u32::from(digits[1] - b'0');
        check_cost(cost)?;

        let decoded = RADIX64
            .decode(&bytes[SALT_HEADER_LEN..])
            .map_err(|_| HashError::MalformedSalt("invalid radix64"))?;
        let raw: [u8; RAW_SALT_LEN] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| HashError::MalformedSalt("invalid radix64"))?;

        Ok(Self::from_parts(scheme, cost, raw))
    }

    fn from_parts(scheme: Scheme, cost: u32, raw: [u8; RAW_SALT_LEN]) -> Self {
        let text = format!("${}${:02}${}", scheme.id(), cost, RADIX64.encode(raw));
        debug_assert_eq!(text.len(), SALT_LEN);
        Self {
            scheme,
            cost,
            raw,
            text,
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn raw(&self) -> &[u8; RAW_SALT_LEN] {
        &self.raw
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Salt").field(&self.text).finish()
    }
}

pub(crate) fn check_cost(cost: u32) -> Result<(), HashError> {
    if (MIN_COST..=MAX_COST).contains(&cost) {
        Ok(())
    } else {
        Err(HashError::InvalidCostFactor(cost))
    }
}

/// Produces `$2b$` salts from a shared randomness source
///
/// The source sits behind a mutex so one generator can serve concurrent
/// callers; each call draws a fresh 64-byte block.
#[derive(Debug)]
pub struct SaltGenerator {
    source: Mutex<RandomSource>,
}

impl SaltGenerator {
    pub fn new(source: RandomSource) -> Self {
        Self {
            source: Mutex::new(source),
        }
    }

    /// Seed a new source from `preferred` (see [`RandomSource::seed`])
    pub fn seeded(preferred: EntropySource) -> Self {
        Self::new(RandomSource::seed(preferred))
    }

    /// Generate a fresh 29-character salt for `cost`
    pub fn generate(&self, cost: u32) -> Result<Salt, HashError> {
        check_cost(cost)?;
        let block = self.next_block();
        Salt::encode(Scheme::TwoB, cost, &block)
    }

    /// Draw one raw block from the underlying source
    pub fn next_block(&self) -> [u8; RANDOM_BLOCK_SIZE] {
        // A panic elsewhere cannot leave the generator half-updated in a way
        // that matters for salts, so a poisoned lock is still usable.
        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_block()
    }

    /// Which source seeded the generator
    pub fn origin(&self) -> EntropySource {
        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .origin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> SaltGenerator {
        SaltGenerator::new(RandomSource::from_time(1_234_567))
    }

    #[test]
    fn generated_salt_has_fixed_shape() {
        let salt = generator().generate(12).expect("cost 12 is valid");
        assert_eq!(salt.as_str().len(), SALT_LEN);
        assert!(salt.as_str().starts_with("$2b$12$"));
        assert_eq!(salt.cost(), 12);
        assert_eq!(salt.scheme(), Scheme::TwoB);
    }

    #[test]
    fn single_digit_cost_is_zero_padded() {
        let salt = generator().generate(4).unwrap();
        assert!(salt.as_str().starts_with("$2b$04$"));
        assert_eq!(salt.as_str().len(), SALT_LEN);
    }

    #[test]
    fn consecutive_salts_differ() {
        let salts = generator();
        let first = salts.generate(10).unwrap();
        let second = salts.generate(10).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn rejects_cost_out_of_range() {
        let salts = generator();
        assert_eq!(salts.generate(3), Err(HashError::InvalidCostFactor(3)));
        assert_eq!(salts.generate(32), Err(HashError::InvalidCostFactor(32)));
        assert!(salts.generate(MIN_COST).is_ok());
        assert!(salts.generate(MAX_COST).is_ok());
    }

    #[test]
    fn encode_uses_first_sixteen_bytes() {
        let mut block = [0u8; RANDOM_BLOCK_SIZE];
        block[RAW_SALT_LEN..].fill(0xFF);
        let salt = Salt::encode(Scheme::TwoB, 5, &block).unwrap();
        assert_eq!(salt.raw(), &[0u8; RAW_SALT_LEN]);
        assert_eq!(salt.as_str(), "$2b$05$......................");
    }

    #[test]
    fn encode_rejects_short_input() {
        assert_eq!(
            Salt::encode(Scheme::TwoB, 5, &[0u8; 8]),
            Err(HashError::MalformedSalt("fewer than 16 random bytes"))
        );
    }

    #[test]
    fn parse_round_trips_generated_salt() {
        let salt = generator().generate(9).unwrap();
        let parsed = Salt::parse(salt.as_str()).unwrap();
        assert_eq!(parsed, salt);
    }

    #[test]
    fn parse_accepts_other_scheme_ids() {
        let parsed = Salt::parse("$2y$10$abcdefghijklmnopqrstuu").unwrap();
        assert_eq!(parsed.scheme(), Scheme::TwoY);
        assert_eq!(parsed.cost(), 10);
    }

    #[test]
    fn parse_rejects_malformed_salts() {
        let cases = [
            "",
            "$2b$12$",
            "$2b$12$abcdefghijklmnopqrstu",
            "$2b$12$abcdefghijklmnopqrstuvw",
            "$2x$12$abcdefghijklmnopqrstuu",
            "$3b$12$abcdefghijklmnopqrstuu",
            "$2b$1a$abcdefghijklmnopqrstuu",
            "$2b$12#abcdefghijklmnopqrstuu",
            "$2b$12$abcdefghijklmnopqrst!u",
            "$2b$03$abcdefghijklmnopqrstuu",
            "$2b$99$abcdefghijklmnopqrstuu",
        ];
        for case in cases {
            assert!(Salt::parse(case).is_err(), "accepted {case:?}");
        }
    }
}
