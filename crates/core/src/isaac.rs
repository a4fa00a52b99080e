//! ISAAC randomness source
//!
//! Salts are built from bytes drawn out of an ISAAC generator that is seeded
//! once per process. The generator state is 2 KiB of tables plus three
//! accumulators and is mutated on every draw, so callers that share one
//! source must serialize access (see [`crate::SaltGenerator`]).
//!
//! Seeding prefers the operating system CSPRNG. The wall-clock seed is a
//! deterministic function of the seed time and is only a fallback; anyone who
//! can guess the start time to the second can reproduce every salt.

use core::fmt;
use core::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::params::{ISAAC_WORDS, RANDOM_BLOCK_SIZE};

/// Initial value of the eight mixing accumulators (golden ratio)
const GOLDEN_RATIO: u32 = 0x9e37_79b9;

/// Warm-up rounds applied to the time seed before the table is filled
const TIME_SEED_WARMUP: usize = 24;

/// Where the generator's seed table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntropySource {
    /// Operating system CSPRNG
    Os,
    /// Wall-clock seconds run through `x += (x * x) | 5`
    Time,
}

impl fmt::Display for EntropySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntropySource::Os => f.write_str("os"),
            EntropySource::Time => f.write_str("time"),
        }
    }
}

impl FromStr for EntropySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "os" => Ok(EntropySource::Os),
            "time" => Ok(EntropySource::Time),
            other => Err(format!("unknown entropy source '{other}' (expected os or time)")),
        }
    }
}

/// ISAAC generator state
///
/// Output words are served from the result table top-down; after the last
/// one is consumed the tables are regenerated.
#[derive(Clone)]
pub struct Isaac {
    /// Result table, consumed by `next_u32`
    rsl: [u32; ISAAC_WORDS],
    /// Internal memory table
    mem: [u32; ISAAC_WORDS],
    a: u32,
    b: u32,
    c: u32,
    /// Unconsumed words left in `rsl`
    cnt: usize,
}

impl Isaac {
    /// Build a generator from a full seed table and run the initialization pass
    pub fn from_seed_table(seed: [u32; ISAAC_WORDS]) -> Self {
        let mut rng = Self {
            rsl: seed,
            mem: [0u32; ISAAC_WORDS],
            a: 0,
            b: 0,
            c: 0,
            cnt: 0,
        };
        rng.init();
        rng
    }

    /// Next 32-bit output word
    pub fn next_u32(&mut self) -> u32 {
        if self.cnt == 0 {
            self.generate();
            self.cnt = ISAAC_WORDS;
        }
        self.cnt -= 1;
        self.rsl[self.cnt]
    }

    /// Scramble the seed (held in `rsl`) into `mem` with two passes so every
    /// seed word affects every memory word, then produce the first results.
    fn init(&mut self) {
        self.a = 0;
        self.b = 0;
        self.c = 0;

        let mut acc = [GOLDEN_RATIO; 8];
        for _ in 0..4 {
            mix(&mut acc);
        }

        for i in (0..ISAAC_WORDS).step_by(8) {
            for (j, word) in acc.iter_mut().enumerate() {
                *word = word.wrapping_add(self.rsl[i + j]);
            }
            mix(&mut acc);
            self.mem[i..i + 8].copy_from_slice(&acc);
        }

        for i in (0..ISAAC_WORDS).step_by(8) {
            for (j, word) in acc.iter_mut().enumerate() {
                *word = word.wrapping_add(self.mem[i + j]);
            }
            mix(&mut acc);
            self.mem[i..i + 8].copy_from_slice(&acc);
        }

        self.generate();
        self.cnt = ISAAC_WORDS;
    }

    /// One ISAAC round: refills `rsl` and advances `mem`
    fn generate(&mut self) {
        const HALF: usize = ISAAC_WORDS / 2;
        const MASK: u32 = (ISAAC_WORDS as u32) - 1;

        self.c = self.c.wrapping_add(1);
        let mut a = self.a;
        let mut b = self.b.wrapping_add(self.c);

        for i in 0..ISAAC_WORDS {
            let shift = match i % 4 {
                0 => a << 13,
                1 => a >> 6,
                2 => a << 2,
                _ => a >> 16,
            };
            let x = self.mem[i];
            a = (a ^ shift).wrapping_add(self.mem[(i + HALF) % ISAAC_WORDS]);
            let y = self.mem[((x >> 2) & MASK) as usize]
                .wrapping_add(a)
                .wrapping_add(b);
            self.mem[i] = y;
            b = self.mem[((y >> 10) & MASK) as usize].wrapping_add(x);
            self.rsl[i] = b;
        }

        self.a = a;
        self.b = b;
    }
}

impl fmt::Debug for Isaac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Isaac")
            .field("remaining", &self.cnt)
            .finish_non_exhaustive()
    }
}

/// The eight-word mixing function used during initialization
#[inline(always)]
fn mix(s: &mut [u32; 8]) {
    s[0] ^= s[1] << 11;
    s[3] = s[3].wrapping_add(s[0]);
    s[1] = s[1].wrapping_add(s[2]);

    s[1] ^= s[2] >> 2;
    s[4] = s[4].wrapping_add(s[1]);
    s[2] = s[2].wrapping_add(s[3]);

    s[2] ^= s[3] << 8;
    s[5] = s[5].wrapping_add(s[2]);
    s[3] = s[3].wrapping_add(s[4]);

    s[3] ^= s[4] >> 16;
    s[6] = s[6].wrapping_add(s[3]);
    s[4] = s[4].wrapping_add(s[5]);

    s[4] ^= s[5] << 10;
    s[7] = s[7].wrapping_add(s[4]);
    s[5] = s[5].wrapping_add(s[6]);

    s[5] ^= s[6] >> 4;
    s[0] = s[0].wrapping_add(s[5]);
    s[6] = s[6].wrapping_add(s[7]);

    s[6] ^= s[7] << 8;
    s[1] = s[1].wrapping_add(s[6]);
    s[7] = s[7].wrapping_add(s[0]);

    s[7] ^= s[0] >> 9;
    s[2] = s[2].wrapping_add(s[7]);
    s[0] = s[0].wrapping_add(s[1]);
}

/// Tiny diffusion step `x += (x * x) | 5` in 32-bit wrapping arithmetic
#[inline(always)]
fn diffuse(x: u32) -> u32 {
    x.wrapping_add(x.wrapping_mul(x) | 5)
}

/// A seeded ISAAC generator that hands out fixed-size random blocks
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: Isaac,
    origin: EntropySource,
}

impl RandomSource {
    /// Seed from the preferred source.
    ///
    /// `EntropySource::Os` falls back to the wall clock when the OS source
    /// is unavailable; check [`RandomSource::origin`] for the outcome.
    ///
    /// Either way a clock seed is logged once, as a warning.
    pub fn seed(preferred: EntropySource) -> Self {
        match preferred {
            EntropySource::Os => match Self::from_os_entropy() {
                Ok(source) => return source,
                Err(e) => tracing::warn!(
                    error = %e,
                    "OS entropy unavailable, seeding from wall clock; salts are predictable"
                ),
            },
            EntropySource::Time => {
                tracing::warn!("seeding from wall clock; salts are predictable")
            }
        }
        Self::from_time(unix_seconds())
    }

    /// Fill the whole seed table from the OS CSPRNG
    pub fn from_os_entropy() -> Result<Self, getrandom::Error> {
        let mut bytes = [0u8; ISAAC_WORDS * 4];
        getrandom::getrandom(&mut bytes)?;

        let mut seed = [0u32; ISAAC_WORDS];
        for (word, chunk) in seed.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        Ok(Self {
            rng: Isaac::from_seed_table(seed),
            origin: EntropySource::Os,
        })
    }

    /// Deterministic seed derived from a wall-clock time in seconds
    pub fn from_time(seconds: u32) -> Self {
        let mut x = seconds;
        for _ in 0..TIME_SEED_WARMUP {
            x = diffuse(x);
        }

        let mut seed = [0u32; ISAAC_WORDS];
        for word in seed.iter_mut() {
            *word = x;
            x = diffuse(x);
        }

        Self {
            rng: Isaac::from_seed_table(seed),
            origin: EntropySource::Time,
        }
    }

    /// Which source actually seeded this generator
    pub fn origin(&self) -> EntropySource {
        self.origin
    }

    /// Next 32-bit output word
    pub fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    /// 64 random bytes: successive output words, each little-endian
    pub fn next_block(&mut self) -> [u8; RANDOM_BLOCK_SIZE] {
        let mut block = [0u8; RANDOM_BLOCK_SIZE];
        for chunk in block.chunks_exact_mut(4) {
            chunk.copy_from_slice(&self.rng.next_u32().to_le_bytes());
        }
        block
    }
}

/// Seconds since the Unix epoch truncated to 32 bits
fn unix_seconds() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or_default()
}
