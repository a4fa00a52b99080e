//! Tests for the hash/compare pipeline

use crate::{
    EntropySource, HASH_LEN, HashEngine, HashError, MAX_INPUT_LEN, RandomSource, SALT_LEN, Salt,
    SaltGenerator, extract_salt, hash_with_salt, verify,
};

/// Cheapest accepted cost keeps these tests fast
const TEST_COST: u32 = 4;

fn engine() -> HashEngine {
    HashEngine::new(SaltGenerator::new(RandomSource::from_time(1_600_000_000)))
}

#[test]
fn test_hash_then_verify() {
    let engine = engine();
    for text in ["hello", "", " ", "correct horse battery staple", "päßwörd ✓"] {
        let hash = engine.compute_hash(text, TEST_COST).unwrap();
        assert!(engine.verify(text, &hash), "failed to verify {text:?}");
    }
}

#[test]
fn test_wrong_text_does_not_verify() {
    let engine = engine();
    let hash = engine.compute_hash("hello", TEST_COST).unwrap();

    assert!(!engine.verify("goodbye", &hash));
    assert!(!engine.verify("Hello", &hash));
    assert!(!engine.verify("hello ", &hash));
    assert!(!engine.verify("", &hash));
}

#[test]
fn test_length_invariants() {
    let engine = engine();
    for cost in [4, 5, 9] {
        let salt = engine.salts().generate(cost).unwrap();
        assert_eq!(salt.as_str().len(), SALT_LEN);

        let hash = engine.compute_hash("length check", cost).unwrap();
        assert_eq!(hash.len(), HASH_LEN);
        assert!(hash.starts_with(&format!("$2b${cost:02}$")));
    }
}

#[test]
fn test_salt_is_hash_prefix() {
    let engine = engine();
    let salt = engine.salts().generate(TEST_COST).unwrap();
    let hash = hash_with_salt("prefix", &salt).unwrap();

    assert_eq!(&hash[..SALT_LEN], salt.as_str());
    assert_eq!(extract_salt(&hash).unwrap(), salt);
}

#[test]
fn test_same_text_hashes_differently() {
    let engine = engine();
    let first = engine.compute_hash("repeat", TEST_COST).unwrap();
    let second = engine.compute_hash("repeat", TEST_COST).unwrap();

    assert_ne!(first, second);
    assert!(engine.verify("repeat", &first));
    assert!(engine.verify("repeat", &second));
}

#[test]
fn test_cost_bounds() {
    let engine = engine();
    assert_eq!(
        engine.compute_hash("x", 3),
        Err(HashError::InvalidCostFactor(3))
    );
    assert_eq!(
        engine.compute_hash("x", 32),
        Err(HashError::InvalidCostFactor(32))
    );
    assert_eq!(
        engine.compute_hash("x", 0),
        Err(HashError::InvalidCostFactor(0))
    );
}

#[test]
fn test_malformed_stored_hashes_do_not_match() {
    let engine = engine();
    let good = engine.compute_hash("hello", TEST_COST).unwrap();

    let truncated_digest = &good[..HASH_LEN - 1];
    let salt_only = &good[..SALT_LEN];
    let too_short = &good[..10];
    let with_garbage = format!("{good}garbage");
    let wrong_scheme = good.replacen("$2b$", "$9z$", 1);

    for stored in [
        "",
        "$",
        too_short,
        salt_only,
        truncated_digest,
        with_garbage.as_str(),
        wrong_scheme.as_str(),
        "not a hash at all, but long enough to have a 29 byte prefix",
    ] {
        assert!(!engine.verify("hello", stored), "matched {stored:?}");
    }
}

#[test]
fn test_known_vectors() {
    // Published $2a$ / $2b$ vectors from the OpenBSD and crypt_blowfish suites
    let vectors = [
        (
            "U*U",
            "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW",
        ),
        (
            "",
            "$2a$05$CCCCCCCCCCCCCCCCCCCCC.7uG0VCzI2bS7j6ymqJi9CdcdxiRTWNy",
        ),
        (
            "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789",
            "$2a$05$abcdefghijklmnopqrstuu5s2v8.iXieOjg/.AySBTTZIIVFJeBui",
        ),
    ];

    for (text, stored) in vectors {
        assert!(verify(text, stored), "vector {stored} failed");
        assert!(!verify("something else", stored));
    }
}

#[test]
fn test_scheme_id_is_preserved() {
    let salt = Salt::parse("$2y$04$abcdefghijklmnopqrstuu").unwrap();
    let hash = hash_with_salt("scheme", &salt).unwrap();

    assert!(hash.starts_with("$2y$04$"));
    assert!(verify("scheme", &hash));
}

#[test]
fn test_input_truncated_at_72_bytes() {
    // The scheme only reads 72 bytes; this is a documented property
    let engine = engine();
    let base = "a".repeat(MAX_INPUT_LEN);
    let hash = engine.compute_hash(&base, TEST_COST).unwrap();

    assert!(engine.verify(&format!("{base}extra"), &hash));
}

#[test]
fn test_embedded_nul_ends_input() {
    let engine = engine();
    let hash = engine.compute_hash("abc\0def", TEST_COST).unwrap();

    assert!(engine.verify("abc", &hash));
    assert!(engine.verify("abc\0xyz", &hash));
    assert!(!engine.verify("abcdef", &hash));
}

#[test]
fn test_os_seeded_engine() {
    let engine = HashEngine::seeded(EntropySource::Os);
    assert_eq!(engine.salts().origin(), EntropySource::Os);

    let hash = engine.compute_hash("seeded", TEST_COST).unwrap();
    assert!(engine.verify("seeded", &hash));
}

#[test]
fn test_shared_engine_across_threads() {
    use std::sync::Arc;
    use std::thread;

    let engine = Arc::new(engine());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let text = format!("thread-{i}");
                let hash = engine.compute_hash(&text, TEST_COST).unwrap();
                (text, hash)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (text, hash) in &results {
        assert!(engine.verify(text, hash));
    }

    let mut salts: Vec<_> = results.iter().map(|(_, h)| &h[..SALT_LEN]).collect();
    salts.sort();
    salts.dedup();
    assert_eq!(salts.len(), results.len());
}
