//! Security Tests for EA signature verification
//!
//! A poll is accepted only when its signature is the lowercase hex
//! HMAC-SHA256 of the EA id under the shared bridge secret.

use ea_bridge::security::{SignatureVerifier, sign_ea_id, verify};
use rand::Rng;

const SECRET: &[u8] = b"bridge-secret-12345";

/// Replaces the char at `idx` with a different one from the same alphabet.
fn mutate_at(s: &str, idx: usize, alphabet: &[u8]) -> String {
    let mut bytes = s.as_bytes().to_vec();
    let original = bytes[idx];
    let replacement = alphabet
        .iter()
        .copied()
        .find(|c| *c != original)
        .unwrap();
    bytes[idx] = replacement;
    String::from_utf8(bytes).unwrap()
}

#[test]
fn test_known_hmac_vector() {
    // Published HMAC-SHA256 test vector.
    let sig = sign_ea_id("The quick brown fox jumps over the lazy dog", b"key").unwrap();
    assert_eq!(
        sig,
        "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
    );
    assert!(verify(
        "The quick brown fox jumps over the lazy dog",
        &sig,
        b"key"
    ));
}

#[test]
fn test_every_signature_mutation_rejected() {
    let sig = sign_ea_id("ea1", SECRET).unwrap();
    assert!(verify("ea1", &sig, SECRET));

    for idx in 0..sig.len() {
        let mutated = mutate_at(&sig, idx, b"0123456789abcdef");
        assert!(
            !verify("ea1", &mutated, SECRET),
            "mutation at {} should be rejected",
            idx
        );
    }
}

#[test]
fn test_every_ea_id_mutation_rejected() {
    let ea_id = "mt5-account-4471";
    let sig = sign_ea_id(ea_id, SECRET).unwrap();

    for idx in 0..ea_id.len() {
        let mutated = mutate_at(ea_id, idx, b"abcdefghijklmnopqrstuvwxyz0123456789-");
        assert!(!verify(&mutated, &sig, SECRET), "{} should not verify", mutated);
    }
}

#[test]
fn test_random_ids_roundtrip_only_under_same_secret() {
    let mut rng = rand::thread_rng();
    for _ in 0..32 {
        let ea_id = format!("ea-{}", rng.gen_range(0..1_000_000u32));
        let sig = sign_ea_id(&ea_id, SECRET).unwrap();
        assert!(verify(&ea_id, &sig, SECRET));
        assert!(!verify(&ea_id, &sig, b"another-secret"));
    }
}

#[test]
fn test_malformed_signatures_rejected() {
    let sig = sign_ea_id("ea1", SECRET).unwrap();

    assert!(!verify("ea1", "", SECRET));
    assert!(!verify("ea1", "not-valid-hex!@#$", SECRET));
    assert!(!verify("ea1", &sig[..62], SECRET));
    assert!(!verify("ea1", &format!("{}00", sig), SECRET));
    assert!(!verify(
        "ea1",
        "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef",
        SECRET
    ));
}

#[test]
fn test_verifier_wraps_secret() {
    let verifier = SignatureVerifier::new(SECRET.to_vec());
    let sig = sign_ea_id("ea7", SECRET).unwrap();

    assert!(verifier.verify_ea(Some("ea7"), Some(&sig)));
    assert!(!verifier.verify_ea(Some("ea8"), Some(&sig)));
    assert!(!verifier.verify_ea(Some(""), Some(&sig)));
}
