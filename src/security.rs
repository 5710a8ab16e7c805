use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Hex length of an HMAC-SHA256 tag.
const SIGNATURE_HEX_LEN: usize = 64;

/// Lowercase hex HMAC-SHA256 of `ea_id` keyed by `secret`.
pub fn sign_ea_id(ea_id: &str, secret: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(ea_id.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// True iff `signature` equals the lowercase hex HMAC-SHA256 of `ea_id` under `secret`.
///
/// An empty EA id or empty secret never verifies. The tag comparison is
/// constant-time (`Mac::verify_slice`).
pub fn verify(ea_id: &str, signature: &str, secret: &[u8]) -> bool {
    if ea_id.is_empty() || secret.is_empty() {
        return false;
    }

    // Only the canonical lowercase rendering is accepted.
    if signature.len() != SIGNATURE_HEX_LEN
        || !signature
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return false;
    }

    let Ok(provided) = hex::decode(signature) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(ea_id.as_bytes());
    mac.verify_slice(&provided).is_ok()
}

/// Holds the shared bridge secret and checks EA poll signatures against it.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        let secret = secret.into();
        if secret.is_empty() {
            warn!("⚠️ Bridge secret not set. Every EA poll will be rejected.");
        } else {
            info!("🔐 EA signature verifier initialized");
        }
        Self { secret }
    }

    /// Missing id or signature fails like a wrong one.
    pub fn verify_ea(&self, ea_id: Option<&str>, signature: Option<&str>) -> bool {
        match (ea_id, signature) {
            (Some(ea_id), Some(signature)) => verify(ea_id, signature, &self.secret),
            _ => false,
        }
    }
}
