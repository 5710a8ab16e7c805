use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

// Both sides are reduced to fixed-length tags before comparing, so neither
// content nor length of the configured value leaks through timing.
const COMPARE_KEY: &[u8] = b"ea-bridge/credential-gate";

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("missing")]
    Missing,
    #[error("invalid")]
    Invalid,
}

impl AuthFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            AuthFailure::Missing => "missing",
            AuthFailure::Invalid => "invalid",
        }
    }
}

/// Operator credentials as presented by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Base64 `user:pass` token, as carried by an `Authorization: Basic` header.
    Basic(String),
    Pair { username: String, password: String },
}

impl Credentials {
    /// Parses an `Authorization` header value. Returns `None` for a blank header.
    pub fn from_authorization_header(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let token = match value.split_once(' ') {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("basic") => rest.trim(),
            // Any other scheme is carried through and fails to decode.
            _ => value,
        };
        Some(Credentials::Basic(token.to_string()))
    }

    fn decompose(&self) -> Option<(String, String)> {
        match self {
            Credentials::Pair { username, password } => Some((username.clone(), password.clone())),
            Credentials::Basic(token) => {
                let raw = STANDARD.decode(token).ok()?;
                let text = String::from_utf8(raw).ok()?;
                let (user, pass) = text.split_once(':')?;
                Some((user.to_string(), pass.to_string()))
            }
        }
    }
}

fn tag(value: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(COMPARE_KEY).ok()?;
    mac.update(value.as_bytes());
    Some(mac)
}

fn constant_time_eq(expected: &str, supplied: &str) -> bool {
    let (Some(reference), Some(probe)) = (tag(expected), tag(supplied)) else {
        return false;
    };
    reference.verify_slice(&probe.finalize().into_bytes()).is_ok()
}

/// Checks operator credentials against the configured pair.
#[derive(Clone)]
pub struct CredentialGate {
    username: String,
    password: String,
}

impl CredentialGate {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        let password = password.into();
        if username.is_empty() || password.is_empty() {
            warn!("⚠️ Operator credentials not configured. Every submission will be rejected.");
        }
        Self { username, password }
    }

    pub fn authenticate(&self, credentials: Option<&Credentials>) -> Result<(), AuthFailure> {
        let credentials = credentials.ok_or(AuthFailure::Missing)?;
        let (user, pass) = credentials.decompose().ok_or(AuthFailure::Invalid)?;

        // Evaluate both comparisons before combining them.
        let user_ok = constant_time_eq(&self.username, &user);
        let pass_ok = constant_time_eq(&self.password, &pass);
        let configured = !self.username.is_empty() && !self.password.is_empty();

        if configured & user_ok & pass_ok {
            Ok(())
        } else {
            Err(AuthFailure::Invalid)
        }
    }
}
