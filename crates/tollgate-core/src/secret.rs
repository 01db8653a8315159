use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};

/// Placeholder strings the registry returns in place of a missing secret
const SENTINELS: [&str; 2] = ["undefined", "null"];

/// Whether a raw connection secret is usable
///
/// The value is trimmed first. Empty strings and the literal sentinels
/// `"undefined"` and `"null"` are rejected.
pub fn is_valid_connection_secret(raw: &str) -> bool {
    let trimmed = raw.trim();
    !trimmed.is_empty() && !SENTINELS.contains(&trimmed)
}

/// A connection secret that has passed the validity rule
///
/// Only constructible through [`ConnectionSecret::parse`], so holding one
/// proves the secret is non-empty and not a sentinel. `Debug` is redacted;
/// serialization exposes the value because clients need it to call the proxy.
#[derive(Clone)]
pub struct ConnectionSecret(SecretString);

impl ConnectionSecret {
    /// Validate and wrap a raw secret, trimming surrounding whitespace
    pub fn parse(raw: &str) -> Option<Self> {
        is_valid_connection_secret(raw).then(|| Self(SecretString::from(raw.trim().to_owned())))
    }

    /// Borrow the underlying secret value
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for ConnectionSecret {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for ConnectionSecret {}

impl std::fmt::Debug for ConnectionSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ConnectionSecret([REDACTED])")
    }
}

impl Serialize for ConnectionSecret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}
