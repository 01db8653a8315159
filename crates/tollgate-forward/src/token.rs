use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};
use tollgate_config::RegistryConfig;
use tollgate_core::ConnectionSecret;

use crate::ForwardError;

/// Bearer capability for the registry's forward endpoint
///
/// Base64 of a JSON document holding the platform secret key, the
/// connection secret and the product (meter) secret. It is not signed:
/// anyone holding it can spend against the connection, so it is never
/// logged and `Debug` is redacted.
#[derive(Clone)]
pub struct ForwardToken(SecretString);

impl ForwardToken {
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ForwardToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ForwardToken([REDACTED])")
    }
}

impl Serialize for ForwardToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

/// Mints forward tokens scoped to a single connection
#[derive(Clone)]
pub struct ForwardTokenIssuer {
    secret_key: SecretString,
    product_secret: SecretString,
}

impl ForwardTokenIssuer {
    pub const fn new(secret_key: SecretString, product_secret: SecretString) -> Self {
        Self {
            secret_key,
            product_secret,
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.secret_key.clone(), config.product_secret.clone())
    }

    /// Issue a token for an already validated connection secret
    pub fn issue(&self, connection_secret: &ConnectionSecret) -> ForwardToken {
        let payload = serde_json::json!({
            "secret_key": self.secret_key.expose_secret(),
            "connection_secret": connection_secret.expose(),
            "meter_secret": self.product_secret.expose_secret(),
        });

        ForwardToken(SecretString::from(STANDARD.encode(payload.to_string())))
    }

    /// Validate a raw connection secret and issue a token for it
    pub fn issue_raw(&self, raw: Option<&str>) -> Result<ForwardToken, ForwardError> {
        raw.and_then(ConnectionSecret::parse)
            .map(|secret| self.issue(&secret))
            .ok_or(ForwardError::MissingConnectionSecret)
    }
}

impl std::fmt::Debug for ForwardTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardTokenIssuer").finish_non_exhaustive()
    }
}
