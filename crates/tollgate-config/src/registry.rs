use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Connection registry (payments API) configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Base URL of the registry API, e.g. `https://api.example.com/v1/`
    pub base_url: Url,
    /// Platform secret key sent as the bearer credential on every call
    pub secret_key: SecretString,
    /// Product (meter) secret embedded into forward tokens
    pub product_secret: SecretString,
    /// Origin reported to the registry when creating checkout sessions
    #[serde(default = "default_origin_url")]
    pub origin_url: String,
    /// TCP connect timeout for registry and forward calls
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_origin_url() -> String {
    "http://localhost:5050".to_owned()
}

const fn default_connect_timeout_secs() -> u64 {
    10
}
