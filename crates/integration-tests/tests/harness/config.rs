//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::Path;

use indexmap::IndexMap;
use secrecy::SecretString;
use tollgate_config::{
    BillingConfig, Config, CorsConfig, FallbackPolicyConfig, HealthConfig, IdentityConfig, PlanConfig,
    RegistryConfig, ServerConfig,
};

pub const SECRET_KEY: &str = "sk_test_platform";
pub const PRODUCT_SECRET: &str = "ps_test_meter";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal configuration against a registry at `registry_url`
    ///
    /// Plans `starter10` (`sc_10`) and `pro20` (`sc_20`) are configured, in
    /// that order.
    pub fn new(registry_url: &str, store_path: &Path) -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                    ..ServerConfig::default()
                },
                registry: RegistryConfig {
                    base_url: registry_url.parse().expect("valid URL"),
                    secret_key: SecretString::from(SECRET_KEY),
                    product_secret: SecretString::from(PRODUCT_SECRET),
                    origin_url: "http://localhost:5050".to_owned(),
                    connect_timeout_secs: 2,
                },
                identity: IdentityConfig {
                    store_path: store_path.to_path_buf(),
                },
                plans: IndexMap::from([
                    ("starter10".to_owned(), plan(10, Some("sc_10"))),
                    ("pro20".to_owned(), plan(20, Some("sc_20"))),
                ]),
                billing: BillingConfig::default(),
                telemetry: None,
            },
        }
    }

    /// Add or replace a plan
    pub fn with_plan(mut self, id: &str, amount_usd: u32, subscription_config_id: Option<&str>) -> Self {
        self.config
            .plans
            .insert(id.to_owned(), plan(amount_usd, subscription_config_id));
        self
    }

    /// Let an account adopt any connection when it has none of its own
    pub fn with_fallback_email(mut self, email: &str) -> Self {
        self.config.billing = BillingConfig {
            fallback: FallbackPolicyConfig {
                emails: vec![email.to_owned()],
            },
        };
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}

fn plan(amount_usd: u32, subscription_config_id: Option<&str>) -> PlanConfig {
    PlanConfig {
        amount_usd,
        subscription_config_id: subscription_config_id.map(str::to_owned),
    }
}
