use std::collections::HashMap;
use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if registry credentials are blank, no plan is
    /// configured, or plans and fallback emails are malformed
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_registry()?;
        self.validate_plans()?;
        self.validate_fallback()?;
        Ok(())
    }

    /// Registry credentials must be present
    fn validate_registry(&self) -> anyhow::Result<()> {
        if self.registry.secret_key.expose_secret().trim().is_empty() {
            anyhow::bail!("registry.secret_key must not be empty");
        }

        if self.registry.product_secret.expose_secret().trim().is_empty() {
            anyhow::bail!("registry.product_secret must not be empty");
        }

        Ok(())
    }

    /// At least one plan, and no subscription config shared by two plans
    fn validate_plans(&self) -> anyhow::Result<()> {
        if self.plans.is_empty() {
            anyhow::bail!("at least one plan must be configured under [plans]");
        }

        let mut owners: HashMap<&str, &str> = HashMap::new();
        for (plan_id, plan) in &self.plans {
            let Some(config_id) = plan.subscription_config_id() else {
                tracing::warn!(plan = %plan_id, "plan has no subscription_config_id; checkout for it is disabled");
                continue;
            };

            if let Some(previous) = owners.insert(config_id, plan_id) {
                anyhow::bail!("plans '{previous}' and '{plan_id}' share subscription_config_id '{config_id}'");
            }
        }

        Ok(())
    }

    /// Fallback emails must look like emails
    fn validate_fallback(&self) -> anyhow::Result<()> {
        if let Some(email) = self.billing.fallback.emails.iter().find(|email| !email.contains('@')) {
            anyhow::bail!("billing.fallback.emails contains an invalid address: '{email}'");
        }

        Ok(())
    }
}
