use serde::Deserialize;

/// A subscription plan offered at checkout
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    /// Monthly price in whole US dollars
    pub amount_usd: u32,
    /// Registry subscription config backing this plan
    ///
    /// Optional so a plan can be declared before it exists upstream; such a
    /// plan cannot be checked out and never matches a registry connection.
    #[serde(default)]
    pub subscription_config_id: Option<String>,
}

impl PlanConfig {
    /// Subscription config id, treating blank values as unset
    pub fn subscription_config_id(&self) -> Option<&str> {
        self.subscription_config_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
