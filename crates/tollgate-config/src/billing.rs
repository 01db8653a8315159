use serde::Deserialize;

/// Billing-session reconciliation policy
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BillingConfig {
    /// Relaxed matching for designated demo accounts
    #[serde(default)]
    pub fallback: FallbackPolicyConfig,
}

/// Demo-account fallback matching
///
/// When a listed account has no registry connection under its own email,
/// reconciliation may adopt any valid connection, defaulting an unmapped
/// plan to the first configured plan. Empty by default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackPolicyConfig {
    /// Account emails the fallback applies to (compared case-insensitively)
    #[serde(default)]
    pub emails: Vec<String>,
}
