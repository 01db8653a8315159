use std::collections::HashSet;

use tollgate_config::FallbackPolicyConfig;
use tollgate_identity::normalize_email;

/// Relaxed matching for designated demo accounts
///
/// For a listed email with no candidate of its own, reconciliation adopts
/// any structurally valid connection and fills an unmapped plan with the
/// default plan. The policy is empty unless configured.
#[derive(Debug, Clone, Default)]
pub struct FallbackPolicy {
    emails: HashSet<String>,
}

impl FallbackPolicy {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails.into_iter().map(|email| normalize_email(email.as_ref())).collect(),
        }
    }

    pub fn from_config(config: &FallbackPolicyConfig) -> Self {
        Self::new(&config.emails)
    }

    /// Whether the fallback applies to this account
    pub fn applies_to(&self, email: &str) -> bool {
        self.emails.contains(&normalize_email(email))
    }
}
