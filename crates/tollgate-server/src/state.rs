use std::sync::Arc;

use tollgate_billing::{BillingSessionManager, Checkout, FallbackPolicy};
use tollgate_config::Config;
use tollgate_forward::{ForwardTokenIssuer, ProxyGateway};
use tollgate_identity::{Accounts, FileUserStore, SessionStore, UserStore};
use tollgate_registry::{PlanTable, RegistryClient};

/// Shared handler state
///
/// Built once at startup; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Accounts,
    pub billing: BillingSessionManager,
    pub checkout: Checkout,
    pub registry: RegistryClient,
    pub gateway: ProxyGateway,
}

impl AppState {
    /// Open the identity store and wire every service to one registry client
    ///
    /// # Errors
    ///
    /// Returns an error if the registry client cannot be built or the
    /// identity store cannot be initialized
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let registry = RegistryClient::from_config(&config.registry)?;
        let plans = Arc::new(PlanTable::new(config.plans.clone()));

        let users: Arc<dyn UserStore> = Arc::new(FileUserStore::open(config.identity.store_path.clone()).await?);
        let accounts = Accounts::new(Arc::clone(&users), Arc::new(SessionStore::new()));

        let billing = BillingSessionManager::new(
            registry.clone(),
            Arc::clone(&plans),
            users,
            FallbackPolicy::from_config(&config.billing.fallback),
        );
        let checkout = Checkout::new(registry.clone(), plans, config.registry.origin_url.clone());
        let gateway = ProxyGateway::new(registry.clone(), ForwardTokenIssuer::from_config(&config.registry));

        Ok(Self {
            accounts,
            billing,
            checkout,
            registry,
            gateway,
        })
    }
}
