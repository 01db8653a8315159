use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Serialize;
use tollgate_core::ConnectionSecret;
use tollgate_registry::{CheckoutMode, CheckoutSessionRequest, PlanTable, RegistryClient};

use crate::BillingError;

/// A hosted checkout session for a subscription plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCheckout {
    pub session_id: String,
    pub session_token: String,
    pub plan: String,
}

/// A hosted checkout session for a credit bundle top-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBundleCheckout {
    pub session_id: String,
    pub session_token: String,
    pub connection_id: String,
    pub credit_bundle_id: String,
}

/// A connection id together with its live secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConnection {
    pub connection_id: String,
    pub connection_secret: ConnectionSecret,
}

/// Checkout session creation and connection lookup
#[derive(Debug, Clone)]
pub struct Checkout {
    registry: RegistryClient,
    plans: Arc<PlanTable>,
    origin_url: String,
}

impl Checkout {
    pub fn new(registry: RegistryClient, plans: Arc<PlanTable>, origin_url: impl Into<String>) -> Self {
        Self {
            registry,
            plans,
            origin_url: origin_url.into(),
        }
    }

    /// Start a subscription checkout
    ///
    /// Without `connection_id` this is the new-customer flow. Attaching the
    /// subscription to an existing connection requires a signed-in caller.
    pub async fn create_subscription_session(
        &self,
        plan_id: &str,
        connection_id: Option<&str>,
        authenticated: bool,
    ) -> Result<SubscriptionCheckout, BillingError> {
        let plan_id = plan_id.trim();
        let connection_id = connection_id.map(str::trim).filter(|id| !id.is_empty());

        let plan = self
            .plans
            .get(plan_id)
            .ok_or_else(|| BillingError::Validation("Unknown plan".to_owned()))?;
        let Some(subscription_config_id) = plan.subscription_config_id() else {
            return Err(BillingError::Validation(format!(
                "Plan \"{plan_id}\" is not configured yet. Set its subscription_config_id in the configuration."
            )));
        };
        if connection_id.is_some() && !authenticated {
            return Err(BillingError::Unauthenticated(
                "Authentication required for existing connection checkout".to_owned(),
            ));
        }

        tracing::info!(
            plan = plan_id,
            flow = if connection_id.is_some() { "existing_connection" } else { "new_customer" },
            "creating subscription checkout"
        );

        let session = self
            .registry
            .create_checkout_session(&CheckoutSessionRequest {
                checkout_mode: CheckoutMode::Subscription,
                origin_url: self.origin_url.clone(),
                subscription_config_id: Some(subscription_config_id.to_owned()),
                connection_id: connection_id.map(str::to_owned),
                credit_bundle_id: None,
            })
            .await
            .map_err(BillingError::registry("Failed to create checkout session"))?;

        tracing::info!(checkout_session_id = %session.checkout_session_id, "checkout session created");

        Ok(SubscriptionCheckout {
            session_id: session.checkout_session_id,
            session_token: session.checkout_session_token,
            plan: plan_id.to_owned(),
        })
    }

    /// Start a credit bundle checkout for an existing connection
    pub async fn create_credit_bundle_session(
        &self,
        connection_id: &str,
        credit_bundle_id: &str,
    ) -> Result<CreditBundleCheckout, BillingError> {
        let credit_bundle_id = credit_bundle_id.trim();
        if credit_bundle_id.is_empty() {
            return Err(BillingError::Validation("Missing creditBundleId".to_owned()));
        }

        let session = self
            .registry
            .create_checkout_session(&CheckoutSessionRequest {
                checkout_mode: CheckoutMode::CreditBundle,
                origin_url: self.origin_url.clone(),
                subscription_config_id: None,
                connection_id: Some(connection_id.to_owned()),
                credit_bundle_id: Some(credit_bundle_id.to_owned()),
            })
            .await
            .map_err(BillingError::registry("Failed to create credit bundle checkout session"))?;

        tracing::info!(
            connection_id,
            credit_bundle_id,
            checkout_session_id = %session.checkout_session_id,
            "credit bundle checkout session created"
        );

        Ok(CreditBundleCheckout {
            session_id: session.checkout_session_id,
            session_token: session.checkout_session_token,
            connection_id: connection_id.to_owned(),
            credit_bundle_id: credit_bundle_id.to_owned(),
        })
    }

    /// Look up a connection's current secret
    pub async fn resolve_connection(&self, connection_id: &str) -> Result<ResolvedConnection, BillingError> {
        let connection_id = connection_id.trim();
        if connection_id.is_empty() {
            return Err(BillingError::Validation("Missing connectionId".to_owned()));
        }

        let record = self
            .registry
            .get_connection(connection_id)
            .await
            .map_err(BillingError::registry("Failed to resolve connection"))?;

        let secret = record
            .connection_secret
            .as_ref()
            .and_then(|secret| ConnectionSecret::parse(secret.expose_secret()))
            .ok_or_else(|| {
                BillingError::IncompleteUpstream("Connection resolved without connection_secret".to_owned())
            })?;

        Ok(ResolvedConnection {
            connection_id: record.connection_id.unwrap_or_else(|| connection_id.to_owned()),
            connection_secret: secret,
        })
    }
}
