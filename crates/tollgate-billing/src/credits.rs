//! Credit reads for a connection: cycle balance and purchasable bundles

use serde::Serialize;
use tollgate_registry::RegistryClient;

use crate::BillingError;

/// Cycle credit status of a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleCredits {
    pub connection_id: String,
    pub status: Option<String>,
    pub cycle_end_at: Option<String>,
    pub cycle_credits: CycleCreditBreakdown,
}

/// Credit amounts as decimal strings, passed through from the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleCreditBreakdown {
    pub included: String,
    pub total_remaining: String,
    pub cycle_remaining: String,
    pub bundle_remaining: String,
    pub remaining: String,
    /// `included - cycle_remaining`, floored at zero, to 12 decimal places;
    /// `None` when either side is not numeric
    pub used: Option<String>,
}

/// Credit bundles offered by a connection's subscription config
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBundles {
    pub connection_id: String,
    pub subscription_config_id: String,
    pub credit_bundles: Vec<CreditBundle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBundle {
    pub credit_bundle_id: String,
    pub name: String,
    pub cost: String,
    pub credit_amount: String,
}

/// Read the current cycle's credit balance for a connection
pub async fn cycle_credits(registry: &RegistryClient, connection_id: &str) -> Result<CycleCredits, BillingError> {
    let payload = registry
        .get_connection_subscription(connection_id)
        .await
        .map_err(BillingError::registry("Failed to fetch cycle credits"))?;

    let Some(subscription) = payload.subscription else {
        return Err(BillingError::NotFound(
            "No active subscription for this connection".to_owned(),
        ));
    };

    let included = subscription.plan.and_then(|plan| plan.included_credit);
    let credits = subscription.credits.unwrap_or_default();
    let cycle = credits.cycle_remaining;
    let remaining = credits.total_remaining.or_else(|| cycle.clone());

    let (Some(included), Some(remaining)) = (included, remaining) else {
        return Err(BillingError::IncompleteUpstream(
            "Subscription is missing cycle credit data".to_owned(),
        ));
    };
    let cycle_remaining = cycle.unwrap_or_else(|| remaining.clone());

    Ok(CycleCredits {
        connection_id: connection_id.to_owned(),
        status: subscription.status,
        cycle_end_at: subscription.cycle_end_at,
        cycle_credits: CycleCreditBreakdown {
            used: used_credit(&included, &cycle_remaining),
            included,
            total_remaining: remaining.clone(),
            cycle_remaining,
            bundle_remaining: credits.bundle_remaining.unwrap_or_else(|| "0".to_owned()),
            remaining,
        },
    })
}

/// List the credit bundles available to a connection
pub async fn credit_bundles(registry: &RegistryClient, connection_id: &str) -> Result<CreditBundles, BillingError> {
    const CONTEXT: &str = "Failed to fetch credit bundles";

    let payload = registry
        .get_connection_subscription(connection_id)
        .await
        .map_err(BillingError::registry(CONTEXT))?;

    let Some(subscription_config_id) = payload.subscription.and_then(|s| s.subscription_config_id) else {
        return Err(BillingError::NotFound(
            "No subscription configuration found for this connection".to_owned(),
        ));
    };

    let config = registry
        .get_subscription_config(&subscription_config_id)
        .await
        .map_err(BillingError::registry(CONTEXT))?;

    let credit_bundles = config
        .credit_bundles
        .into_iter()
        .filter_map(|bundle| {
            Some(CreditBundle {
                credit_bundle_id: bundle.credit_bundle_id?,
                name: bundle.name.unwrap_or_default(),
                cost: bundle.cost.unwrap_or_default(),
                credit_amount: bundle.credit_amount.unwrap_or_default(),
            })
        })
        .collect();

    Ok(CreditBundles {
        connection_id: connection_id.to_owned(),
        subscription_config_id,
        credit_bundles,
    })
}

fn used_credit(included: &str, cycle_remaining: &str) -> Option<String> {
    let included: f64 = included.parse().ok()?;
    let cycle_remaining: f64 = cycle_remaining.parse().ok()?;
    if !included.is_finite() || !cycle_remaining.is_finite() {
        return None;
    }
    Some(format!("{:.12}", (included - cycle_remaining).max(0.0)))
}
