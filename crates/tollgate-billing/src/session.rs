use std::sync::Arc;

use jiff::Timestamp;
use secrecy::ExposeSecret;
use serde::Serialize;
use tollgate_core::ConnectionSecret;
use tollgate_identity::{BillingRecord, User, UserStore, normalize_email};
use tollgate_registry::{Candidate, CandidateResolver, PlanTable, RegistryClient, rank};

use crate::{BillingError, FallbackPolicy};

/// Hard cap on registry pages read during one scan
pub const MAX_SCAN_PAGES: usize = 5;

const RESTORE_CONTEXT: &str = "Failed to restore billing session";

/// The resolved billing session for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSession {
    pub plan: String,
    pub connection_id: String,
    pub connection_secret: ConnectionSecret,
    pub wallet_id: Option<String>,
    /// When the cached pointer was last written
    pub updated_at: Timestamp,
}

/// Reconciles the cached billing pointer with the registry
#[derive(Clone)]
pub struct BillingSessionManager {
    registry: RegistryClient,
    resolver: CandidateResolver,
    users: Arc<dyn UserStore>,
    fallback: FallbackPolicy,
}

impl BillingSessionManager {
    pub fn new(
        registry: RegistryClient,
        plans: Arc<PlanTable>,
        users: Arc<dyn UserStore>,
        fallback: FallbackPolicy,
    ) -> Self {
        Self {
            registry,
            resolver: CandidateResolver::new(plans),
            users,
            fallback,
        }
    }

    pub fn plans(&self) -> &PlanTable {
        self.resolver.plans()
    }

    /// Resolve the user's current billing session
    ///
    /// A cached pointer naming a known plan is revalidated with a single
    /// connection lookup. Otherwise the registry is scanned, the best
    /// candidate is chosen and written back to the user record.
    pub async fn resolve(&self, user: &User) -> Result<BillingSession, BillingError> {
        if let Some(session) = self.revalidate_cached(user).await? {
            tracing::debug!(user_id = %user.id, connection_id = %session.connection_id, "billing session cache hit");
            return Ok(session);
        }

        let candidates = self.scan(&user.email).await?;
        let Some(selected) = candidates.into_iter().next() else {
            tracing::info!(user_id = %user.id, "no billing session found in registry");
            return Err(BillingError::NotFound("No existing billing session".to_owned()));
        };

        let Some(plan) = selected.plan_id else {
            return Err(BillingError::NotFound("No existing billing session".to_owned()));
        };

        let record = BillingRecord {
            plan,
            connection_id: selected.connection_id,
            wallet_id: selected.wallet_id,
            updated_at: Timestamp::now(),
        };
        self.users.set_billing(&user.id, Some(record.clone())).await?;

        tracing::info!(
            user_id = %user.id,
            connection_id = %record.connection_id,
            plan = %record.plan,
            "billing session restored from registry"
        );

        Ok(BillingSession {
            plan: record.plan,
            connection_id: record.connection_id,
            connection_secret: selected.connection_secret,
            wallet_id: record.wallet_id,
            updated_at: record.updated_at,
        })
    }

    /// Record the billing pointer reported by the client after checkout
    ///
    /// The previous pointer is replaced wholesale.
    pub async fn set(
        &self,
        user: &User,
        plan: &str,
        connection_id: &str,
        wallet_id: Option<String>,
    ) -> Result<BillingRecord, BillingError> {
        let plan = plan.trim();
        let connection_id = connection_id.trim();

        if !self.plans().contains(plan) {
            return Err(BillingError::Validation("Unknown plan".to_owned()));
        }
        if connection_id.is_empty() {
            return Err(BillingError::Validation("Missing connectionId".to_owned()));
        }

        let record = BillingRecord {
            plan: plan.to_owned(),
            connection_id: connection_id.to_owned(),
            wallet_id: wallet_id.map(|w| w.trim().to_owned()).filter(|w| !w.is_empty()),
            updated_at: Timestamp::now(),
        };
        self.users.set_billing(&user.id, Some(record.clone())).await?;

        tracing::info!(user_id = %user.id, connection_id = %record.connection_id, plan = %record.plan, "billing session saved");

        Ok(record)
    }

    /// Cache-hit path: the pointer is usable if its connection still has a
    /// valid secret
    async fn revalidate_cached(&self, user: &User) -> Result<Option<BillingSession>, BillingError> {
        let Some(cached) = user.billing.as_ref() else {
            return Ok(None);
        };

        let connection_id = cached.connection_id.trim();
        if !self.plans().contains(&cached.plan) || connection_id.is_empty() {
            return Ok(None);
        }

        let record = self
            .registry
            .get_connection(connection_id)
            .await
            .map_err(BillingError::registry(RESTORE_CONTEXT))?;

        let Some(secret) = record
            .connection_secret
            .as_ref()
            .and_then(|secret| ConnectionSecret::parse(secret.expose_secret()))
        else {
            tracing::debug!(user_id = %user.id, connection_id, "cached connection has no valid secret; rescanning");
            return Ok(None);
        };

        Ok(Some(BillingSession {
            plan: cached.plan.clone(),
            connection_id: record.connection_id.unwrap_or_else(|| connection_id.to_owned()),
            connection_secret: secret,
            wallet_id: record.wallet_id.or_else(|| cached.wallet_id.clone()),
            updated_at: cached.updated_at,
        }))
    }

    /// Scan up to [`MAX_SCAN_PAGES`] pages and return ranked candidates
    async fn scan(&self, email: &str) -> Result<Vec<Candidate>, BillingError> {
        let email = normalize_email(email);
        let mut matching = Vec::new();
        let mut valid = Vec::new();
        let mut cursor: Option<String> = None;
        let now = Timestamp::now();

        for page_number in 0..MAX_SCAN_PAGES {
            let page = self
                .registry
                .list_connections(cursor.as_deref())
                .await
                .map_err(BillingError::registry(RESTORE_CONTEXT))?;

            tracing::debug!(page = page_number, items = page.items.len(), "scanned registry page");

            for candidate in page.items.iter().filter_map(|record| self.resolver.normalize(record, now)) {
                if candidate.customer_email == email && candidate.plan_id.is_some() {
                    matching.push(candidate.clone());
                }
                valid.push(candidate);
            }

            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        let mut candidates = if !matching.is_empty() {
            matching
        } else if self.fallback.applies_to(&email) {
            let default_plan = self.plans().default_plan();
            valid
                .into_iter()
                .filter_map(|mut candidate| {
                    if candidate.plan_id.is_none() {
                        candidate.plan_id = default_plan.map(str::to_owned);
                    }
                    candidate.plan_id.is_some().then_some(candidate)
                })
                .collect()
        } else {
            Vec::new()
        };

        rank(&mut candidates);
        Ok(candidates)
    }
}

/// Pick the connection an operation targets: the requested id, or the
/// user's cached billing connection
pub fn select_connection_id(requested: Option<&str>, user: &User) -> Result<String, BillingError> {
    requested
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .or_else(|| {
            user.billing
                .as_ref()
                .map(|billing| billing.connection_id.trim())
                .filter(|id| !id.is_empty())
        })
        .map(str::to_owned)
        .ok_or_else(|| BillingError::Validation("Missing connectionId".to_owned()))
}
