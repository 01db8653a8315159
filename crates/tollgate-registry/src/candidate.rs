//! Normalization of registry connections into ranked candidates

use std::sync::Arc;

use jiff::Timestamp;
use secrecy::ExposeSecret;
use tollgate_core::ConnectionSecret;

use crate::plans::PlanTable;
use crate::types::ConnectionRecord;

/// A structurally valid registry connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub connection_id: String,
    pub connection_secret: ConnectionSecret,
    /// Normalized customer email, empty when the record has none
    pub customer_email: String,
    /// Plan mapped from the subscription config; `None` when unmapped
    pub plan_id: Option<String>,
    pub wallet_id: Option<String>,
    /// Creation time in epoch milliseconds; the scan time when missing and
    /// 0 when unparseable
    pub created_at_ms: i64,
    pub active: bool,
}

/// Turns raw registry records into [`Candidate`]s
#[derive(Debug, Clone)]
pub struct CandidateResolver {
    plans: Arc<PlanTable>,
}

impl CandidateResolver {
    pub fn new(plans: Arc<PlanTable>) -> Self {
        Self { plans }
    }

    pub fn plans(&self) -> &PlanTable {
        &self.plans
    }

    /// Normalize a record, or `None` when it has no connection id or no
    /// valid secret
    ///
    /// `now` stands in for a missing creation time, so undated connections
    /// rank as the newest. Pass one value for a whole scan.
    pub fn normalize(&self, record: &ConnectionRecord, now: Timestamp) -> Option<Candidate> {
        let connection_id = record.connection_id.as_deref()?.to_owned();
        let connection_secret = ConnectionSecret::parse(record.connection_secret.as_ref()?.expose_secret())?;

        let customer_email = record
            .customer
            .as_ref()
            .and_then(|customer| customer.email.as_deref())
            .or(record.customer_email.as_deref())
            .map(|email| email.trim().to_lowercase())
            .unwrap_or_default();

        let subscription = record.subscription.as_ref();
        let plan_id = subscription
            .and_then(|s| s.subscription_config_id.as_deref())
            .and_then(|id| self.plans.plan_for_subscription_config(id))
            .map(str::to_owned);
        let active = subscription.and_then(|s| s.status.as_deref()) == Some("active");

        Some(Candidate {
            connection_id,
            connection_secret,
            customer_email,
            plan_id,
            wallet_id: record.wallet_id.clone(),
            created_at_ms: record
                .created_at
                .as_deref()
                .map_or_else(|| now.as_millisecond(), parse_millis),
            active,
        })
    }
}

/// Order candidates best-first: active before inactive, then newest first
///
/// The sort is stable, so equal candidates keep registry order.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.active
            .cmp(&a.active)
            .then_with(|| b.created_at_ms.cmp(&a.created_at_ms))
    });
}

/// Epoch milliseconds of an RFC 3339 timestamp or a bare `YYYY-MM-DD` date
fn parse_millis(raw: &str) -> i64 {
    if let Ok(timestamp) = raw.parse::<Timestamp>() {
        return timestamp.as_millisecond();
    }

    raw.parse::<jiff::civil::Date>()
        .ok()
        .and_then(|date| date.to_zoned(jiff::tz::TimeZone::UTC).ok())
        .map_or(0, |zoned| zoned.timestamp().as_millisecond())
}
