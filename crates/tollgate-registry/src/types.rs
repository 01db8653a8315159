//! Registry wire types
//!
//! The registry is inconsistent about field casing and sometimes sends both
//! spellings of a key in one object. Each record is read into a raw shape
//! that keeps the two apart, then merged with the snake_case value first and
//! the camelCase value used when the first is absent or blank. Nothing
//! outside this module and [`crate::candidate`] deals with casing.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

/// A connection as returned by `GET /connections/:id` and in list pages
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawConnectionRecord")]
pub struct ConnectionRecord {
    pub connection_id: Option<String>,
    pub connection_secret: Option<SecretString>,
    pub customer: Option<Customer>,
    pub customer_email: Option<String>,
    pub subscription: Option<SubscriptionSummary>,
    pub wallet_id: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Deserialize)]
struct RawConnectionRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    connection_id: Option<String>,
    #[serde(default, rename = "connectionId", deserialize_with = "lenient_string")]
    connection_id_camel: Option<String>,
    #[serde(default)]
    connection_secret: Option<SecretString>,
    #[serde(default, rename = "connectionSecret")]
    connection_secret_camel: Option<SecretString>,
    #[serde(default)]
    customer: Option<Customer>,
    #[serde(default, deserialize_with = "lenient_string")]
    customer_email: Option<String>,
    #[serde(default, rename = "customerEmail", deserialize_with = "lenient_string")]
    customer_email_camel: Option<String>,
    #[serde(default)]
    subscription: Option<SubscriptionSummary>,
    #[serde(default, deserialize_with = "lenient_string")]
    wallet_id: Option<String>,
    #[serde(default, rename = "walletId", deserialize_with = "lenient_string")]
    wallet_id_camel: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    created_at: Option<String>,
    #[serde(default, rename = "createdAt", deserialize_with = "lenient_string")]
    created_at_camel: Option<String>,
}

impl From<RawConnectionRecord> for ConnectionRecord {
    fn from(raw: RawConnectionRecord) -> Self {
        let connection_secret = raw
            .connection_secret
            .filter(|secret| !secret.expose_secret().is_empty())
            .or(raw.connection_secret_camel);

        Self {
            connection_id: raw.connection_id.or(raw.connection_id_camel),
            connection_secret,
            customer: raw.customer,
            customer_email: raw.customer_email.or(raw.customer_email_camel),
            subscription: raw.subscription,
            wallet_id: raw.wallet_id.or(raw.wallet_id_camel),
            created_at: raw.created_at.or(raw.created_at_camel),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Customer {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
}

/// Subscription fields embedded in a connection record
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawSubscriptionSummary")]
pub struct SubscriptionSummary {
    pub subscription_config_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
struct RawSubscriptionSummary {
    #[serde(default, deserialize_with = "lenient_string")]
    subscription_config_id: Option<String>,
    #[serde(default, rename = "subscriptionConfigId", deserialize_with = "lenient_string")]
    subscription_config_id_camel: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    status: Option<String>,
}

impl From<RawSubscriptionSummary> for SubscriptionSummary {
    fn from(raw: RawSubscriptionSummary) -> Self {
        Self {
            subscription_config_id: raw.subscription_config_id.or(raw.subscription_config_id_camel),
            status: raw.status,
        }
    }
}

/// One page of `GET /connections`
///
/// Items that do not deserialize are dropped here; the resolver would treat
/// them as invalid anyway.
#[derive(Debug, Clone, Default)]
pub struct ConnectionPage {
    pub items: Vec<ConnectionRecord>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

impl<'de> Deserialize<'de> for ConnectionPage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            data: Option<Vec<serde_json::Value>>,
            #[serde(default)]
            has_more: Option<bool>,
            #[serde(default, deserialize_with = "lenient_string")]
            next_cursor: Option<String>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let data = raw.data.unwrap_or_default();
        let total = data.len();
        let items: Vec<ConnectionRecord> = data
            .into_iter()
            .filter_map(|value| ConnectionRecord::deserialize(value).ok())
            .collect();

        if items.len() < total {
            tracing::debug!(dropped = total - items.len(), "skipped malformed connection records");
        }

        Ok(Self {
            items,
            has_more: raw.has_more.unwrap_or(false),
            next_cursor: raw.next_cursor,
        })
    }
}

/// Response of `GET /connections/:id/subscription`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionSubscription {
    #[serde(default)]
    pub subscription: Option<SubscriptionDetail>,
}

/// Full subscription state of a connection
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawSubscriptionDetail")]
pub struct SubscriptionDetail {
    pub subscription_config_id: Option<String>,
    pub status: Option<String>,
    pub cycle_end_at: Option<String>,
    pub plan: Option<SubscriptionPlan>,
    pub credits: Option<CreditBalances>,
}

#[derive(Deserialize)]
struct RawSubscriptionDetail {
    #[serde(default, deserialize_with = "lenient_string")]
    subscription_config_id: Option<String>,
    #[serde(default, rename = "subscriptionConfigId", deserialize_with = "lenient_string")]
    subscription_config_id_camel: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    cycle_end_at: Option<String>,
    #[serde(default)]
    plan: Option<SubscriptionPlan>,
    #[serde(default)]
    credits: Option<CreditBalances>,
}

impl From<RawSubscriptionDetail> for SubscriptionDetail {
    fn from(raw: RawSubscriptionDetail) -> Self {
        Self {
            subscription_config_id: raw.subscription_config_id.or(raw.subscription_config_id_camel),
            status: raw.status,
            cycle_end_at: raw.cycle_end_at,
            plan: raw.plan,
            credits: raw.credits,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionPlan {
    /// Credit included per billing cycle, as a decimal string
    #[serde(default, deserialize_with = "lenient_string")]
    pub included_credit: Option<String>,
}

/// Remaining credit, as decimal strings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawCreditBalances")]
pub struct CreditBalances {
    pub total_remaining: Option<String>,
    pub cycle_remaining: Option<String>,
    pub bundle_remaining: Option<String>,
}

#[derive(Deserialize)]
struct RawCreditBalances {
    #[serde(default, deserialize_with = "lenient_string")]
    total_remaining: Option<String>,
    #[serde(default, rename = "totalRemaining", deserialize_with = "lenient_string")]
    total_remaining_camel: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    cycle_remaining: Option<String>,
    #[serde(default, rename = "cycleRemaining", deserialize_with = "lenient_string")]
    cycle_remaining_camel: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    bundle_remaining: Option<String>,
    #[serde(default, rename = "bundleRemaining", deserialize_with = "lenient_string")]
    bundle_remaining_camel: Option<String>,
}

impl From<RawCreditBalances> for CreditBalances {
    fn from(raw: RawCreditBalances) -> Self {
        Self {
            total_remaining: raw.total_remaining.or(raw.total_remaining_camel),
            cycle_remaining: raw.cycle_remaining.or(raw.cycle_remaining_camel),
            bundle_remaining: raw.bundle_remaining.or(raw.bundle_remaining_camel),
        }
    }
}

/// A subscription configuration
///
/// `GET /subscription_configs/:id` returns it either bare or wrapped in a
/// `subscription_config` envelope; both are accepted.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionConfig {
    pub credit_bundles: Vec<CreditBundleRecord>,
}

impl<'de> Deserialize<'de> for SubscriptionConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default)]
            credit_bundles: Option<Vec<CreditBundleRecord>>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Payload {
            Wrapped { subscription_config: Body },
            Bare(Body),
        }

        let body = match Payload::deserialize(deserializer)? {
            Payload::Wrapped { subscription_config } => subscription_config,
            Payload::Bare(body) => body,
        };

        Ok(Self {
            credit_bundles: body.credit_bundles.unwrap_or_default(),
        })
    }
}

/// A purchasable credit top-up
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawCreditBundleRecord")]
pub struct CreditBundleRecord {
    pub credit_bundle_id: Option<String>,
    pub name: Option<String>,
    pub cost: Option<String>,
    pub credit_amount: Option<String>,
}

#[derive(Deserialize)]
struct RawCreditBundleRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    credit_bundle_id: Option<String>,
    #[serde(default, rename = "creditBundleId", deserialize_with = "lenient_string")]
    credit_bundle_id_camel: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    cost: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    credit_amount: Option<String>,
    #[serde(default, rename = "creditAmount", deserialize_with = "lenient_string")]
    credit_amount_camel: Option<String>,
}

impl From<RawCreditBundleRecord> for CreditBundleRecord {
    fn from(raw: RawCreditBundleRecord) -> Self {
        Self {
            credit_bundle_id: raw.credit_bundle_id.or(raw.credit_bundle_id_camel),
            name: raw.name,
            cost: raw.cost,
            credit_amount: raw.credit_amount.or(raw.credit_amount_camel),
        }
    }
}

/// Kind of checkout session to create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    Subscription,
    CreditBundle,
}

/// Body of `POST /checkout_sessions`
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSessionRequest {
    pub checkout_mode: CheckoutMode,
    pub origin_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_config_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_bundle_id: Option<String>,
}

/// Response of `POST /checkout_sessions`
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawCheckoutSession")]
pub struct CheckoutSession {
    pub checkout_session_id: String,
    pub checkout_session_token: String,
}

#[derive(Deserialize)]
struct RawCheckoutSession {
    #[serde(default, deserialize_with = "lenient_string")]
    checkout_session_id: Option<String>,
    #[serde(default, rename = "checkoutSessionId", deserialize_with = "lenient_string")]
    checkout_session_id_camel: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    checkout_session_token: Option<String>,
    #[serde(default, rename = "checkoutSessionToken", deserialize_with = "lenient_string")]
    checkout_session_token_camel: Option<String>,
}

impl TryFrom<RawCheckoutSession> for CheckoutSession {
    type Error = String;

    fn try_from(raw: RawCheckoutSession) -> Result<Self, Self::Error> {
        let checkout_session_id = raw
            .checkout_session_id
            .or(raw.checkout_session_id_camel)
            .ok_or("missing field `checkout_session_id`")?;
        let checkout_session_token = raw
            .checkout_session_token
            .or(raw.checkout_session_token_camel)
            .ok_or("missing field `checkout_session_token`")?;

        Ok(Self {
            checkout_session_id,
            checkout_session_token,
        })
    }
}

/// Accept a string, number or bool; trim it, and treat blank or null as absent
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;

    let text = match value {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        Some(other) => return Err(serde::de::Error::custom(format!("expected a scalar, found {other}"))),
    };

    let trimmed = text.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()))
}
