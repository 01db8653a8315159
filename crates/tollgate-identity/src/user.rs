use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A persisted user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque id, `usr_` followed by 16 hex characters
    pub id: String,
    /// Normalized email, unique across the store
    pub email: String,
    pub name: String,
    /// SHA-256 hex digest of the password
    pub password_hash: String,
    pub created_at: Timestamp,
    /// Cached billing-session pointer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing: Option<BillingRecord>,
}

impl User {
    /// Client-facing view without credentials or billing
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

/// The cached reconciliation result stored on a user
///
/// The connection secret is not part of the record; it is re-read from the
/// registry whenever the pointer is revalidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    pub plan: String,
    pub connection_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,
    pub updated_at: Timestamp,
}

/// User fields returned to API clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: Timestamp,
}

/// Input to [`UserStore::create`](crate::UserStore::create)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}
