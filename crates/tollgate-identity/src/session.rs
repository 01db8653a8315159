use dashmap::DashMap;
use jiff::Timestamp;

use crate::password::hex;
use crate::{IdentityError, User, UserStore};

/// An in-memory bearer session
#[derive(Debug, Clone)]
struct AuthSession {
    user_id: String,
    created_at: Timestamp,
}

/// A request whose bearer token resolved to a live user
#[derive(Clone)]
pub struct Authenticated {
    pub token: String,
    pub user: User,
    pub issued_at: Timestamp,
}

impl std::fmt::Debug for Authenticated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticated")
            .field("user_id", &self.user.id)
            .field("issued_at", &self.issued_at)
            .finish_non_exhaustive()
    }
}

/// Process-local map of bearer tokens to users
///
/// Sessions have no expiry. They end on logout or when the process exits.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, AuthSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token for a user
    ///
    /// Tokens are 24 random bytes (192 bits) encoded as hex.
    pub fn issue(&self, user: &User) -> String {
        let token = hex(&rand::random::<[u8; 24]>());
        self.sessions.insert(
            token.clone(),
            AuthSession {
                user_id: user.id.clone(),
                created_at: Timestamp::now(),
            },
        );
        token
    }

    /// Resolve a token to its user
    ///
    /// Returns `None` for unknown tokens. A token whose user no longer
    /// exists is evicted and also yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the user store lookup fails
    pub async fn resolve(&self, token: &str, users: &dyn UserStore) -> Result<Option<Authenticated>, IdentityError> {
        let Some(session) = self.sessions.get(token).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };

        match users.find_by_id(&session.user_id).await? {
            Some(user) => Ok(Some(Authenticated {
                token: token.to_owned(),
                user,
                issued_at: session.created_at,
            })),
            None => {
                self.sessions.remove(token);
                tracing::debug!(user_id = %session.user_id, "evicted session for missing user");
                Ok(None)
            }
        }
    }

    /// Drop a token; returns whether it existed
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
