use std::sync::Arc;

use crate::{
    Authenticated, IdentityError, NewUser, SessionStore, User, UserStore, hash_password, normalize_email,
    verify_password,
};

const MIN_PASSWORD_CHARS: usize = 6;

/// Signup, login and session lookup over a [`UserStore`]
#[derive(Clone)]
pub struct Accounts {
    users: Arc<dyn UserStore>,
    sessions: Arc<SessionStore>,
}

impl Accounts {
    pub fn new(users: Arc<dyn UserStore>, sessions: Arc<SessionStore>) -> Self {
        Self { users, sessions }
    }

    /// The underlying user store
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Create an account and open a session for it
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed email, a short password
    /// or a blank name, and `AlreadyExists` for a taken email
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> Result<(String, User), IdentityError> {
        let email = normalize_email(email);
        let name = name.trim();

        if email.is_empty() || !email.contains('@') {
            return Err(IdentityError::Validation("A valid email is required".to_owned()));
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(IdentityError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }
        if name.is_empty() {
            return Err(IdentityError::Validation("Name is required".to_owned()));
        }

        let user = self
            .users
            .create(NewUser {
                email,
                name: name.to_owned(),
                password_hash: hash_password(password),
            })
            .await?;

        let token = self.sessions.issue(&user);
        tracing::info!(user_id = %user.id, email = %user.email, "auth signup");

        Ok((token, user))
    }

    /// Check credentials and open a session
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` when the email is unknown or the password
    /// does not match
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), IdentityError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .filter(|user| verify_password(password, &user.password_hash))
            .ok_or(IdentityError::InvalidCredentials)?;

        let token = self.sessions.issue(&user);
        tracing::info!(user_id = %user.id, email = %user.email, "auth login");

        Ok((token, user))
    }

    /// Resolve a bearer token to a live session
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when the token is unknown or its user is gone
    pub async fn authenticate(&self, token: &str) -> Result<Authenticated, IdentityError> {
        self.sessions
            .resolve(token, self.users.as_ref())
            .await?
            .ok_or(IdentityError::Unauthenticated)
    }

    /// End a session
    pub fn logout(&self, token: &str) {
        if self.sessions.revoke(token) {
            tracing::debug!("auth logout");
        }
    }
}
