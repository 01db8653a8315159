use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::password::{hex, normalize_email};
use crate::{BillingRecord, IdentityError, NewUser, User};

/// Persistent user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user, rejecting an email that already exists
    /// (case-insensitive)
    async fn create(&self, new_user: NewUser) -> Result<User, IdentityError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, IdentityError>;

    /// Overwrite the whole record with the same id, inserting it if absent
    async fn persist(&self, user: User) -> Result<(), IdentityError>;

    /// Replace a user's cached billing pointer and return the updated user
    async fn set_billing(&self, user_id: &str, billing: Option<BillingRecord>) -> Result<User, IdentityError>;
}

/// On-disk layout: `{ "users": [...] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserTable {
    users: Vec<User>,
}

/// [`UserStore`] backed by a JSON file
///
/// The table is held in memory and rewritten wholesale after every
/// mutation. One lock covers the change and the file write, so concurrent
/// writers are applied one at a time and the file always matches memory.
pub struct FileUserStore {
    path: PathBuf,
    table: Mutex<UserTable>,
}

impl FileUserStore {
    /// Open the store, creating an empty file when none exists
    ///
    /// A file that cannot be read or parsed (including one without a
    /// `users` array) is logged and replaced by an empty table.
    ///
    /// # Errors
    ///
    /// Returns an error if the empty table cannot be written
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, IdentityError> {
        let path = path.into();

        let loaded = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<UserTable>(&raw) {
                Ok(table) => Some(table),
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %error,
                        "invalid user store file; resetting to an empty table"
                    );
                    None
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => None,
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %error,
                    "failed to read user store file; resetting to an empty table"
                );
                None
            }
        };

        let table = match loaded {
            Some(table) => table,
            None => {
                let empty = UserTable::default();
                write_table(&path, &empty).await?;
                empty
            }
        };

        tracing::debug!(path = %path.display(), users = table.users.len(), "user store opened");

        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    /// Apply a change and persist it before releasing the lock
    ///
    /// The change is made on a copy, so a failed write leaves the in-memory
    /// table untouched.
    async fn mutate<T, F>(&self, operation: F) -> Result<T, IdentityError>
    where
        F: FnOnce(&mut UserTable) -> Result<T, IdentityError> + Send,
        T: Send,
    {
        let mut table = self.table.lock().await;
        let mut next = table.clone();
        let result = operation(&mut next)?;
        write_table(&self.path, &next).await?;
        *table = next;
        Ok(result)
    }
}

#[async_trait]
impl UserStore for FileUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, IdentityError> {
        let user = User {
            id: format!("usr_{}", hex(&rand::random::<[u8; 8]>())),
            email: normalize_email(&new_user.email),
            name: new_user.name,
            password_hash: new_user.password_hash,
            created_at: Timestamp::now(),
            billing: None,
        };

        self.mutate(move |table| {
            if table.users.iter().any(|existing| existing.email.to_lowercase() == user.email) {
                return Err(IdentityError::AlreadyExists);
            }
            table.users.push(user.clone());
            Ok(user)
        })
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError> {
        let email = normalize_email(email);
        let table = self.table.lock().await;
        Ok(table.users.iter().find(|user| user.email.to_lowercase() == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, IdentityError> {
        let table = self.table.lock().await;
        Ok(table.users.iter().find(|user| user.id == id).cloned())
    }

    async fn persist(&self, user: User) -> Result<(), IdentityError> {
        self.mutate(move |table| {
            match table.users.iter_mut().find(|existing| existing.id == user.id) {
                Some(existing) => *existing = user,
                None => table.users.push(user),
            }
            Ok(())
        })
        .await
    }

    async fn set_billing(&self, user_id: &str, billing: Option<BillingRecord>) -> Result<User, IdentityError> {
        self.mutate(move |table| {
            let user = table
                .users
                .iter_mut()
                .find(|user| user.id == user_id)
                .ok_or_else(|| IdentityError::UserNotFound(user_id.to_owned()))?;
            user.billing = billing;
            Ok(user.clone())
        })
        .await
    }
}

/// Write the table through a temporary file and rename it into place
async fn write_table(path: &Path, table: &UserTable) -> Result<(), IdentityError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| IdentityError::Persistence(format!("failed to create {}: {e}", parent.display())))?;
    }

    let mut payload = serde_json::to_vec_pretty(table)
        .map_err(|e| IdentityError::Persistence(format!("failed to encode user table: {e}")))?;
    payload.push(b'\n');

    let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
    tokio::fs::write(&temp_path, payload)
        .await
        .map_err(|e| IdentityError::Persistence(format!("failed to write {}: {e}", temp_path.display())))?;

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| IdentityError::Persistence(format!("failed to replace {}: {e}", path.display())))?;

    Ok(())
}
