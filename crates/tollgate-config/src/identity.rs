use std::path::PathBuf;

use serde::Deserialize;

/// Local user store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// JSON file holding the `{ "users": [...] }` table
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("auth-users.json")
}
