use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde_json::{Value, json};
use tollgate_config::PlanConfig;
use tollgate_identity::{FileUserStore, NewUser, User, UserStore};
use tollgate_registry::{PlanTable, RegistryClient};
use wiremock::MockServer;

use crate::{BillingSessionManager, FallbackPolicy};

pub struct Fixture {
    pub server: MockServer,
    pub registry: RegistryClient,
    pub plans: Arc<PlanTable>,
    pub users: Arc<FileUserStore>,
    pub manager: BillingSessionManager,
    _dir: tempfile::TempDir,
}

impl Fixture {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        let registry = RegistryClient::new(
            url::Url::parse(&format!("{}/", server.uri())).unwrap(),
            SecretString::from("sk_test".to_owned()),
            Duration::from_secs(5),
        )
        .unwrap();
        let plans = Arc::new(plans());
        let users = Arc::new(FileUserStore::open(dir.path().join("users.json")).await.unwrap());

        let manager = BillingSessionManager::new(
            registry.clone(),
            Arc::clone(&plans),
            Arc::clone(&users) as Arc<dyn UserStore>,
            FallbackPolicy::new(["demo@travel.test"]),
        );

        Self {
            server,
            registry,
            plans,
            users,
            manager,
            _dir: dir,
        }
    }

    pub async fn user(&self, email: &str) -> User {
        self.users
            .create(NewUser {
                email: email.to_owned(),
                name: "Test".to_owned(),
                password_hash: String::new(),
            })
            .await
            .unwrap()
    }
}

pub fn plans() -> PlanTable {
    PlanTable::new(IndexMap::from([
        (
            "starter10".to_owned(),
            PlanConfig {
                amount_usd: 10,
                subscription_config_id: Some("sc_10".to_owned()),
            },
        ),
        (
            "pro20".to_owned(),
            PlanConfig {
                amount_usd: 20,
                subscription_config_id: Some("sc_20".to_owned()),
            },
        ),
    ]))
}

/// A registry connection record with secret `cs_<id>` and wallet `wal_<id>`
pub fn connection(id: &str, email: &str, subscription_config_id: &str, status: &str, created_at: &str) -> Value {
    json!({
        "connection_id": id,
        "connection_secret": format!("cs_{id}"),
        "customer": { "email": email },
        "subscription": { "subscription_config_id": subscription_config_id, "status": status },
        "wallet_id": format!("wal_{id}"),
        "created_at": created_at,
    })
}

/// A newest-of-all active connection with an explicit secret
pub fn connection_with_secret(id: &str, email: &str, subscription_config_id: &str, secret: &str) -> Value {
    let mut record = connection(id, email, subscription_config_id, "active", "2030-01-01T00:00:00Z");
    record["connection_secret"] = json!(secret);
    record
}
