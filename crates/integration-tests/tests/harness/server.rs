//! Test server wrapper that starts tollgate on a random port

use std::net::SocketAddr;

use serde_json::{Value, json};
use tempfile::TempDir;
use tollgate_config::Config;
use tollgate_server::Server;
use tokio_util::sync::CancellationToken;

use super::config::ConfigBuilder;
use super::mock_registry::MockRegistry;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
    _store: Option<TempDir>,
}

impl TestServer {
    /// Start a test server with the given configuration
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        Self::start_inner(config, None).await
    }

    /// Start against `registry` with a fresh identity store
    pub async fn start_with(
        registry: &MockRegistry,
        configure: impl FnOnce(ConfigBuilder) -> ConfigBuilder,
    ) -> anyhow::Result<Self> {
        let store = tempfile::tempdir()?;
        let builder = ConfigBuilder::new(&registry.base_url(), &store.path().join("auth-users.json"));
        Self::start_inner(configure(builder).build(), Some(store)).await
    }

    async fn start_inner(config: Config, store: Option<TempDir>) -> anyhow::Result<Self> {
        let server = Server::new(config).await?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        let client = reqwest::Client::new();

        Ok(Self {
            addr,
            shutdown,
            client,
            _store: store,
        })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Create an account and return its bearer token
    pub async fn signup(&self, email: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/signup"))
            .json(&json!({ "email": email, "password": "secret123", "name": "Traveler" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201, "signup failed");

        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_owned()
    }

    /// GET `path` with a bearer token
    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap()
    }

    /// POST a JSON body to `path` with a bearer token
    pub async fn post(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
