#![allow(clippy::must_use_candidate)]

mod auth;
mod cors;
mod error;
mod extract;
mod health;
mod routes;
mod state;

use std::net::SocketAddr;

use axum::Router;
use tollgate_config::Config;
use tollgate_registry::PlanTable;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::AppState;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the registry client or the identity store
    /// cannot be initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3001)));

        let state = AppState::from_config(&config).await?;

        tracing::info!(
            registry = %state.registry.base_url(),
            store = %config.identity.store_path.display(),
            fallback_emails = config.billing.fallback.emails.len(),
            "services initialized"
        );
        log_plan_summary(state.billing.plans());

        let mut app = routes::api_router(state);

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        app = app.layer(TraceLayer::new_for_http());

        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

/// Log each plan and whether checkout can be started for it
fn log_plan_summary(plans: &PlanTable) {
    for (plan_id, plan) in plans.iter() {
        match plan.subscription_config_id() {
            Some(subscription_config_id) => tracing::info!(
                plan = plan_id,
                amount_usd = plan.amount_usd,
                subscription_config_id,
                "plan ready"
            ),
            None => tracing::warn!(
                plan = plan_id,
                amount_usd = plan.amount_usd,
                "plan missing subscription_config_id"
            ),
        }
    }
}
