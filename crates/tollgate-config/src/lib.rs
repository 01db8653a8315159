#![allow(clippy::must_use_candidate)]

pub mod billing;
pub mod cors;
mod env;
pub mod health;
pub mod identity;
mod loader;
pub mod plans;
pub mod registry;
pub mod server;
pub mod telemetry;

use indexmap::IndexMap;
use serde::Deserialize;

pub use billing::*;
pub use cors::*;
pub use health::*;
pub use identity::*;
pub use plans::*;
pub use registry::*;
pub use server::*;
pub use telemetry::{ExportProtocol, ExporterConfig, LogFormat, TelemetryConfig};

/// Top-level Tollgate configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote connection registry credentials and endpoint
    pub registry: RegistryConfig,
    /// Local user store
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Subscription plans keyed by plan id, in declaration order
    #[serde(default)]
    pub plans: IndexMap<String, PlanConfig>,
    /// Billing-session reconciliation policy
    #[serde(default)]
    pub billing: BillingConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
