use std::path::PathBuf;

use clap::Parser;

/// Tollgate billing gateway
#[derive(Debug, Parser)]
#[command(
    name = "tollgate",
    about = "Billing-session reconciliation and authenticated streaming proxy"
)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tollgate.toml", env = "TOLLGATE_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "TOLLGATE_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,
}
