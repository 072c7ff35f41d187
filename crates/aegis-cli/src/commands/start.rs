//! `aegis start` — Start the Aegis claim node.

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use aegis_node::api::{serve, AppState};
use aegis_node::{ClaimService, NodeConfig};

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Path to the node configuration file.
    #[arg(short, long, default_value = "aegis.toml")]
    pub config: PathBuf,
}

pub async fn run(args: &StartArgs) -> anyhow::Result<()> {
    let config = NodeConfig::load(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    tracing::info!(name = %config.name, "starting Aegis claim node");

    let service = ClaimService::from_config(&config)?;
    let state = Arc::new(AppState {
        name: config.name.clone(),
        service,
    });

    let addr = format!("{}:{}", config.api.listen_addr, config.api.port).parse()?;
    serve(state, addr).await
}
