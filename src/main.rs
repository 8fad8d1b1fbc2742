use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dishwatch::adapters::{serve, ActiveDishViewers, ConnectionRegistry, HyperHubAdapter};
use dishwatch::config::Config;
use dishwatch::domain::DishViewersService;

#[derive(Parser, Debug)]
#[clap(version = env!("DISHWATCH_VERSION"), about = "Live dish viewer counts over WebSocket")]
pub struct Opts {
    /// Configuration file (defaults to the per-user dishwatch config)
    #[clap(long, short = 'c')]
    config: Option<PathBuf>,

    /// listen on this network adress, overriding the configuration
    #[clap(long, short = 'b')]
    bind: Option<String>,

    /// tracing filter, overriding the configuration (RUST_LOG still wins)
    #[clap(long)]
    log_filter: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::parse();

    let mut config = Config::load(opts.config.as_deref())?;
    if let Some(bind) = opts.bind {
        config.bind = bind;
    }
    if let Some(filter) = opts.log_filter {
        config.log_filter = filter;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // each live viewer holds a socket
    match rlimit::increase_nofile_limit(u64::MAX) {
        Ok(limit) => info!("open file limit set to {}", limit),
        Err(e) => warn!("failed to raise open file limit: {}", e),
    }

    let tracker = Arc::new(ActiveDishViewers::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let service = Arc::new(DishViewersService::new(tracker, registry.clone()));
    let adapter = Arc::new(HyperHubAdapter::new(
        service,
        registry,
        config.hub_path.clone(),
        config.max_message_bytes,
    ));

    let listener = TcpListener::bind(&config.bind).await?;
    info!("dishwatch {} listening on {}", env!("DISHWATCH_VERSION"), listener.local_addr()?);
    info!("WebSocket hub: ws://{}{}", config.bind, config.hub_path);

    tokio::select! {
        _ = serve(listener, adapter) => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("shutting down");
        }
    }
    Ok(())
}
