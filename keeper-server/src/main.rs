use anyhow::{Context, Result};
use clap::Parser;
use keeper_server::{serve, AppState, RemoteStore, ServerConfig};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keeper-server", version)]
#[command(about = "Remote store for Keeper clients", long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(short = 'a', long, env = "KEEPER_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// SQLite database file
    #[arg(short = 'd', long, env = "KEEPER_DATABASE")]
    database: Option<PathBuf>,

    /// Per-request deadline in seconds
    #[arg(long)]
    request_timeout_secs: Option<u64>,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();
        if let Some(addr) = self.listen_addr {
            config.listen_addr = addr;
        }
        if let Some(db) = self.database {
            config.database_path = db;
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        config
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let config = Cli::parse().into_config();
    let store = RemoteStore::open(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;

    serve(listener, AppState::new(store), &config, shutdown_signal()).await?;
    info!("keeper server stopped");
    Ok(())
}
