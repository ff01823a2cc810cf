//! PACT Daemon (pactd)
//!
//! Sync server for offline-first clients: accepts a client's record
//! collection, reconciles it against the durable store, and returns the
//! merged collection.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (TCP on 8000, JSON store at ./pact.json)
//! pactd
//!
//! # Custom store location
//! pactd --store /var/lib/pact/records.json
//!
//! # SQLite persistence instead of the JSON file
//! pactd --db /var/lib/pact/pact.db
//! ```

mod server;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use pact_store::{JsonFileStore, RecordStore, SqliteStore};
use pact_sync::SyncService;
use server::TcpServer;

/// PACT Daemon - record sync server
#[derive(Parser, Debug)]
#[command(name = "pactd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bind address
    #[arg(long, env = "PACT_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// TCP port to listen on
    #[arg(long, env = "PACT_PORT", default_value = "8000")]
    port: u16,

    /// JSON store file path
    #[arg(long, env = "PACT_STORE", default_value = "pact.json")]
    store: PathBuf,

    /// SQLite database path (overrides the JSON store)
    #[arg(long, env = "PACT_DB")]
    db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PACT_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .init();

    let store: Arc<dyn RecordStore> = match &args.db {
        Some(db_path) => {
            info!(path = %db_path.display(), "Using SQLite persistence");
            Arc::new(SqliteStore::new(db_path)?)
        }
        None => {
            info!(path = %args.store.display(), "Using JSON file persistence");
            Arc::new(JsonFileStore::new(&args.store))
        }
    };

    let service = Arc::new(SyncService::new(store));

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    let server = TcpServer::bind(service, addr).await?;
    info!(addr = %server.local_addr()?, "PACT sync daemon listening");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
        }
    }

    Ok(())
}
