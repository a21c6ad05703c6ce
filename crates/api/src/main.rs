#![forbid(unsafe_code)]

mod entry;
mod handlers;
mod server;
mod support;

pub(crate) use support::*;

use clap::Parser;
use lf_storage::SqliteStore;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

// Widely deployed baseline; `initialize` echoes the client's version when it sends one.
const MCP_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "logframe-linking-api";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_LOG_FILTER: &str = "lf_api=info,lf_storage=info";

#[derive(Debug, Parser)]
#[command(name = "lf_api")]
#[command(about = "Logical framework linking API over JSON-RPC stdio")]
struct Args {
    /// Directory holding logframe.db
    #[arg(long, env = "LOGFRAME_STORAGE_DIR", default_value = "./.logframe")]
    storage_dir: PathBuf,

    /// Name recorded on every tool call span
    #[arg(long, env = "LOGFRAME_ACTOR", default_value = "operator")]
    actor: String,

    /// Caller role; viewers cannot mutate
    #[arg(long, env = "LOGFRAME_ROLE", value_enum, default_value_t = Role::Editor)]
    role: Role,

    /// tracing filter directives (falls back to RUST_LOG)
    #[arg(long, env = "LOGFRAME_LOG")]
    log_filter: Option<String>,
}

pub(crate) struct LogframeServer {
    initialized: bool,
    store: SqliteStore,
    identity: IdentityContext,
}

impl LogframeServer {
    pub(crate) fn new(store: SqliteStore, identity: IdentityContext) -> Self {
        Self {
            initialized: false,
            store,
            identity,
        }
    }
}

fn init_tracing(directives: Option<&str>) {
    let filter = match directives {
        Some(raw) => EnvFilter::new(raw),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    // stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.log_filter.as_deref());

    let identity = IdentityContext::new(&args.actor, args.role)?;
    let store = SqliteStore::open(&args.storage_dir)?;
    info!(
        storage_dir = %args.storage_dir.display(),
        actor = identity.actor(),
        role = %identity.role(),
        "{SERVER_NAME} {SERVER_VERSION} ready"
    );

    let mut server = LogframeServer::new(store, identity);
    entry::run_stdio(&mut server)
}
