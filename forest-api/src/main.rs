//! Forest API server - JSON over HTTP for the growth engine, plus an SSE feed
//! of tree changes.

mod error;
mod owner;
mod routes;
mod sse;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use clap::Parser;
use growth::io::clock::SystemClock;
use growth::io::config::load_config;
use growth::io::store::SqliteStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "forest-api")]
#[command(about = "HTTP API for the habit forest growth engine")]
struct Args {
    /// Config file (TOML). Missing file means defaults.
    #[arg(long, default_value = "bloom_forest.toml")]
    config: PathBuf,

    /// Database file; overrides `database_path` from the config
    #[arg(long)]
    database: Option<PathBuf>,

    /// Address to bind the server to; overrides `server.bind`
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on; overrides `server.port`
    #[arg(long)]
    port: Option<u16>,

    /// Directory containing static UI files to serve at `/`
    #[arg(long)]
    ui_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("forest_api=info".parse()?)
                .add_directive("growth=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut cfg = load_config(&args.config)?;
    if let Some(database) = args.database {
        cfg.database_path = database;
    }
    let bind = args.bind.unwrap_or(cfg.server.bind);
    let port = args.port.unwrap_or(cfg.server.port);

    info!(database = %cfg.database_path.display(), "starting forest-api");
    let store = SqliteStore::open(&cfg.database_path)
        .with_context(|| format!("open database {}", cfg.database_path.display()))?;
    let state = AppState::new(store, Arc::new(SystemClock), cfg.forest_radius);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .nest("/api", routes::api_router())
        .route("/events", get(sse::events_handler))
        .layer(cors)
        .with_state(state);

    if let Some(ui_dir) = args.ui_dir {
        if ui_dir.exists() {
            info!(ui_dir = %ui_dir.display(), "serving static UI files");
            app =
                app.fallback_service(ServeDir::new(ui_dir).append_index_html_on_directories(true));
        } else {
            info!(ui_dir = %ui_dir.display(), "UI directory not found, API-only mode");
        }
    }

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
