// Sales Explorer - Web Server
// JSON API over the filter-and-aggregate pipeline

use anyhow::{Context, Result};
use clap::Parser;
use sales_explorer::api::{router, AppState};
use sales_explorer::{load_csv, Config, Session};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "sales-server", version, about = "Sales Explorer JSON API")]
struct Args {
    /// Sales CSV to serve
    #[arg(short, long, value_name = "FILE", env = "SALES_EXPLORER_DATA")]
    data: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides `server.bind`)
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::resolve(args.config.as_deref())?;

    // Load dataset once; every request filters this immutable copy
    let data_path = args.data.unwrap_or_else(|| config.data.path.clone());
    let dataset = load_csv(&data_path, &config.data.load_options())
        .with_context(|| format!("Failed to load sales data from {}", data_path.display()))?;

    if let Some((from, to)) = dataset.date_bounds() {
        info!(records = dataset.len(), %from, %to, "Dataset ready");
    }

    let app = router(AppState::new(Session::new(dataset)));

    let addr = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("🚀 Server running on http://{}", addr);
    info!("   API: http://{}/api/dashboard", addr);

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
