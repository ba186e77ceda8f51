use anyhow::Result;
use dashmetrics::{config::Config, data, forecast::ModelStore, server};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use warp::Filter;

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let config = Config::from_env();
    info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        models_dir = %config.models_dir.display(),
        "configured"
    );

    // ─── 3) load the datasets once; any failure here is fatal ────────
    let dataset = Arc::new(data::load_dataset(&config.data_dir)?);
    let store = Arc::new(ModelStore::new(&config.models_dir));

    // ─── 4) serve ────────────────────────────────────────────────────
    let routes = server::routes(dataset, store)
        .with(server::cors())
        .recover(server::handle_rejection);

    info!("listening on port {}", config.port);
    warp::serve(routes).run(([0, 0, 0, 0], config.port)).await;

    Ok(())
}
