mod checker;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::checker::delegate::ScoringDelegate;
use crate::checker::sink::{DisabledSink, PgScoreSink, ScoreSink};
use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Checker API v{}", env!("CARGO_PKG_VERSION"));

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| {
            format!(
                "Cannot create upload directory {}",
                config.upload_dir.display()
            )
        })?;
    info!("Transient uploads go to {}", config.upload_dir.display());

    // Process-wide pool, reachable only through the sink.
    let sink: Arc<dyn ScoreSink> = match &config.database_url {
        Some(url) => Arc::new(PgScoreSink::new(create_pool(
            url,
            config.database_max_connections,
        )?)),
        None => {
            warn!("DATABASE_URL not set; score records will not be persisted");
            Arc::new(DisabledSink)
        }
    };

    let delegate = ScoringDelegate::from_config(&config);
    match config.scorer_timeout {
        Some(limit) => info!("Scorer timeout: {}s", limit.as_secs()),
        None => warn!("Scorer timeout disabled; a hung scorer will hang its request"),
    }

    let state = AppState {
        config: config.clone(),
        delegate: Arc::new(delegate),
        sink,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
