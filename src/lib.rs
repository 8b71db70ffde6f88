//! logtriage -- lightweight log anomaly triage.
//!
//! Parses a plaintext application log, derives per-record features, and
//! runs two independent detectors: a fixed-window ERROR spike rule and an
//! isolation-forest outlier model. Results feed an HTML report and a small
//! HTTP dashboard.

pub mod analysis;
pub mod api;
pub mod config;
pub mod detect;
pub mod parse;
pub mod report;

use anyhow::{Context, Result};

use crate::config::AppConfig;

/// Start the dashboard server. Each request re-reads and re-analyzes the
/// configured log file.
pub async fn serve(config: &AppConfig) -> Result<()> {
    config.detection.validate()?;

    let state = api::state::AppState::new(
        config.server.log_file.clone(),
        config.server.report_dir.clone(),
        config.detection.clone(),
    );

    let addr: std::net::SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.server.bind))?;
    let app = api::router(state);

    tracing::info!(
        %addr,
        log_file = %config.server.log_file.display(),
        "logtriage dashboard listening"
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
