//! # Counter Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_web::HttpServer;
use tracing_actix_web::TracingLogger;

use counter_infra::TracingEventSink;
use counter_server::build_app;
use counter_server::config::AppConfig;
use counter_server::state::AppState;
use counter_server::telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env()?;

    tracing::info!(
        "Starting 1mb counter on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::from_config(&config, Arc::new(TracingEventSink)).await?;
    let cors = config.cors.clone();

    HttpServer::new(move || build_app(state.clone(), cors.clone()).wrap(TracingLogger::default()))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await?;

    Ok(())
}
