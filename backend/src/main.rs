//! Backend entry-point: parses configuration and runs the HTTP server.

use actix_web::web;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use microlend::inbound::http::HealthState;
use microlend::server::{create_server, AppConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %err, "tracing init failed");
    }

    let config = AppConfig::parse();
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config).await?;
    server.await
}
