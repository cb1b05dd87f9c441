//! Runtime configuration parsed from flags and environment variables.

use std::net::SocketAddr;

use chrono::Duration;
use clap::Parser;
use zeroize::Zeroizing;

use crate::domain::TokenCodec;

/// Server configuration. Every flag has an environment-variable twin so
/// container deployments configure the service without a command line.
#[derive(Debug, Clone, Parser)]
#[command(name = "microlend", about = "Micro-lending backend", version)]
pub struct AppConfig {
    /// Socket address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: SocketAddr,

    /// PostgreSQL connection URL. When absent the server runs over the
    /// in-memory store, which is only suitable for local development.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Secret used to sign and verify bearer tokens. Injected, never
    /// defaulted: the server refuses to start without it.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Token lifetime in seconds.
    #[arg(long, env = "TOKEN_TTL_SECS", default_value_t = 86_400)]
    pub token_ttl_secs: i64,

    /// Maximum connections in the database pool.
    #[arg(long, env = "DB_POOL_SIZE", default_value_t = 10)]
    pub db_pool_size: u32,

    /// Bounded wait for a pooled connection, in seconds.
    #[arg(long, env = "DB_CHECKOUT_TIMEOUT_SECS", default_value_t = 5)]
    pub db_checkout_timeout_secs: u64,
}

impl AppConfig {
    /// Build the token codec from the configured secret and lifetime.
    #[must_use]
    pub fn token_codec(&self) -> TokenCodec {
        let secret = Zeroizing::new(self.jwt_secret.clone());
        TokenCodec::new(secret.as_bytes(), Duration::seconds(self.token_ttl_secs))
    }
}
