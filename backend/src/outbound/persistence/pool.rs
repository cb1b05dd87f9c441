//! Async connection pool for Diesel PostgreSQL connections.
//!
//! Wraps `diesel-async` and `bb8`. Checkout carries the configured bounded
//! timeout; an expired checkout is how the rest of the system learns the
//! store is unavailable, so that distinction is preserved in [`PoolError`].

use std::time::Duration;

use diesel_async::pooled_connection::bb8::{Pool, PooledConnection, RunError};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

/// Errors that can occur during pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Checkout exceeded the bounded timeout.
    #[error("timed out waiting for a pooled connection")]
    CheckoutTimeout,
    /// Failed to check out a connection for another reason.
    #[error("failed to get connection from pool: {message}")]
    Checkout {
        /// Driver-provided detail.
        message: String,
    },
    /// Failed to build the connection pool.
    #[error("failed to build connection pool: {message}")]
    Build {
        /// Driver-provided detail.
        message: String,
    },
}

/// Configuration for the database connection pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl PoolConfig {
    /// Create a new configuration with the given database URL.
    ///
    /// Defaults: 10 connections, 5 second checkout timeout.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: 10,
            connection_timeout: Duration::from_secs(5),
        }
    }

    /// Set the maximum number of connections in the pool.
    #[must_use]
    pub const fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the connection checkout timeout.
    #[must_use]
    pub const fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Async connection pool for PostgreSQL via Diesel.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Create a new connection pool with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Build`] if the pool cannot be constructed, e.g.
    /// an invalid database URL.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::Build {
                message: err.to_string(),
            })?;

        Ok(Self { inner: pool })
    }

    /// Get a connection from the pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::CheckoutTimeout`] when the bounded timeout
    /// expires, [`PoolError::Checkout`] for other checkout failures.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner.get().await.map_err(|err| match err {
            RunError::TimedOut => PoolError::CheckoutTimeout,
            other => PoolError::Checkout {
                message: other.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_config_default_values() {
        let config = PoolConfig::new("postgres://localhost/lending");
        assert_eq!(config.database_url(), "postgres://localhost/lending");
        assert_eq!(config.max_size, 10);
        assert_eq!(config.connection_timeout, Duration::from_secs(5));
    }

    #[rstest]
    fn pool_config_builder_pattern() {
        let config = PoolConfig::new("postgres://localhost/lending")
            .with_max_size(20)
            .with_connection_timeout(Duration::from_secs(60));
        assert_eq!(config.max_size, 20);
        assert_eq!(config.connection_timeout, Duration::from_secs(60));
    }

    #[rstest]
    fn pool_error_display() {
        assert!(PoolError::CheckoutTimeout.to_string().contains("timed out"));
        let build = PoolError::Build {
            message: "invalid URL".into(),
        };
        assert!(build.to_string().contains("invalid URL"));
    }
}
