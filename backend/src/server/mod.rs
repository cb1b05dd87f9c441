//! Server construction: configuration, state wiring, and route mounting.

mod config;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpServer};
use tracing::info;

use crate::inbound::http::{accounts, admin, auth, health, loans};
use crate::inbound::http::{HealthState, HttpState};
use crate::middleware::Trace;
use crate::outbound::persistence::{DbPool, InMemoryStore, PoolConfig};

/// Build the HTTP state from configuration: database-backed when a URL is
/// configured, in-memory otherwise.
async fn build_http_state(config: &AppConfig) -> std::io::Result<HttpState> {
    let tokens = config.token_codec();
    match &config.database_url {
        Some(url) => {
            let pool_config = PoolConfig::new(url.clone())
                .with_max_size(config.db_pool_size)
                .with_connection_timeout(Duration::from_secs(config.db_checkout_timeout_secs));
            let pool = DbPool::new(pool_config)
                .await
                .map_err(|err| std::io::Error::other(format!("pool construction failed: {err}")))?;
            info!(max_size = config.db_pool_size, "database pool ready");
            Ok(HttpState::with_database(pool, tokens))
        }
        None => {
            info!("no database configured; using in-memory store");
            Ok(HttpState::in_memory(Arc::new(InMemoryStore::default()), tokens))
        }
    }
}

/// Assemble the application with every route mounted. Shared between the
/// real server and the integration tests, so both exercise the same tree.
pub fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(auth::register)
        .service(auth::login)
        .service(auth::me)
        .service(loans::apply)
        .service(loans::my_loans)
        .service(accounts::balance)
        .service(accounts::my_transactions)
        .service(admin::list_loans)
        .service(admin::list_pending)
        .service(admin::approve)
        .service(admin::reject)
        .service(admin::disburse)
        .service(admin::dashboard_stats)
        .service(health::health);

    #[cfg(debug_assertions)]
    let app = {
        use utoipa::OpenApi;
        app.route(
            "/api-docs/openapi.json",
            web::get().to(|| async { web::Json(crate::ApiDoc::openapi()) }),
        )
    };

    app
}

/// Construct the HTTP server from parsed configuration.
///
/// # Errors
///
/// Fails when the pool cannot be built or the socket cannot be bound.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: AppConfig,
) -> std::io::Result<Server> {
    let http_state = web::Data::new(build_http_state(&config).await?);
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    info!(addr = %config.bind_addr, "listening");
    Ok(server)
}
