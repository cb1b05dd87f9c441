//! Health endpoint for orchestration and load balancers.

use actix_web::{get, http::header, web, HttpResponse};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use utoipa::ToSchema;

/// Shared health state. Starts live but not ready; the bootstrap marks it
/// ready once the pool is built and routes are mounted.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so probes fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Return readiness state.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Return liveness state.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// Health payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    /// `"ok"` while the service is live and ready.
    pub status: &'static str,
}

/// Combined probe. Returns 200 with `{"status":"ok"}` while the service is
/// live and ready to take traffic, 503 otherwise.
#[utoipa::path(
    get,
    path = "/api/health",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Service is healthy", body = HealthReport),
        (status = 503, description = "Service is starting or draining")
    )
)]
#[get("/api/health")]
pub async fn health(state: web::Data<HealthState>) -> HttpResponse {
    let healthy = state.is_alive() && state.is_ready();
    let mut response = if healthy {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(HealthReport {
            status: if healthy { "ok" } else { "unavailable" },
        })
}
