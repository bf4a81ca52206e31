//! # parlor-observability
//!
//! Observability-Crate fuer Parlor:
//! - Prometheus-kompatible Metriken (`/metrics`)
//! - Health-Check-Endpunkt (`/health`)
//! - Structured Logging via tracing-subscriber
//! - Request-Timing Middleware

pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;

pub use health::{health_router, HealthResponse, HealthState};
pub use logging::logging_initialisieren;
pub use metrics::{metrics_router, ParlorMetrics};
pub use middleware::{request_timing_layer, timing_middleware};

use axum::Router;

/// Baut den Observability-Router (Metriken + Health)
///
/// Endpunkte:
/// - `GET /metrics` – Prometheus scrape format
/// - `GET /health`  – Health-Check JSON
pub fn observability_router(metriken: ParlorMetrics) -> Router {
    let health = HealthState::neu(metriken.clone());
    Router::new()
        .merge(metrics_router(metriken.clone()))
        .merge(health_router(health))
        .layer(axum::middleware::from_fn_with_state(metriken, timing_middleware))
}
