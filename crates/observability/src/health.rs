//! Health-Check-Endpunkt fuer Parlor
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime und Verbindungsanzahl

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::ParlorMetrics;

/// Wert von `status`, solange der Prozess Anfragen beantwortet
pub const STATUS_HEALTHY: &str = "healthy";

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub connections: i64,
    pub admin_online: bool,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Arc<Instant>,
    pub metriken: ParlorMetrics,
}

impl HealthState {
    pub fn neu(metriken: ParlorMetrics) -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
            metriken,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Momentaufnahme fuer die Health-Antwort
    pub fn antwort(&self) -> HealthResponse {
        HealthResponse {
            status: STATUS_HEALTHY.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_seconds(),
            connections: self.metriken.connections.get(),
            admin_online: self.metriken.admin_online.get() > 0,
        }
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `GET /health` – gibt den Serverstatus zurueck
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.antwort()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> HealthState {
        HealthState::neu(ParlorMetrics::neu().unwrap())
    }

    #[test]
    fn health_state_frisch() {
        let state = state();
        assert!(state.uptime_seconds() < 5);
    }

    #[test]
    fn antwort_liest_metriken() {
        let state = state();
        state.metriken.connections.set(4);
        state.metriken.admin_online.set(1);

        let antwort = state.antwort();
        assert_eq!(antwort.status, "healthy");
        assert_eq!(antwort.connections, 4);
        assert!(antwort.admin_online);
    }

    #[test]
    fn health_response_serialisierung() {
        let response = HealthResponse {
            status: STATUS_HEALTHY.to_string(),
            version: "0.1.0".to_string(),
            uptime_seconds: 3600,
            connections: 2,
            admin_online: false,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"uptime_seconds\":3600"));
        assert!(json.contains("\"connections\":2"));
        assert!(json.contains("\"admin_online\":false"));
    }

    #[tokio::test]
    async fn health_endpunkt_antwortet_200() {
        let app = health_router(state());
        let antwort = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::OK);
    }
}
