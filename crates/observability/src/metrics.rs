//! Prometheus-kompatible Metriken fuer Parlor
//!
//! Registrierte Metriken:
//! - `parlor_connections` – Gauge: Offene WebSocket-Verbindungen
//! - `parlor_identified_users` – Gauge: Identifizierte Verbindungen (inkl. Admin)
//! - `parlor_admin_online` – Gauge: 1 wenn ein Admin verbunden ist
//! - `parlor_identity_rejections_total` – Counter: Abgelehnte Identitaeten (grund)
//! - `parlor_messages_routed_total` – Counter: Zugestellte Nachrichten
//! - `parlor_send_errors_total` – Counter: Nachrichten an unbekannte Empfaenger
//! - `parlor_typing_signals_total` – Counter: Zugestellte Tipp-Signale
//! - `parlor_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit

use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Alle Parlor-Prometheus-Metriken
///
/// Clone teilt die Registry und alle Zaehler.
#[derive(Clone)]
pub struct ParlorMetrics {
    pub registry: Arc<Registry>,

    // Hub-Metriken
    pub connections: IntGauge,
    pub identified_users: IntGauge,
    pub admin_online: IntGauge,
    pub identity_rejections_total: IntCounterVec,
    pub messages_routed_total: IntCounter,
    pub send_errors_total: IntCounter,
    pub typing_signals_total: IntCounter,

    // HTTP-Metriken
    pub http_request_duration_seconds: HistogramVec,
}

impl ParlorMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let connections = IntGauge::with_opts(Opts::new(
            "parlor_connections",
            "Anzahl offener WebSocket-Verbindungen",
        ))?;
        registry.register(Box::new(connections.clone()))?;

        let identified_users = IntGauge::with_opts(Opts::new(
            "parlor_identified_users",
            "Anzahl identifizierter Verbindungen",
        ))?;
        registry.register(Box::new(identified_users.clone()))?;

        let admin_online = IntGauge::with_opts(Opts::new(
            "parlor_admin_online",
            "1 wenn ein Admin verbunden ist, sonst 0",
        ))?;
        registry.register(Box::new(admin_online.clone()))?;

        let identity_rejections_total = IntCounterVec::new(
            Opts::new(
                "parlor_identity_rejections_total",
                "Abgelehnte Identitaets-Ansprueche",
            ),
            &["grund"],
        )?;
        registry.register(Box::new(identity_rejections_total.clone()))?;

        let messages_routed_total = IntCounter::with_opts(Opts::new(
            "parlor_messages_routed_total",
            "Zugestellte Nachrichten",
        ))?;
        registry.register(Box::new(messages_routed_total.clone()))?;

        let send_errors_total = IntCounter::with_opts(Opts::new(
            "parlor_send_errors_total",
            "Nachrichten an nicht gefundene Empfaenger",
        ))?;
        registry.register(Box::new(send_errors_total.clone()))?;

        let typing_signals_total = IntCounter::with_opts(Opts::new(
            "parlor_typing_signals_total",
            "Zugestellte Tipp-Signale",
        ))?;
        registry.register(Box::new(typing_signals_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "parlor_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connections,
            identified_users,
            admin_online,
            identity_rejections_total,
            messages_routed_total,
            send_errors_total,
            typing_signals_total,
            http_request_duration_seconds,
        })
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: ParlorMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<ParlorMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = ParlorMetrics::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
    }

    #[test]
    fn gauges_setzen() {
        let metriken = ParlorMetrics::neu().unwrap();
        metriken.connections.set(3);
        metriken.admin_online.set(1);
        assert_eq!(metriken.connections.get(), 3);
        assert_eq!(metriken.admin_online.get(), 1);
    }

    #[test]
    fn ablehnungen_mit_labels() {
        let metriken = ParlorMetrics::neu().unwrap();
        metriken
            .identity_rejections_total
            .with_label_values(&["name_taken"])
            .inc();
        let wert = metriken
            .identity_rejections_total
            .with_label_values(&["name_taken"])
            .get();
        assert_eq!(wert, 1);
    }

    #[test]
    fn clone_teilt_zaehler() {
        let m1 = ParlorMetrics::neu().unwrap();
        let m2 = m1.clone();
        m1.messages_routed_total.inc();
        assert_eq!(m2.messages_routed_total.get(), 1);
    }

    #[test]
    fn metriken_export_prometheus_format() {
        let metriken = ParlorMetrics::neu().unwrap();
        metriken.connections.set(5);
        metriken.messages_routed_total.inc();

        let output = metriken.exportieren().unwrap();
        assert!(output.contains("parlor_connections 5"));
        assert!(output.contains("parlor_messages_routed_total 1"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }
}
