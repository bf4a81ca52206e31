//! parlor-server – Bibliotheks-Root
//!
//! Verdrahtet Hub, WebSocket-Listener und Observability und stellt den
//! oeffentlichen Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use anyhow::{Context, Result};
use axum::Router;
use config::ServerConfig;
use parlor_hub::{
    cors_layer, hub_starten, ws_router, EventBroadcaster, Hub, HubHandle, WsServer, WsState,
};
use parlor_observability::{observability_router, request_timing_layer, ParlorMetrics};
use std::net::SocketAddr;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Haelt den Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

/// Ein gebundener, noch nicht laufender Server
pub struct GebundenerServer {
    ws_server: WsServer,
    hub: HubHandle,
    hub_task: JoinHandle<()>,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Hub-Task und bindet den Listener
    ///
    /// `shutdown_rx` wird an alle Verbindungs-Tasks weitergereicht.
    pub async fn binden(self, shutdown_rx: watch::Receiver<bool>) -> Result<GebundenerServer> {
        let metriken = ParlorMetrics::neu().context("Metriken-Initialisierung fehlgeschlagen")?;
        let broadcaster = EventBroadcaster::neu();
        let hub = Hub::neu(broadcaster.clone(), metriken.clone());
        let (hub_handle, hub_task) = hub_starten(hub, self.config.hub.befehl_queue_groesse);

        let ws_state = WsState {
            hub: hub_handle.clone(),
            broadcaster,
            config: self.config.verbindungs_config(),
            shutdown_rx,
        };

        let mut app = Router::new().merge(ws_router(ws_state));
        if self.config.observability.aktiviert {
            app = app.merge(observability_router(metriken));
        }
        let app = app
            .layer(request_timing_layer())
            .layer(cors_layer(&self.config.netzwerk.cors_origins));

        let bind_adresse = self.config.bind_adresse();
        let ws_server = WsServer::binden(&bind_adresse, app)
            .await
            .with_context(|| format!("Bind auf {bind_adresse} fehlgeschlagen"))?;

        Ok(GebundenerServer {
            ws_server,
            hub: hub_handle,
            hub_task,
        })
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal (Ctrl-C)
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            adresse = %self.config.bind_adresse(),
            cors_origins = ?self.config.netzwerk.cors_origins,
            "Server startet"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = self.binden(shutdown_rx.clone()).await?;

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown-Signal empfangen, Server wird beendet"),
                Err(e) => tracing::error!(fehler = %e, "Ctrl-C-Handler fehlgeschlagen"),
            }
            let _ = shutdown_tx.send(true);
        });

        server.laufen(shutdown_rx).await
    }
}

impl GebundenerServer {
    /// Tatsaechlich gebundene Adresse (relevant bei Port 0)
    pub fn lokale_adresse(&self) -> Result<SocketAddr> {
        Ok(self.ws_server.lokale_adresse()?)
    }

    /// Handle auf den Hub, z.B. fuer Status-Abfragen
    pub fn hub(&self) -> HubHandle {
        self.hub.clone()
    }

    /// Bedient Verbindungen bis zum Shutdown-Signal
    pub async fn laufen(self, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        let Self {
            ws_server,
            hub,
            hub_task,
        } = self;

        ws_server.starten(shutdown_rx).await?;

        // Hub endet, sobald keine Handles mehr existieren
        drop(hub);
        if let Err(e) = hub_task.await {
            tracing::warn!(fehler = %e, "Hub-Task nicht sauber beendet");
        }
        Ok(())
    }
}
