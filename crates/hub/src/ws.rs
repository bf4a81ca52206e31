//! WebSocket-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `WsServer` bindet einen TCP-Socket und bedient `GET /ws` via axum.
//! Jede akzeptierte Verbindung bekommt einen eigenen Task mit einer
//! `ClientConnection`. Zusaetzliche Routen (Health, Metriken) koennen vor
//! dem Start angehaengt werden.

use axum::{
    extract::{State, WebSocketUpgrade},
    http::{HeaderValue, Method},
    response::Response,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

use crate::broadcast::EventBroadcaster;
use crate::connection::{ClientConnection, VerbindungsConfig};
use crate::hub::HubHandle;

/// Geteilter Zustand der WebSocket-Route
#[derive(Clone)]
pub struct WsState {
    pub hub: HubHandle,
    pub broadcaster: EventBroadcaster,
    pub config: VerbindungsConfig,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Router mit der Route `GET /ws`
pub fn ws_router(state: WsState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}

/// `GET /ws` – WebSocket-Upgrade
async fn ws_handler(State(state): State<WsState>, ws: WebSocketUpgrade) -> Response {
    let verbindung = ClientConnection::neu(state.hub, state.broadcaster, state.config.clone());
    tracing::debug!(verbindung = %verbindung.verbindung(), "WebSocket-Upgrade");

    let shutdown_rx = state.shutdown_rx;
    ws.max_message_size(state.config.max_nachricht_bytes)
        .on_upgrade(move |socket| verbindung.verarbeiten(socket, shutdown_rx))
}

/// CORS-Layer: leere Liste oder ein Eintrag `*` erlaubt alle Origins
///
/// tower-http lehnt `*` innerhalb einer Origin-Liste mit einem Panic ab.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        return CorsLayer::permissive();
    }
    let erlaubt: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if erlaubt.len() < origins.len() {
        tracing::warn!(
            konfiguriert = origins.len(),
            gueltig = erlaubt.len(),
            "Ungueltige CORS-Origins ignoriert"
        );
    }
    CorsLayer::new()
        .allow_origin(erlaubt)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}

/// WebSocket-Server
///
/// Bindet beim Erstellen, damit Aufrufer (und Tests) die tatsaechliche
/// Adresse kennen, bevor der Server laeuft.
pub struct WsServer {
    listener: TcpListener,
    app: Router,
}

impl WsServer {
    /// Bindet den Listener
    pub async fn binden(bind_addr: &str, app: Router) -> std::io::Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        Ok(Self { listener, app })
    }

    /// Gibt die tatsaechlich gebundene Adresse zurueck
    pub fn lokale_adresse(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Bedient Verbindungen bis `shutdown_rx` ein `true`-Signal empfaengt
    pub async fn starten(self, mut shutdown_rx: watch::Receiver<bool>) -> std::io::Result<()> {
        let adresse = self.listener.local_addr()?;
        tracing::info!(adresse = %adresse, "WebSocket-Server gestartet");

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move {
                while shutdown_rx.changed().await.is_ok() {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
                tracing::info!("WebSocket-Server: Shutdown-Signal empfangen");
            })
            .await?;

        tracing::info!("WebSocket-Server gestoppt");
        Ok(())
    }
}
