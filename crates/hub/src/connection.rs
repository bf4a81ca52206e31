//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede WebSocket-Verbindung bekommt eine `ClientConnection` in einem
//! eigenen tokio-Task. Der Task dekodiert Frames, reicht sie an den Hub
//! weiter und schreibt die Events aus seiner Broadcaster-Queue zurueck.
//!
//! ## Zustaende
//! ```text
//! Verbunden (ohne Identitaet) -> Identifiziert (Admin | Benutzer)
//!        |                              |
//!        +--------> Getrennt <----------+
//! ```
//! Der Identitaetszustand lebt in der Registry des Hubs; dieser Task kennt
//! nur seine Verbindungs-ID.
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen WebSocket-Ping
//! - Kommt laenger als `timeout_sek` kein Frame (Pongs zaehlen mit), wird
//!   genau nach dieser Frist getrennt
//! - `timeout_sek` muss groesser als `keepalive_sek` sein, sonst trifft die
//!   Frist einen ruhigen Client, bevor er einen Ping beantworten konnte

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use parlor_core::types::ConnectionId;
use parlor_protocol::{ClientEvent, ServerEvent};
use std::time::Duration;
use tokio::time::Instant;
use tokio::sync::watch;

use crate::broadcast::EventBroadcaster;
use crate::error::{HubError, HubResult};
use crate::hub::HubHandle;

/// Close-Code "Going Away" (RFC 6455)
const CLOSE_GOING_AWAY: u16 = 1001;

/// Konfiguration pro Verbindung
#[derive(Debug, Clone)]
pub struct VerbindungsConfig {
    /// Ping-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer stille Verbindungen in Sekunden
    pub timeout_sek: u64,
    /// Maximale Groesse eines eingehenden Frames
    pub max_nachricht_bytes: usize,
}

impl Default for VerbindungsConfig {
    fn default() -> Self {
        Self {
            keepalive_sek: 25,
            timeout_sek: 60,
            max_nachricht_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Warum die Schleife einer Verbindung endete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trennungsgrund {
    ClientGeschlossen,
    Timeout,
    Shutdown,
    Fehler,
}

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientConnection {
    verbindung: ConnectionId,
    hub: HubHandle,
    broadcaster: EventBroadcaster,
    config: VerbindungsConfig,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection mit frischer Verbindungs-ID
    pub fn neu(hub: HubHandle, broadcaster: EventBroadcaster, config: VerbindungsConfig) -> Self {
        Self {
            verbindung: ConnectionId::new(),
            hub,
            broadcaster,
            config,
        }
    }

    pub fn verbindung(&self) -> ConnectionId {
        self.verbindung
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis der Client trennt, der Timeout greift oder ein
    /// Shutdown-Signal eingeht. Danach wird der Hub immer informiert.
    pub async fn verarbeiten(self, mut socket: WebSocket, mut shutdown_rx: watch::Receiver<bool>) {
        let verbindung = self.verbindung;
        let keepalive_intervall = Duration::from_secs(self.config.keepalive_sek.max(1));
        let timeout_dauer = Duration::from_secs(self.config.timeout_sek.max(1));

        // Queue registrieren, bevor der Hub das erste Event dieser Verbindung sieht
        let mut sende_rx = self.broadcaster.verbindung_registrieren(verbindung);
        tracing::info!(verbindung = %verbindung, "Neue Verbindung");

        let mut letzter_empfang = Instant::now();
        let mut ping = tokio::time::interval_at(
            Instant::now() + keepalive_intervall,
            keepalive_intervall,
        );

        let grund = loop {
            tokio::select! {
                // Eingehender Frame vom Client
                frame = socket.recv() => {
                    let nachricht = match frame {
                        Some(Ok(n)) => n,
                        Some(Err(e)) => {
                            tracing::warn!(verbindung = %verbindung, fehler = %e, "WebSocket-Lesefehler");
                            break Trennungsgrund::Fehler;
                        }
                        None => break Trennungsgrund::ClientGeschlossen,
                    };
                    letzter_empfang = Instant::now();

                    match nachricht {
                        Message::Text(text) => {
                            if let Err(e) = self.frame_weiterreichen(&text).await {
                                tracing::error!(verbindung = %verbindung, fehler = %e, "Hub nicht erreichbar");
                                break Trennungsgrund::Fehler;
                            }
                        }
                        Message::Binary(_) => {
                            tracing::warn!(verbindung = %verbindung, "Binaerframe ignoriert");
                        }
                        Message::Close(_) => break Trennungsgrund::ClientGeschlossen,
                        // Pong beantwortet axum selbst, beides zaehlt nur als Lebenszeichen
                        Message::Ping(_) | Message::Pong(_) => {}
                    }
                }

                // Ausgehendes Event aus dem Broadcaster
                Some(event) = sende_rx.recv() => {
                    if let Err(e) = event_senden(&mut socket, &event).await {
                        tracing::warn!(
                            verbindung = %verbindung,
                            event = event.name(),
                            fehler = %e,
                            "Senden fehlgeschlagen"
                        );
                        break Trennungsgrund::Fehler;
                    }
                }

                // Keepalive-Ping
                _ = ping.tick() => {
                    if socket.send(Message::Ping(Vec::new())).await.is_err() {
                        break Trennungsgrund::Fehler;
                    }
                }

                // Frist seit dem letzten empfangenen Frame
                _ = tokio::time::sleep_until(letzter_empfang + timeout_dauer) => {
                    tracing::warn!(verbindung = %verbindung, "Verbindungs-Timeout");
                    break Trennungsgrund::Timeout;
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break Trennungsgrund::Shutdown;
                    }
                }
            }
        };

        if matches!(grund, Trennungsgrund::Timeout | Trennungsgrund::Shutdown) {
            let abschied = CloseFrame {
                code: CLOSE_GOING_AWAY,
                reason: "Server trennt Verbindung".into(),
            };
            let _ = socket.send(Message::Close(Some(abschied))).await;
        }

        // Cleanup laeuft unabhaengig davon, warum die Schleife endete
        if let Err(e) = self.hub.getrennt(verbindung).await {
            tracing::warn!(verbindung = %verbindung, fehler = %e, "Trennung nicht an Hub gemeldet");
            self.broadcaster.verbindung_entfernen(&verbindung);
        }

        tracing::info!(verbindung = %verbindung, grund = ?grund, "Verbindung beendet");
    }

    /// Dekodiert einen Textframe und reicht ihn an den Hub weiter
    ///
    /// Undekodierbare Frames werden geloggt und verworfen; nur ein nicht
    /// erreichbarer Hub ist ein Fehler.
    async fn frame_weiterreichen(&self, text: &str) -> HubResult<()> {
        match ClientEvent::from_json(text) {
            Ok(event) => self.hub.eingang(self.verbindung, event).await,
            Err(e) if e.ist_client_fehler() => {
                tracing::warn!(verbindung = %self.verbindung, fehler = %e, "Ungueltiger Frame ignoriert");
                Ok(())
            }
            Err(e) => Err(HubError::Protokoll(e)),
        }
    }
}

/// Serialisiert ein Event und schreibt es als Textframe
async fn event_senden(socket: &mut WebSocket, event: &ServerEvent) -> HubResult<()> {
    let json = event.to_json()?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config() {
        let cfg = VerbindungsConfig::default();
        assert_eq!(cfg.keepalive_sek, 25);
        assert_eq!(cfg.timeout_sek, 60);
        assert_eq!(cfg.max_nachricht_bytes, 10 * 1024 * 1024);
    }
}
