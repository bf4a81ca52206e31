//! Hub – Besitzer der Registry und einziger Schreiber
//!
//! Der `Hub` verarbeitet ein Event nach dem anderen synchron bis zum Ende.
//! `hub_starten` verschiebt ihn in einen eigenen tokio-Task, der eine
//! Befehls-Queue abarbeitet; Verbindungs-Tasks halten nur ein `HubHandle`.
//!
//! ```text
//! ClientConnection --HubBefehl--> HubTask (Hub: Registry + Broadcaster)
//!        ^                                 |
//!        +------ ServerEvent (Queue) ------+
//! ```

use parlor_core::types::ConnectionId;
use parlor_observability::ParlorMetrics;
use parlor_protocol::{ClientEvent, SendMessage, ServerEvent, TypingKind};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::broadcast::EventBroadcaster;
use crate::error::{HubError, HubResult, IdentityError};
use crate::registry::{Registry, UserRecord};
use crate::roster::roster_an_admin_senden;
use crate::router::{nachricht_routen, tipp_signal_routen, DispatchOutcome};

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

/// Momentaufnahme des Hub-Zustands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubStatus {
    /// Offene Verbindungen, auch ohne Identitaet
    pub verbindungen: usize,
    /// Identifizierte Verbindungen inkl. Admin
    pub benutzer: usize,
    pub admin_online: bool,
}

/// Verbindungs-Registry plus Routing-Logik
pub struct Hub {
    registry: Registry,
    broadcaster: EventBroadcaster,
    metriken: ParlorMetrics,
}

impl Hub {
    /// Erstellt einen Hub mit leerer Registry
    pub fn neu(broadcaster: EventBroadcaster, metriken: ParlorMetrics) -> Self {
        Self {
            registry: Registry::neu(),
            broadcaster,
            metriken,
        }
    }

    /// Verarbeitet ein eingehendes Client-Event
    pub fn eingang_verarbeiten(&mut self, verbindung: ConnectionId, event: ClientEvent) {
        tracing::trace!(verbindung = %verbindung, event = event.name(), "Eingang");
        match event {
            ClientEvent::SetIdentity(claim) => {
                let _ = self.identitaet_beanspruchen(verbindung, &claim.name);
            }
            ClientEvent::SendMessage(anfrage) => {
                self.nachricht_senden(verbindung, anfrage);
            }
            ClientEvent::Typing(ziel) => {
                self.tipp_signal(verbindung, &ziel.to, TypingKind::Typing);
            }
            ClientEvent::StopTyping(ziel) => {
                self.tipp_signal(verbindung, &ziel.to, TypingKind::StopTyping);
            }
        }
    }

    /// Identitaets-Anspruch einer Verbindung
    ///
    /// Erfolg: `identity_ok` an den Anspruchsteller, danach Roster an den Admin.
    /// Fehler: `identity_error` nur an den Anspruchsteller, Registry unveraendert.
    pub fn identitaet_beanspruchen(
        &mut self,
        verbindung: ConnectionId,
        name: &str,
    ) -> Result<UserRecord, IdentityError> {
        match self.registry.identitaet_beanspruchen(verbindung, name) {
            Ok(user) => {
                if user.is_admin {
                    tracing::info!(verbindung = %verbindung, "Admin angemeldet");
                } else {
                    tracing::info!(verbindung = %verbindung, username = %user.username, "Benutzer registriert");
                }
                self.broadcaster
                    .an_verbindung_senden(&verbindung, ServerEvent::identity_ok(&user.username));
                self.roster_aktualisieren();
                Ok(user)
            }
            Err(e) => {
                tracing::debug!(verbindung = %verbindung, name = %name, grund = e.grund(), "Identitaet abgelehnt");
                self.metriken
                    .identity_rejections_total
                    .with_label_values(&[e.grund()])
                    .inc();
                self.broadcaster
                    .an_verbindung_senden(&verbindung, ServerEvent::IdentityError(e.to_string()));
                Err(e)
            }
        }
    }

    /// Stellt eine Nachricht zu (siehe `router::nachricht_routen`)
    pub fn nachricht_senden(
        &mut self,
        verbindung: ConnectionId,
        anfrage: SendMessage,
    ) -> DispatchOutcome {
        let ergebnis = nachricht_routen(&self.registry, &self.broadcaster, verbindung, anfrage);
        match ergebnis {
            DispatchOutcome::Zugestellt { .. } => self.metriken.messages_routed_total.inc(),
            DispatchOutcome::EmpfaengerNichtGefunden => self.metriken.send_errors_total.inc(),
            DispatchOutcome::Verworfen(grund) => {
                tracing::debug!(verbindung = %verbindung, grund = ?grund, "Nachricht verworfen");
            }
        }
        ergebnis
    }

    /// Leitet ein Tipp-Signal weiter (siehe `router::tipp_signal_routen`)
    pub fn tipp_signal(
        &mut self,
        verbindung: ConnectionId,
        an: &str,
        art: TypingKind,
    ) -> DispatchOutcome {
        let ergebnis = tipp_signal_routen(&self.registry, &self.broadcaster, verbindung, an, art);
        if matches!(ergebnis, DispatchOutcome::Zugestellt { .. }) {
            self.metriken.typing_signals_total.inc();
        }
        ergebnis
    }

    /// Verbindung wurde getrennt
    ///
    /// Entfernt Registry- und Broadcaster-Eintrag. Ging der Admin, erhalten
    /// alle verbleibenden Verbindungen `admin_disconnected`. Der Roster wird
    /// in jedem Fall neu gesendet.
    pub fn verbindung_getrennt(&mut self, verbindung: ConnectionId) -> Option<UserRecord> {
        self.broadcaster.verbindung_entfernen(&verbindung);
        let entfernt = self.registry.entfernen(&verbindung);

        match &entfernt {
            Some(user) if user.is_admin => {
                tracing::info!(verbindung = %verbindung, "Admin getrennt");
                let erreicht = self.broadcaster.an_alle_senden(ServerEvent::AdminDisconnected);
                tracing::debug!(erreicht, "admin_disconnected verteilt");
            }
            Some(user) => {
                tracing::info!(verbindung = %verbindung, username = %user.username, "Benutzer getrennt");
            }
            None => {
                tracing::debug!(verbindung = %verbindung, "Verbindung ohne Identitaet getrennt");
            }
        }

        self.roster_aktualisieren();
        entfernt
    }

    /// Roster an den Admin senden und Gauges nachziehen
    fn roster_aktualisieren(&self) {
        roster_an_admin_senden(&self.registry, &self.broadcaster);
        self.metriken
            .identified_users
            .set(self.registry.anzahl() as i64);
        self.metriken
            .admin_online
            .set(i64::from(self.registry.admin().is_some()));
        self.metriken
            .connections
            .set(self.broadcaster.verbindung_anzahl() as i64);
    }

    /// Momentaufnahme fuer Status-Abfragen
    pub fn status(&self) -> HubStatus {
        HubStatus {
            verbindungen: self.broadcaster.verbindung_anzahl(),
            benutzer: self.registry.anzahl(),
            admin_online: self.registry.admin().is_some(),
        }
    }

    /// Lesezugriff auf die Registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

// ---------------------------------------------------------------------------
// Hub-Task
// ---------------------------------------------------------------------------

/// Befehle an den Hub-Task
#[derive(Debug)]
pub enum HubBefehl {
    /// Eingehendes Client-Event
    Eingang {
        verbindung: ConnectionId,
        event: ClientEvent,
    },
    /// Verbindung wurde getrennt (egal aus welchem Grund)
    Getrennt { verbindung: ConnectionId },
    /// Status-Abfrage
    Status { antwort: oneshot::Sender<HubStatus> },
}

/// Cloneable Handle auf den laufenden Hub-Task
#[derive(Clone, Debug)]
pub struct HubHandle {
    tx: mpsc::Sender<HubBefehl>,
}

impl HubHandle {
    /// Reicht ein Client-Event ein
    pub async fn eingang(&self, verbindung: ConnectionId, event: ClientEvent) -> HubResult<()> {
        self.senden(HubBefehl::Eingang { verbindung, event }).await
    }

    /// Meldet eine getrennte Verbindung
    pub async fn getrennt(&self, verbindung: ConnectionId) -> HubResult<()> {
        self.senden(HubBefehl::Getrennt { verbindung }).await
    }

    /// Fragt den aktuellen Hub-Status ab
    pub async fn status(&self) -> HubResult<HubStatus> {
        let (antwort, rx) = oneshot::channel();
        self.senden(HubBefehl::Status { antwort }).await?;
        rx.await.map_err(|_| HubError::HubBeendet)
    }

    async fn senden(&self, befehl: HubBefehl) -> HubResult<()> {
        self.tx.send(befehl).await.map_err(|_| HubError::HubBeendet)
    }
}

/// Startet den Hub in einem eigenen Task
///
/// Der Task endet, sobald alle `HubHandle`s gedroppt sind.
pub fn hub_starten(hub: Hub, queue_groesse: usize) -> (HubHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(queue_groesse.max(1));
    let task = tokio::spawn(hub_schleife(hub, rx));
    (HubHandle { tx }, task)
}

async fn hub_schleife(mut hub: Hub, mut rx: mpsc::Receiver<HubBefehl>) {
    tracing::debug!("Hub-Task gestartet");
    while let Some(befehl) = rx.recv().await {
        match befehl {
            HubBefehl::Eingang { verbindung, event } => hub.eingang_verarbeiten(verbindung, event),
            HubBefehl::Getrennt { verbindung } => {
                hub.verbindung_getrennt(verbindung);
            }
            HubBefehl::Status { antwort } => {
                let _ = antwort.send(hub.status());
            }
        }
    }
    tracing::debug!("Hub-Task beendet");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
