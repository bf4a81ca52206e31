//! Router – Namensbasierte Zustellung von Nachrichten und Tipp-Signalen
//!
//! Zustandslose Logik ueber Registry und Broadcaster. Validierungsfehler
//! (Absender ohne Identitaet, leeres Ziel, leere Nachricht) sind stille
//! No-ops; nur ein unbekannter Empfaenger wird dem Absender gemeldet.

use parlor_core::types::ConnectionId;
use parlor_protocol::{Message, SendMessage, ServerEvent, TypingKind};

use crate::broadcast::EventBroadcaster;
use crate::error::RECIPIENT_NOT_FOUND;
use crate::registry::Registry;

/// Warum ein Eingang ohne Ausgabe verworfen wurde
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verwerfgrund {
    /// Absender hat sich nicht identifiziert
    OhneIdentitaet,
    /// Kein Empfaenger angegeben
    LeeresZiel,
    /// Weder Text noch Bild
    LeererInhalt,
}

/// Ergebnis eines Zustellversuchs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Event an den Empfaenger (und bei Nachrichten als Echo an den Absender) eingereiht
    Zugestellt { empfaenger: ConnectionId },
    /// Empfaenger unbekannt
    EmpfaengerNichtGefunden,
    /// Validierungs-No-op
    Verworfen(Verwerfgrund),
}

/// Stellt eine Nachricht zu
///
/// Empfaenger und Absender erhalten dasselbe `receive_message`-Payload.
/// Ist der Empfaenger unbekannt, bekommt nur der Absender `send_error`.
pub fn nachricht_routen(
    registry: &Registry,
    broadcaster: &EventBroadcaster,
    absender: ConnectionId,
    anfrage: SendMessage,
) -> DispatchOutcome {
    let Some(user) = registry.benutzer(&absender) else {
        return DispatchOutcome::Verworfen(Verwerfgrund::OhneIdentitaet);
    };
    if anfrage.to.is_empty() {
        return DispatchOutcome::Verworfen(Verwerfgrund::LeeresZiel);
    }
    if !anfrage.hat_inhalt() {
        return DispatchOutcome::Verworfen(Verwerfgrund::LeererInhalt);
    }

    let bild = anfrage.bild().map(str::to_string);
    let nachricht = Message::jetzt(user.username.clone(), anfrage.to.clone(), anfrage.text, bild);

    match registry.verbindung_nach_name(&anfrage.to) {
        Some(empfaenger) => {
            broadcaster.an_verbindung_senden(
                &empfaenger,
                ServerEvent::ReceiveMessage(nachricht.clone()),
            );
            broadcaster.an_verbindung_senden(&absender, ServerEvent::ReceiveMessage(nachricht));
            tracing::debug!(
                von = %user.username,
                an = %anfrage.to,
                "Nachricht zugestellt"
            );
            DispatchOutcome::Zugestellt { empfaenger }
        }
        None => {
            broadcaster.an_verbindung_senden(
                &absender,
                ServerEvent::SendError(RECIPIENT_NOT_FOUND.to_string()),
            );
            tracing::debug!(
                von = %user.username,
                an = %anfrage.to,
                "Empfaenger nicht gefunden"
            );
            DispatchOutcome::EmpfaengerNichtGefunden
        }
    }
}

/// Leitet ein Tipp-Signal an den Empfaenger weiter
///
/// Best-effort: ein unbekannter Empfaenger wird niemandem gemeldet.
pub fn tipp_signal_routen(
    registry: &Registry,
    broadcaster: &EventBroadcaster,
    absender: ConnectionId,
    an: &str,
    art: TypingKind,
) -> DispatchOutcome {
    let Some(user) = registry.benutzer(&absender) else {
        return DispatchOutcome::Verworfen(Verwerfgrund::OhneIdentitaet);
    };
    if an.is_empty() {
        return DispatchOutcome::Verworfen(Verwerfgrund::LeeresZiel);
    }

    match registry.verbindung_nach_name(an) {
        Some(empfaenger) => {
            broadcaster.an_verbindung_senden(
                &empfaenger,
                ServerEvent::tippen(art, user.username.clone()),
            );
            DispatchOutcome::Zugestellt { empfaenger }
        }
        None => DispatchOutcome::EmpfaengerNichtGefunden,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
