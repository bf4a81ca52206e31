//! Fehlertypen fuer den Hub

use parlor_core::ParlorError;
use thiserror::Error;

/// Ablehnungsgrund fuer einen Identitaets-Anspruch
///
/// Der `Display`-Text geht unveraendert als `identity_error` an den Client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Name fehlt oder ist leer
    #[error("Username is required")]
    EmptyName,

    /// Ein anderer Benutzer traegt diesen Namen bereits
    #[error("Username already taken")]
    NameTaken,

    /// Es ist bereits ein Admin verbunden
    #[error("Admin already connected")]
    AdminAlreadyConnected,

    /// Die Verbindung hat sich bereits identifiziert
    #[error("Identity already set")]
    AlreadyIdentified,
}

impl IdentityError {
    /// Kurzer Label-Wert fuer Metriken
    pub fn grund(&self) -> &'static str {
        match self {
            Self::EmptyName => "empty_name",
            Self::NameTaken => "name_taken",
            Self::AdminAlreadyConnected => "admin_already_connected",
            Self::AlreadyIdentified => "already_identified",
        }
    }
}

/// Grund fuer `send_error` an den Absender
pub const RECIPIENT_NOT_FOUND: &str = "Recipient not found";

/// Fehlertyp fuer Hub und Transport
#[derive(Debug, Error)]
pub enum HubError {
    /// Protokollfehler (ungueltiger Frame)
    #[error(transparent)]
    Protokoll(#[from] ParlorError),

    /// WebSocket-Fehler
    #[error("WebSocket-Fehler: {0}")]
    WebSocket(#[from] axum::Error),

    /// Der Hub-Task laeuft nicht mehr
    #[error("Hub beendet")]
    HubBeendet,
}

/// Result-Typ fuer den Hub
pub type HubResult<T> = Result<T, HubError>;
