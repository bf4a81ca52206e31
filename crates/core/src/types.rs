//! Gemeinsame Identifikationstypen fuer Parlor
//!
//! IDs verwenden das Newtype-Pattern, damit eine Verbindungs-ID nicht mit
//! einem beliebigen String oder einer anderen UUID verwechselt werden kann.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reservierter Benutzername, der statt einer normalen Registrierung die
/// Admin-Rolle beansprucht
pub const ADMIN_SENTINEL: &str = "001";

/// Opake Verbindungs-ID, vom Transport pro Verbindung vergeben
///
/// Stabil fuer die gesamte Lebensdauer einer Verbindung.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Prueft ob ein angefragter Name die Admin-Rolle beansprucht
pub fn ist_admin_name(name: &str) -> bool {
    name == ADMIN_SENTINEL
}
