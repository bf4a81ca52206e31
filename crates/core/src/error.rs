//! Fehlertypen fuer Parlor
//!
//! Zentraler Fehler-Enum fuer alles, was nicht in einen spezifischeren
//! Crate-Fehler gehoert. Crate-Fehler nehmen ihn via `#[from]` auf.

use thiserror::Error;

/// Globaler Result-Alias fuer Parlor
pub type Result<T> = std::result::Result<T, ParlorError>;

/// Alle crate-uebergreifenden Fehler im Parlor-System
#[derive(Debug, Error)]
pub enum ParlorError {
    // --- Protokoll ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    #[error("Unbekanntes Event: {0}")]
    UnbekanntesEvent(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),
}

impl ParlorError {
    /// Gibt true zurueck wenn der Fehler vom Client verursacht wurde und die
    /// Verbindung weiterlaufen darf
    pub fn ist_client_fehler(&self) -> bool {
        matches!(self, Self::UngueltigeNachricht(_) | Self::UnbekanntesEvent(_))
    }
}

impl From<serde_json::Error> for ParlorError {
    fn from(e: serde_json::Error) -> Self {
        Self::UngueltigeNachricht(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = ParlorError::Konfiguration("PORT ungueltig".into());
        assert_eq!(e.to_string(), "Konfigurationsfehler: PORT ungueltig");
    }

    #[test]
    fn client_fehler_erkennung() {
        assert!(ParlorError::UngueltigeNachricht("x".into()).ist_client_fehler());
        assert!(ParlorError::UnbekanntesEvent("x".into()).ist_client_fehler());
        assert!(!ParlorError::Konfiguration("x".into()).ist_client_fehler());
    }

    #[test]
    fn serde_fehler_wird_ungueltige_nachricht() {
        let serde_fehler = serde_json::from_str::<u32>("kein json").unwrap_err();
        let e: ParlorError = serde_fehler.into();
        assert!(matches!(e, ParlorError::UngueltigeNachricht(_)));
    }
}
