//! Chat-Nachricht (transient, wird nie gespeichert)

use serde::{Deserialize, Serialize};

/// Eine zugestellte Nachricht
///
/// Wird pro Sendevorgang gebaut und identisch an Empfaenger und Absender
/// (Echo) ausgeliefert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    /// Darf leer sein, wenn ein Bild mitgeschickt wird
    pub text: String,
    /// Bild als Text-Payload (z.B. base64 Data-URL)
    pub image: Option<String>,
    /// Anzeigezeit im Format `HH:MM`
    pub time: String,
}

impl Message {
    /// Baut eine Nachricht mit der aktuellen lokalen Uhrzeit
    pub fn jetzt(
        from: impl Into<String>,
        to: impl Into<String>,
        text: impl Into<String>,
        image: Option<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            text: text.into(),
            image,
            time: anzeige_uhrzeit(chrono::Local::now()),
        }
    }
}

/// Formatiert einen Zeitpunkt als zweistellige Stunde:Minute
pub fn anzeige_uhrzeit<Tz: chrono::TimeZone>(zeitpunkt: chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    zeitpunkt.format("%H:%M").to_string()
}
