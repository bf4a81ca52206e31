//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. Die Umgebungsvariable `PORT` ueberschreibt den Port.

use parlor_core::ParlorError;
use parlor_hub::VerbindungsConfig;
use parlor_observability::logging::{log_format_gueltig, log_level_gueltig};
use serde::{Deserialize, Serialize};

/// Standard-Port, wenn weder Datei noch `PORT` etwas anderes sagen
pub const STANDARD_PORT: u16 = 3001;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Einstellungen pro WebSocket-Verbindung
    pub verbindung: VerbindungsEinstellungen,
    /// Hub-Einstellungen
    pub hub: HubEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer HTTP/WebSocket
    pub bind_adresse: String,
    /// Port fuer HTTP/WebSocket
    pub port: u16,
    /// CORS-Origins (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: STANDARD_PORT,
            cors_origins: vec![],
        }
    }
}

/// Einstellungen pro WebSocket-Verbindung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungsEinstellungen {
    /// Ping-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Trennen nach so vielen Sekunden ohne Frame
    pub timeout_sek: u64,
    /// Maximale Frame-Groesse (Bilder kommen base64-kodiert)
    pub max_nachricht_bytes: usize,
}

impl Default for VerbindungsEinstellungen {
    fn default() -> Self {
        let standard = VerbindungsConfig::default();
        Self {
            keepalive_sek: standard.keepalive_sek,
            timeout_sek: standard.timeout_sek,
            max_nachricht_bytes: standard.max_nachricht_bytes,
        }
    }
}

/// Hub-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubEinstellungen {
    /// Groesse der Befehls-Queue zum Hub-Task
    pub befehl_queue_groesse: usize,
}

impl Default for HubEinstellungen {
    fn default() -> Self {
        Self {
            befehl_queue_groesse: 1024,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Haengt `/metrics` und `/health` an den WebSocket-Port
    pub aktiviert: bool,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self { aktiviert: true }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Wendet einen `PORT`-Override an (Wert aus der Umgebung)
    pub fn port_ueberschreiben(&mut self, port: Option<&str>) -> Result<(), ParlorError> {
        if let Some(wert) = port {
            self.netzwerk.port = wert
                .trim()
                .parse()
                .map_err(|_| ParlorError::Konfiguration(format!("PORT ungueltig: '{wert}'")))?;
        }
        Ok(())
    }

    /// Prueft Werte, die serde allein nicht abfangen kann
    pub fn validieren(&self) -> Result<(), ParlorError> {
        if !log_level_gueltig(&self.logging.level) {
            return Err(ParlorError::Konfiguration(format!(
                "logging.level ungueltig: '{}'",
                self.logging.level
            )));
        }
        if !log_format_gueltig(&self.logging.format) {
            return Err(ParlorError::Konfiguration(format!(
                "logging.format ungueltig: '{}'",
                self.logging.format
            )));
        }
        if self.verbindung.keepalive_sek == 0 || self.verbindung.timeout_sek == 0 {
            return Err(ParlorError::Konfiguration(
                "verbindung.keepalive_sek und timeout_sek muessen groesser 0 sein".into(),
            ));
        }
        if self.verbindung.timeout_sek <= self.verbindung.keepalive_sek {
            return Err(ParlorError::Konfiguration(format!(
                "verbindung.timeout_sek ({}) muss groesser als keepalive_sek ({}) sein",
                self.verbindung.timeout_sek, self.verbindung.keepalive_sek
            )));
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Einstellungen fuer die Verbindungs-Tasks
    pub fn verbindungs_config(&self) -> VerbindungsConfig {
        VerbindungsConfig {
            keepalive_sek: self.verbindung.keepalive_sek,
            timeout_sek: self.verbindung.timeout_sek,
            max_nachricht_bytes: self.verbindung.max_nachricht_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.netzwerk.port, 3001);
        assert!(cfg.netzwerk.cors_origins.is_empty());
        assert_eq!(cfg.hub.befehl_queue_groesse, 1024);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.observability.aktiviert);
    }

    #[test]
    fn bind_adresse() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_adresse(), "0.0.0.0:3001");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [netzwerk]
            port = 8080
            cors_origins = ["http://localhost:5173"]

            [verbindung]
            timeout_sek = 10
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.netzwerk.port, 8080);
        assert_eq!(cfg.netzwerk.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(cfg.verbindung.timeout_sek, 10);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.netzwerk.bind_adresse, "0.0.0.0");
        assert_eq!(cfg.verbindung.keepalive_sek, 25);
    }

    #[test]
    fn port_override() {
        let mut cfg = ServerConfig::default();
        cfg.port_ueberschreiben(Some("4000")).unwrap();
        assert_eq!(cfg.netzwerk.port, 4000);

        cfg.port_ueberschreiben(None).unwrap();
        assert_eq!(cfg.netzwerk.port, 4000);
    }

    #[test]
    fn ungueltiger_port_ist_fehler() {
        let mut cfg = ServerConfig::default();
        let err = cfg.port_ueberschreiben(Some("abc")).unwrap_err();
        assert!(matches!(err, ParlorError::Konfiguration(_)));
        assert_eq!(cfg.netzwerk.port, 3001);
    }

    #[test]
    fn validierung() {
        assert!(ServerConfig::default().validieren().is_ok());

        let mut cfg = ServerConfig::default();
        cfg.logging.format = "xml".into();
        assert!(cfg.validieren().is_err());

        let mut cfg = ServerConfig::default();
        cfg.verbindung.keepalive_sek = 0;
        assert!(cfg.validieren().is_err());

        // Frist darf nicht vor dem ersten Ping ablaufen
        let mut cfg = ServerConfig::default();
        cfg.verbindung.keepalive_sek = 1;
        cfg.verbindung.timeout_sek = 1;
        let err = cfg.validieren().unwrap_err();
        assert!(matches!(err, ParlorError::Konfiguration(_)));

        cfg.verbindung.timeout_sek = 3;
        assert!(cfg.validieren().is_ok());
    }

    #[test]
    fn fehlende_datei_gibt_standard() {
        let cfg = ServerConfig::laden("/nicht/vorhanden/parlor.toml").unwrap();
        assert_eq!(cfg.netzwerk.port, 3001);
    }
}
