//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `PARLOR_LOG_LEVEL`: Filter (z.B. `info` oder `parlor_hub=debug`), Standard: info
//! - `PARLOR_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Umgebungsvariablen haben Vorrang vor der Konfigurationsdatei.
//!
//! Das Level aus der Konfigurationsdatei gilt nur fuer die Parlor-Crates und
//! die HTTP-Traces; hyper, tungstenite und Co. bleiben auf `warn`.

use tracing_subscriber::{fmt, EnvFilter};

/// Targets, die dem konfigurierten Level folgen
const PARLOR_TARGETS: [&str; 6] = [
    "parlor_server",
    "parlor_hub",
    "parlor_protocol",
    "parlor_core",
    "parlor_observability",
    "tower_http",
];

/// Baut die Filter-Direktive fuer ein Level aus der Konfiguration
///
/// `standard_direktive("debug")` ergibt
/// `warn,parlor_server=debug,parlor_hub=debug,...`.
pub fn standard_direktive(level: &str) -> String {
    PARLOR_TARGETS
        .iter()
        .fold(String::from("warn"), |mut direktive, target| {
            direktive.push_str(&format!(",{target}={level}"));
            direktive
        })
}

/// Initialisiert das Logging-System.
///
/// `PARLOR_LOG_LEVEL` wird als vollstaendiger Filter gelesen. Ohne ihn gilt
/// `standard_direktive(level)`, zuletzt `info` fuer die Parlor-Crates.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env("PARLOR_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new(standard_direktive(level)))
        .unwrap_or_else(|_| EnvFilter::new(standard_direktive("info")));

    let format_env = std::env::var("PARLOR_LOG_FORMAT").unwrap_or_else(|_| format.to_string());

    match format_env.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
