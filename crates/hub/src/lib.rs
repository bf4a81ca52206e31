//! parlor-hub – Verbindungs-Registry und Routing-Hub
//!
//! Dieser Crate implementiert den zentralen Hub von Parlor: die Zuordnung
//! Verbindung -> Benutzer, die Eindeutigkeits- und Admin-Regeln bei der
//! Anmeldung, die namensbasierte Zustellung von Nachrichten und
//! Tipp-Signalen sowie den Roster-Push an den Admin.
//!
//! ## Architektur
//!
//! ```text
//! WsServer (axum, GET /ws)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  ClientEvent            ^ ServerEvent
//!     v                         |
//! HubHandle --mpsc--> Hub-Task (einziger Schreiber)
//!                       |
//!                       +-- Registry          (Verbindung -> Benutzer, Admin-Slot)
//!                       +-- router            (Nachrichten, Tipp-Signale)
//!                       +-- roster            (Benutzerliste an den Admin)
//!                       +-- EventBroadcaster  (Send-Queues aller Verbindungen)
//! ```

pub mod broadcast;
pub mod connection;
pub mod error;
pub mod hub;
pub mod registry;
pub mod roster;
pub mod router;
pub mod ws;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use connection::{ClientConnection, VerbindungsConfig};
pub use error::{HubError, HubResult, IdentityError};
pub use hub::{hub_starten, Hub, HubHandle, HubStatus};
pub use registry::{Registry, UserRecord};
pub use router::DispatchOutcome;
pub use ws::{cors_layer, ws_router, WsServer, WsState};
