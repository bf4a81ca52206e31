//! Roster-Notifier – Push der Benutzerliste an den Admin
//!
//! Nach jeder Registry-Aenderung bekommt der Admin die vollstaendige Liste
//! der Nicht-Admin-Namen. Der Client ersetzt damit seine bisherige Liste.

use parlor_protocol::ServerEvent;

use crate::broadcast::EventBroadcaster;
use crate::registry::Registry;

/// Sendet die aktuelle Benutzerliste an den Admin
///
/// Gibt `false` zurueck wenn kein Admin verbunden ist.
pub fn roster_an_admin_senden(registry: &Registry, broadcaster: &EventBroadcaster) -> bool {
    let Some(admin) = registry.admin() else {
        return false;
    };
    let liste = registry.benutzernamen_ohne_admin();
    tracing::trace!(admin = %admin, anzahl = liste.len(), "Roster an Admin");
    broadcaster.an_verbindung_senden(&admin, ServerEvent::UpdateUsersList(liste))
}
