//! Registry – Verbindung -> Benutzer
//!
//! Die autoritative Zuordnung von Verbindungs-IDs zu Benutzern plus der
//! einzelne Admin-Slot. Nur der Hub mutiert die Registry.
//!
//! ## Invarianten
//! - Hoechstens ein Eintrag ist Admin, und `admin` zeigt genau auf ihn.
//! - Namen von Nicht-Admins sind paarweise verschieden (case-sensitiv).
//! - `namen` enthaelt genau die Nicht-Admin-Eintraege von `eintraege`.

use parlor_core::types::{ist_admin_name, ConnectionId};
use std::collections::HashMap;

use crate::error::IdentityError;

/// Identitaet einer Verbindung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub is_admin: bool,
}

#[derive(Debug)]
struct Eintrag {
    record: UserRecord,
    /// Registrierungsreihenfolge, fuer eine stabile Roster-Sortierung
    seq: u64,
}

/// In-Memory-Registry aller identifizierten Verbindungen
#[derive(Debug, Default)]
pub struct Registry {
    eintraege: HashMap<ConnectionId, Eintrag>,
    /// Sekundaerindex Benutzername -> Verbindung (nur Nicht-Admins)
    namen: HashMap<String, ConnectionId>,
    admin: Option<ConnectionId>,
    naechste_seq: u64,
}

impl Registry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self::default()
    }

    /// Beansprucht eine Identitaet fuer eine Verbindung
    ///
    /// Bei einem Fehler bleibt die Registry unveraendert.
    pub fn identitaet_beanspruchen(
        &mut self,
        verbindung: ConnectionId,
        name: &str,
    ) -> Result<UserRecord, IdentityError> {
        if name.is_empty() {
            return Err(IdentityError::EmptyName);
        }
        if self.eintraege.contains_key(&verbindung) {
            return Err(IdentityError::AlreadyIdentified);
        }

        let record = if ist_admin_name(name) {
            if self.admin.is_some() {
                return Err(IdentityError::AdminAlreadyConnected);
            }
            self.admin = Some(verbindung);
            UserRecord {
                username: name.to_string(),
                is_admin: true,
            }
        } else {
            if self.namen.contains_key(name) {
                return Err(IdentityError::NameTaken);
            }
            self.namen.insert(name.to_string(), verbindung);
            UserRecord {
                username: name.to_string(),
                is_admin: false,
            }
        };

        let seq = self.naechste_seq;
        self.naechste_seq += 1;
        self.eintraege.insert(
            verbindung,
            Eintrag {
                record: record.clone(),
                seq,
            },
        );
        Ok(record)
    }

    /// Entfernt den Eintrag einer Verbindung
    ///
    /// War es der Admin, wird der Admin-Slot freigegeben.
    pub fn entfernen(&mut self, verbindung: &ConnectionId) -> Option<UserRecord> {
        let eintrag = self.eintraege.remove(verbindung)?;
        if eintrag.record.is_admin {
            self.admin = None;
        } else {
            self.namen.remove(&eintrag.record.username);
        }
        Some(eintrag.record)
    }

    /// Loest einen Benutzernamen zur Verbindung auf
    ///
    /// Nicht-Admins ueber den Index, der Admin ueber seinen reservierten Namen.
    pub fn verbindung_nach_name(&self, name: &str) -> Option<ConnectionId> {
        if let Some(id) = self.namen.get(name) {
            return Some(*id);
        }
        let admin = self.admin?;
        let eintrag = self.eintraege.get(&admin)?;
        (eintrag.record.username == name).then_some(admin)
    }

    /// Namen aller Nicht-Admins in Registrierungsreihenfolge
    pub fn benutzernamen_ohne_admin(&self) -> Vec<String> {
        let mut liste: Vec<&Eintrag> = self
            .eintraege
            .values()
            .filter(|e| !e.record.is_admin)
            .collect();
        liste.sort_by_key(|e| e.seq);
        liste.into_iter().map(|e| e.record.username.clone()).collect()
    }

    /// Gibt den Benutzer einer Verbindung zurueck
    pub fn benutzer(&self, verbindung: &ConnectionId) -> Option<&UserRecord> {
        self.eintraege.get(verbindung).map(|e| &e.record)
    }

    /// Verbindungs-ID des Admins, falls verbunden
    pub fn admin(&self) -> Option<ConnectionId> {
        self.admin
    }

    /// Anzahl identifizierter Verbindungen (inkl. Admin)
    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }

    pub fn ist_leer(&self) -> bool {
        self.eintraege.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_core::ADMIN_SENTINEL;

    /// Prueft alle Registry-Invarianten
    fn invarianten_pruefen(reg: &Registry) {
        let admins: Vec<_> = reg
            .eintraege
            .iter()
            .filter(|(_, e)| e.record.is_admin)
            .map(|(id, _)| *id)
            .collect();
        assert!(admins.len() <= 1, "Mehr als ein Admin: {admins:?}");
        assert_eq!(admins.first().copied(), reg.admin);

        let mut namen = reg.benutzernamen_ohne_admin();
        let anzahl = namen.len();
        namen.sort();
        namen.dedup();
        assert_eq!(namen.len(), anzahl, "Doppelte Benutzernamen");
        assert_eq!(reg.namen.len(), anzahl, "Namensindex nicht synchron");
        for (name, id) in &reg.namen {
            assert_eq!(reg.benutzer(id).map(|u| u.username.as_str()), Some(name.as_str()));
        }
    }

    #[test]
    fn benutzer_registrieren() {
        let mut reg = Registry::neu();
        let a = ConnectionId::new();

        let user = reg.identitaet_beanspruchen(a, "alice").unwrap();
        assert_eq!(user.username, "alice");
        assert!(!user.is_admin);
        assert_eq!(reg.verbindung_nach_name("alice"), Some(a));
        invarianten_pruefen(&reg);
    }

    #[test]
    fn leerer_name_abgelehnt_ohne_mutation() {
        let mut reg = Registry::neu();
        let err = reg.identitaet_beanspruchen(ConnectionId::new(), "").unwrap_err();
        assert_eq!(err, IdentityError::EmptyName);
        assert!(reg.ist_leer());
        assert!(reg.admin().is_none());
    }

    #[test]
    fn doppelter_name_abgelehnt() {
        let mut reg = Registry::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        reg.identitaet_beanspruchen(a, "alice").unwrap();
        let err = reg.identitaet_beanspruchen(b, "alice").unwrap_err();
        assert_eq!(err, IdentityError::NameTaken);
        assert!(reg.benutzer(&b).is_none());
        assert_eq!(reg.verbindung_nach_name("alice"), Some(a));
    }

    #[test]
    fn namen_sind_case_sensitiv() {
        let mut reg = Registry::neu();
        reg.identitaet_beanspruchen(ConnectionId::new(), "alice").unwrap();
        assert!(reg
            .identitaet_beanspruchen(ConnectionId::new(), "Alice")
            .is_ok());
        assert_eq!(reg.anzahl(), 2);
    }

    #[test]
    fn zweiter_admin_abgelehnt() {
        let mut reg = Registry::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        let admin = reg.identitaet_beanspruchen(a, ADMIN_SENTINEL).unwrap();
        assert!(admin.is_admin);
        assert_eq!(reg.admin(), Some(a));

        let err = reg.identitaet_beanspruchen(b, ADMIN_SENTINEL).unwrap_err();
        assert_eq!(err, IdentityError::AdminAlreadyConnected);
        assert_eq!(reg.admin(), Some(a));
        invarianten_pruefen(&reg);
    }

    #[test]
    fn admin_nach_trennung_wieder_moeglich() {
        let mut reg = Registry::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        reg.identitaet_beanspruchen(a, ADMIN_SENTINEL).unwrap();
        let entfernt = reg.entfernen(&a).unwrap();
        assert!(entfernt.is_admin);
        assert!(reg.admin().is_none());

        reg.identitaet_beanspruchen(b, ADMIN_SENTINEL).unwrap();
        assert_eq!(reg.admin(), Some(b));
    }

    #[test]
    fn erneuter_anspruch_abgelehnt() {
        let mut reg = Registry::neu();
        let a = ConnectionId::new();

        reg.identitaet_beanspruchen(a, "alice").unwrap();
        let err = reg.identitaet_beanspruchen(a, "bob").unwrap_err();
        assert_eq!(err, IdentityError::AlreadyIdentified);

        // Auch der Wechsel zum Admin ist gesperrt
        let err = reg.identitaet_beanspruchen(a, ADMIN_SENTINEL).unwrap_err();
        assert_eq!(err, IdentityError::AlreadyIdentified);
        assert!(reg.admin().is_none());
        assert_eq!(reg.benutzer(&a).unwrap().username, "alice");
        assert!(reg.verbindung_nach_name("bob").is_none());
        invarianten_pruefen(&reg);
    }

    #[test]
    fn entfernen_gibt_namen_frei() {
        let mut reg = Registry::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        reg.identitaet_beanspruchen(a, "alice").unwrap();
        assert_eq!(reg.entfernen(&a).unwrap().username, "alice");
        assert!(reg.verbindung_nach_name("alice").is_none());

        reg.identitaet_beanspruchen(b, "alice").unwrap();
        assert_eq!(reg.verbindung_nach_name("alice"), Some(b));
    }

    #[test]
    fn entfernen_unbekannter_verbindung() {
        let mut reg = Registry::neu();
        assert!(reg.entfernen(&ConnectionId::new()).is_none());
    }

    #[test]
    fn admin_ueber_namen_erreichbar() {
        let mut reg = Registry::neu();
        let admin = ConnectionId::new();
        reg.identitaet_beanspruchen(admin, ADMIN_SENTINEL).unwrap();
        assert_eq!(reg.verbindung_nach_name(ADMIN_SENTINEL), Some(admin));
        assert!(reg.verbindung_nach_name("unbekannt").is_none());
    }

    #[test]
    fn roster_in_registrierungsreihenfolge_ohne_admin() {
        let mut reg = Registry::neu();
        reg.identitaet_beanspruchen(ConnectionId::new(), "carol").unwrap();
        reg.identitaet_beanspruchen(ConnectionId::new(), ADMIN_SENTINEL)
            .unwrap();
        let bob = ConnectionId::new();
        reg.identitaet_beanspruchen(bob, "bob").unwrap();
        reg.identitaet_beanspruchen(ConnectionId::new(), "alice").unwrap();

        assert_eq!(reg.benutzernamen_ohne_admin(), vec!["carol", "bob", "alice"]);

        reg.entfernen(&bob);
        assert_eq!(reg.benutzernamen_ohne_admin(), vec!["carol", "alice"]);
    }

    #[test]
    fn invarianten_ueber_gemischte_sequenz() {
        let mut reg = Registry::neu();
        let ids: Vec<ConnectionId> = (0..8).map(|_| ConnectionId::new()).collect();
        let namen = ["alice", "bob", ADMIN_SENTINEL, "alice", "", ADMIN_SENTINEL, "carol", "bob"];

        // Mehrere Runden: anmelden, jede dritte Verbindung trennen, erneut anmelden
        for runde in 0..4 {
            for (i, id) in ids.iter().enumerate() {
                let name = namen[(i + runde) % namen.len()];
                let _ = reg.identitaet_beanspruchen(*id, name);
                invarianten_pruefen(&reg);
            }
            for id in ids.iter().skip(runde % 3).step_by(3) {
                reg.entfernen(id);
                invarianten_pruefen(&reg);
            }
        }
    }
}
