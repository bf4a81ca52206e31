//! WebSocket-Events
//!
//! Jeder Frame ist ein JSON-Textframe der Form
//! `{"event": "<name>", "data": <payload>}`. Die Event-Namen sind die des
//! Browser-Clients (`set_identity`, `receive_message`, ...).
//!
//! Fehlende Payload-Felder werden mit leeren Werten belegt, damit die
//! Validierung im Hub entscheidet und nicht der Decoder.

use parlor_core::{ParlorError, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::message::Message;

/// `null` und fehlende Felder werden zum leeren String
fn null_als_leer<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Eingehend (Client -> Hub)
// ---------------------------------------------------------------------------

/// Identitaets-Anspruch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    #[serde(default, deserialize_with = "null_als_leer")]
    pub name: String,
}

/// Nachricht senden
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    #[serde(default, deserialize_with = "null_als_leer")]
    pub to: String,
    #[serde(default, deserialize_with = "null_als_leer")]
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl SendMessage {
    /// Bild-Payload, leere Strings zaehlen als nicht vorhanden
    pub fn bild(&self) -> Option<&str> {
        self.image.as_deref().filter(|b| !b.is_empty())
    }

    /// Prueft ob Text oder Bild vorhanden ist
    pub fn hat_inhalt(&self) -> bool {
        !self.text.is_empty() || self.bild().is_some()
    }
}

/// Ziel eines Tipp-Signals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingTarget {
    #[serde(default, deserialize_with = "null_als_leer")]
    pub to: String,
}

/// Alle Events die ein Client senden darf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    SetIdentity(IdentityClaim),
    SendMessage(SendMessage),
    Typing(TypingTarget),
    StopTyping(TypingTarget),
}

impl ClientEvent {
    /// Dekodiert einen Textframe
    pub fn from_json(text: &str) -> Result<Self> {
        let mut wert: serde_json::Value = serde_json::from_str(text)?;
        let name = match wert.get("event").and_then(|e| e.as_str()) {
            Some(n) => n.to_string(),
            None => return Err(ParlorError::UngueltigeNachricht("Feld 'event' fehlt".into())),
        };
        if !KLIENT_EVENTS.contains(&name.as_str()) {
            return Err(ParlorError::UnbekanntesEvent(name));
        }

        // Fehlendes oder null-"data" wird zum leeren Objekt
        if let Some(obj) = wert.as_object_mut() {
            let data = obj.entry("data").or_insert(serde_json::Value::Null);
            if data.is_null() {
                *data = serde_json::json!({});
            }
        }
        Ok(serde_json::from_value(wert)?)
    }

    /// Gibt den Event-Namen fuer Logs zurueck
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetIdentity(_) => "set_identity",
            Self::SendMessage(_) => "send_message",
            Self::Typing(_) => "typing",
            Self::StopTyping(_) => "stop_typing",
        }
    }
}

const KLIENT_EVENTS: [&str; 4] = ["set_identity", "send_message", "typing", "stop_typing"];

// ---------------------------------------------------------------------------
// Ausgehend (Hub -> Client)
// ---------------------------------------------------------------------------

/// Art des Tipp-Signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingKind {
    Typing,
    StopTyping,
}

/// Tipp-Status, an den Empfaenger adressiert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingNotice {
    pub from: String,
}

/// Bestaetigung einer erfolgreichen Identifizierung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityOk {
    pub username: String,
}

/// Alle Events die der Hub an Clients sendet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    IdentityError(String),
    IdentityOk(IdentityOk),
    ReceiveMessage(Message),
    SendError(String),
    Typing(TypingNotice),
    StopTyping(TypingNotice),
    UpdateUsersList(Vec<String>),
    AdminDisconnected,
}

impl ServerEvent {
    pub fn identity_ok(username: impl Into<String>) -> Self {
        Self::IdentityOk(IdentityOk {
            username: username.into(),
        })
    }

    /// Baut das passende Tipp-Event fuer den Empfaenger
    pub fn tippen(art: TypingKind, from: impl Into<String>) -> Self {
        let notice = TypingNotice { from: from.into() };
        match art {
            TypingKind::Typing => Self::Typing(notice),
            TypingKind::StopTyping => Self::StopTyping(notice),
        }
    }

    /// Serialisiert das Event als Textframe
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Gibt den Event-Namen fuer Logs zurueck
    pub fn name(&self) -> &'static str {
        match self {
            Self::IdentityError(_) => "identity_error",
            Self::IdentityOk(_) => "identity_ok",
            Self::ReceiveMessage(_) => "receive_message",
            Self::SendError(_) => "send_error",
            Self::Typing(_) => "typing",
            Self::StopTyping(_) => "stop_typing",
            Self::UpdateUsersList(_) => "update_users_list",
            Self::AdminDisconnected => "admin_disconnected",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_identity_dekodieren() {
        let ev = ClientEvent::from_json(r#"{"event":"set_identity","data":{"name":"alice"}}"#)
            .unwrap();
        assert_eq!(
            ev,
            ClientEvent::SetIdentity(IdentityClaim {
                name: "alice".into()
            })
        );
    }

    #[test]
    fn fehlender_name_wird_leer() {
        let ev = ClientEvent::from_json(r#"{"event":"set_identity","data":{}}"#).unwrap();
        assert_eq!(ev, ClientEvent::SetIdentity(IdentityClaim::default()));

        let ev = ClientEvent::from_json(r#"{"event":"set_identity"}"#).unwrap();
        assert_eq!(ev, ClientEvent::SetIdentity(IdentityClaim::default()));
    }

    #[test]
    fn null_felder_werden_leer() {
        let ev = ClientEvent::from_json(r#"{"event":"set_identity","data":{"name":null}}"#).unwrap();
        assert_eq!(ev, ClientEvent::SetIdentity(IdentityClaim::default()));

        let ev = ClientEvent::from_json(r#"{"event":"typing","data":null}"#).unwrap();
        assert_eq!(ev, ClientEvent::Typing(TypingTarget::default()));
    }

    #[test]
    fn send_message_mit_bild() {
        let ev = ClientEvent::from_json(
            r#"{"event":"send_message","data":{"to":"bob","image":"data:image/png;base64,AAAA"}}"#,
        )
        .unwrap();
        let ClientEvent::SendMessage(m) = ev else {
            panic!("Erwartet SendMessage");
        };
        assert_eq!(m.to, "bob");
        assert_eq!(m.text, "");
        assert!(m.hat_inhalt());
    }

    #[test]
    fn leeres_bild_zaehlt_nicht_als_inhalt() {
        let m = SendMessage {
            to: "bob".into(),
            text: String::new(),
            image: Some(String::new()),
        };
        assert!(m.bild().is_none());
        assert!(!m.hat_inhalt());
    }

    #[test]
    fn typing_dekodieren() {
        let ev = ClientEvent::from_json(r#"{"event":"stop_typing","data":{"to":"bob"}}"#).unwrap();
        assert_eq!(ev, ClientEvent::StopTyping(TypingTarget { to: "bob".into() }));
        assert_eq!(ev.name(), "stop_typing");
    }

    #[test]
    fn unbekanntes_event_abgelehnt() {
        let err = ClientEvent::from_json(r#"{"event":"receive_message","data":{}}"#).unwrap_err();
        assert!(matches!(err, ParlorError::UnbekanntesEvent(_)));
        assert!(err.ist_client_fehler());
    }

    #[test]
    fn kaputtes_json_abgelehnt() {
        let err = ClientEvent::from_json("{nicht json").unwrap_err();
        assert!(matches!(err, ParlorError::UngueltigeNachricht(_)));

        let err = ClientEvent::from_json(r#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, ParlorError::UngueltigeNachricht(_)));
    }

    #[test]
    fn server_events_wire_format() {
        let json = ServerEvent::identity_ok("alice").to_json().unwrap();
        assert_eq!(json, r#"{"event":"identity_ok","data":{"username":"alice"}}"#);

        let json = ServerEvent::IdentityError("Username already taken".into())
            .to_json()
            .unwrap();
        assert_eq!(json, r#"{"event":"identity_error","data":"Username already taken"}"#);

        let json = ServerEvent::UpdateUsersList(vec!["alice".into()]).to_json().unwrap();
        assert_eq!(json, r#"{"event":"update_users_list","data":["alice"]}"#);

        let json = ServerEvent::AdminDisconnected.to_json().unwrap();
        assert_eq!(json, r#"{"event":"admin_disconnected"}"#);
    }

    #[test]
    fn tipp_events_nach_art() {
        let t = ServerEvent::tippen(TypingKind::Typing, "alice");
        assert_eq!(t.to_json().unwrap(), r#"{"event":"typing","data":{"from":"alice"}}"#);
        let s = ServerEvent::tippen(TypingKind::StopTyping, "alice");
        assert_eq!(s.name(), "stop_typing");
    }
}
