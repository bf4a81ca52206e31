//! parlor-protocol – WebSocket-Protokoll-Definitionen
//!
//! Dieses Crate definiert alle Events, die zwischen Client und Hub
//! ausgetauscht werden, sowie das Nachrichten-Payload.

pub mod events;
pub mod message;

pub use events::{
    ClientEvent, IdentityClaim, IdentityOk, SendMessage, ServerEvent, TypingKind, TypingNotice,
    TypingTarget,
};
pub use message::Message;
