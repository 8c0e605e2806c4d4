//! Gateway events delivered by the transport layer.
//!
//! The framework only interprets `message_create`; every other event is
//! forwarded untouched to listeners that registered for its name.

use serde_json::Value;

use super::message::Message;

/// Name of the event fired when a message is created.
pub const MESSAGE_CREATE: &str = "message_create";

/// Event names owned by the platform transport.
///
/// Module listeners registered under one of these names are handed to the
/// dispatcher's gateway bus instead of the module's own event bus.
pub const RESERVED_EVENT_NAMES: &[&str] = &[
    "ready",
    "resumed",
    "guild_create",
    "guild_update",
    "guild_delete",
    "guild_member_add",
    "guild_member_update",
    "guild_member_remove",
    "guild_role_create",
    "guild_role_update",
    "guild_role_delete",
    "channel_create",
    "channel_update",
    "channel_delete",
    MESSAGE_CREATE,
    "message_update",
    "message_delete",
    "message_reaction_add",
    "message_reaction_remove",
    "presence_update",
    "typing_start",
    "voice_state_update",
];

/// Returns `true` if `name` is a platform event name.
pub fn is_reserved_event(name: &str) -> bool {
    RESERVED_EVENT_NAMES.contains(&name)
}

/// An event received from the gateway.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// A message was created.
    MessageCreate(Message),
    /// Any other event, kept as its raw payload.
    Other {
        /// The platform event name (snake case).
        name: String,
        /// The raw event payload.
        payload: Value,
    },
}

impl GatewayEvent {
    /// Returns the event's platform name.
    pub fn name(&self) -> &str {
        match self {
            Self::MessageCreate(_) => MESSAGE_CREATE,
            Self::Other { name, .. } => name,
        }
    }

    /// Returns the message if this is a `message_create` event.
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::MessageCreate(message) => Some(message),
            Self::Other { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::entity::User;

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved_event("message_create"));
        assert!(is_reserved_event("guild_member_add"));
        assert!(!is_reserved_event("error"));
        assert!(!is_reserved_event("load"));
    }

    #[test]
    fn test_event_name() {
        let message = Message::new(1, 2, None, User::new(3, "a"), "hi");
        assert_eq!(GatewayEvent::MessageCreate(message).name(), MESSAGE_CREATE);

        let event = GatewayEvent::Other {
            name: "typing_start".into(),
            payload: Value::Null,
        };
        assert_eq!(event.name(), "typing_start");
        assert!(event.as_message().is_none());
    }
}
