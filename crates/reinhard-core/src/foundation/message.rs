//! Inbound and outbound chat messages.

use serde::{Deserialize, Serialize};

use super::entity::{Snowflake, User};

/// A message received from the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The message id.
    pub id: Snowflake,
    /// The channel the message was sent in.
    pub channel_id: Snowflake,
    /// The guild the message was sent in, `None` for direct messages.
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    /// The message author.
    pub author: User,
    /// The raw text content.
    pub content: String,
}

impl Message {
    /// Creates a message with the given location, author and content.
    pub fn new(
        id: impl Into<Snowflake>,
        channel_id: impl Into<Snowflake>,
        guild_id: Option<Snowflake>,
        author: User,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            guild_id,
            author,
            content: content.into(),
        }
    }

    /// Returns `true` if the message was sent outside a guild.
    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }
}

/// An in-memory file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown by the client.
    pub filename: String,
    /// File contents.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment.
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// A message about to be sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Text content.
    pub content: Option<String>,
    /// Files to upload alongside the content.
    pub attachments: Vec<Attachment>,
}

impl OutgoingMessage {
    /// Creates a text-only message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            attachments: Vec::new(),
        }
    }

    /// Adds an attachment.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}
