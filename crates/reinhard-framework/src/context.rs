//! Per-message command context.

use std::sync::Arc;

use tracing::debug;

use crate::command::Command;
use reinhard_core::{Attachment, Message, OutgoingMessage, ReplyResult, Services, Snowflake};

/// Longest message content the platform accepts.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Sent in place of content that exceeds [`MAX_MESSAGE_LENGTH`].
pub const OVERSIZE_PLACEHOLDER: &str = "This response is too large to send, see attached file.";

const OVERSIZE_FILENAME: &str = "message.txt";

/// How a message invoked a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// The message started with a command prefix.
    Prefix,
    /// The message started with a mention of the bot.
    Mention,
}

/// Scratch state for one inbound message.
///
/// Created by the [`Client`](crate::Client) once a prefix or mention
/// matched, mutated while a command is selected, then shared read-only with
/// the handler. The content cursor only ever shrinks.
pub struct Context {
    message: Arc<Message>,
    content: String,
    trigger: String,
    trigger_kind: TriggerKind,
    triggering_name: Option<String>,
    command: Option<Arc<Command>>,
    services: Arc<Services>,
}

impl Context {
    /// Creates a context whose cursor starts at `content`.
    pub fn new(
        message: Arc<Message>,
        content: impl Into<String>,
        trigger: impl Into<String>,
        trigger_kind: TriggerKind,
        services: Arc<Services>,
    ) -> Self {
        Self {
            message,
            content: content.into(),
            trigger: trigger.into(),
            trigger_kind,
            triggering_name: None,
            command: None,
            services,
        }
    }

    /// The message being handled.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The remaining, unconsumed content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The prefix or mention that invoked the command.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// How the command was invoked.
    pub fn trigger_kind(&self) -> TriggerKind {
        self.trigger_kind
    }

    /// The command trigger that matched, once a command check bound it.
    pub fn triggering_name(&self) -> Option<&str> {
        self.triggering_name.as_deref()
    }

    /// The selected command.
    pub fn command(&self) -> Option<&Arc<Command>> {
        self.command.as_ref()
    }

    /// The injected platform capabilities.
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// The guild the message came from.
    pub fn guild_id(&self) -> Option<Snowflake> {
        self.message.guild_id
    }

    /// The message author's id.
    pub fn author_id(&self) -> Snowflake {
        self.message.author.id
    }

    /// Splits the remaining content on whitespace.
    pub fn args(&self) -> Vec<String> {
        self.content.split_whitespace().map(str::to_owned).collect()
    }

    /// Drops the first `chars` characters of the cursor.
    pub fn prune(&mut self, chars: usize) {
        let cut = self
            .content
            .char_indices()
            .nth(chars)
            .map_or(self.content.len(), |(index, _)| index);
        self.content.drain(..cut);
    }

    pub(crate) fn set_triggering_name(&mut self, name: &str) {
        self.triggering_name = Some(name.to_owned());
    }

    pub(crate) fn set_command(&mut self, command: Arc<Command>) {
        self.command = Some(command);
    }

    /// Replies in the message's channel.
    pub async fn reply(&self, content: impl Into<String>) -> ReplyResult<Message> {
        self.send(prepare_reply(content.into(), false)).await
    }

    /// Replies in the message's channel with `@` characters removed.
    pub async fn reply_sanitized(&self, content: impl Into<String>) -> ReplyResult<Message> {
        self.send(prepare_reply(content.into(), true)).await
    }

    /// Sends a prepared message to the message's channel.
    pub async fn send(&self, message: OutgoingMessage) -> ReplyResult<Message> {
        self.services
            .replies
            .send_message(self.message.channel_id, message)
            .await
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("message_id", &self.message.id)
            .field("content", &self.content)
            .field("trigger", &self.trigger)
            .field("trigger_kind", &self.trigger_kind)
            .field("triggering_name", &self.triggering_name)
            .field("command", &self.command.as_ref().map(|c| c.name()))
            .finish()
    }
}

/// Removes characters that would ping users or roles.
pub fn sanitize_content(content: &str) -> String {
    content.replace('@', "")
}

/// Builds the outgoing message for a text reply.
///
/// Oversized content is moved into a `message.txt` attachment.
pub(crate) fn prepare_reply(content: String, sanitize: bool) -> OutgoingMessage {
    if content.chars().count() > MAX_MESSAGE_LENGTH {
        debug!(
            length = content.len(),
            "Reply too large, sending as attachment"
        );
        OutgoingMessage::text(OVERSIZE_PLACEHOLDER)
            .with_attachment(Attachment::new(OVERSIZE_FILENAME, content.into_bytes()))
    } else if sanitize {
        OutgoingMessage::text(sanitize_content(&content))
    } else {
        OutgoingMessage::text(content)
    }
}
