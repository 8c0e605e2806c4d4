//! # Reinhard Core
//!
//! Core types and capability interfaces for the Reinhard command framework.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! Platform-neutral data types:
//! - **Identifiers**: [`Snowflake`] ids for users, guilds, channels and roles
//! - **Entities**: [`User`], [`Member`], [`Role`], [`Message`]
//! - **Outgoing messages**: [`OutgoingMessage`] with file [`Attachment`]s
//! - **Gateway events**: [`GatewayEvent`] and the reserved platform event names
//!
//! ### Integration Layer
//!
//! Narrow interfaces the framework depends on. Concrete REST and gateway
//! clients live outside this workspace and are injected at startup:
//! - [`EntityRest`]: remote member / role / user lookups
//! - [`EntityCache`]: cache-bound lookups that never touch the network
//! - [`ReplySink`]: sending messages back to a channel
//! - [`GuildPrefixProvider`]: optional per-guild command prefix
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌───────────────┐
//! │   Gateway    │────▶│    Client    │────▶│    Command    │
//! │ (transport)  │     │ (dispatcher) │     │   handlers    │
//! └──────────────┘     └──────────────┘     └───────┬───────┘
//!                                                   │ resolve
//!                      ┌──────────────┐     ┌───────▼───────┐
//!                      │  EntityRest  │◀────│   Resolver    │
//!                      └──────────────┘     └───────────────┘
//! ```

pub mod error;
pub mod foundation;
pub mod integration;

pub use error::{ReplyError, ReplyResult, RestError, RestErrorKind, RestResult};
pub use foundation::entity::{Member, Role, Snowflake, User};
pub use foundation::event::{GatewayEvent, MESSAGE_CREATE, RESERVED_EVENT_NAMES, is_reserved_event};
pub use foundation::message::{Attachment, Message, OutgoingMessage};
pub use integration::cache::{InMemoryCache, NoCache};
pub use integration::capability::{
    EntityCache, EntityRest, GuildPrefixProvider, ReplySink, Services,
};
