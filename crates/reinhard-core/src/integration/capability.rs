//! Capability traits the framework depends on.
//!
//! The command layer never talks to the platform directly. Instead the
//! runtime hands it a [`Services`] bundle holding trait objects for the
//! REST client, the entity cache and the reply channel:
//!
//! ```rust,ignore
//! let services = Services::new(Arc::new(MyRest::new(token)), Arc::new(MyReplies::new()))
//!     .with_cache(Arc::new(InMemoryCache::new()));
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::cache::NoCache;
use crate::error::{ReplyResult, RestResult};
use crate::foundation::entity::{Member, Role, Snowflake, User};
use crate::foundation::message::{Message, OutgoingMessage};

// =============================================================================
// Remote Lookups
// =============================================================================

/// Remote entity lookups.
///
/// Every call may fail transiently; callers that need resilience go through
/// the framework's resolvers rather than calling this directly.
#[async_trait]
pub trait EntityRest: Send + Sync {
    /// Fetches a single guild member by user id.
    async fn fetch_member(&self, guild_id: Snowflake, user_id: Snowflake) -> RestResult<Member>;

    /// Searches a guild's members by name or nickname prefix.
    async fn search_members(&self, guild_id: Snowflake, query: &str) -> RestResult<Vec<Member>>;

    /// Fetches every role in a guild.
    async fn fetch_roles(&self, guild_id: Snowflake) -> RestResult<Vec<Role>>;

    /// Fetches a user by id.
    async fn fetch_user(&self, user_id: Snowflake) -> RestResult<User>;
}

// =============================================================================
// Cache Lookups
// =============================================================================

/// Cache-bound lookups.
///
/// Implementations must not perform I/O.
pub trait EntityCache: Send + Sync {
    /// Returns a cached member.
    fn member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<Member>;

    /// Returns every cached member of a guild.
    fn guild_members(&self, guild_id: Snowflake) -> Vec<Member>;

    /// Returns every cached role of a guild.
    fn guild_roles(&self, guild_id: Snowflake) -> Vec<Role>;

    /// Returns a cached user.
    fn user(&self, user_id: Snowflake) -> Option<User>;
}

// =============================================================================
// Replies
// =============================================================================

/// Sends messages back to the platform.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Sends `message` to `channel_id`, returning the created message.
    async fn send_message(
        &self,
        channel_id: Snowflake,
        message: OutgoingMessage,
    ) -> ReplyResult<Message>;
}

// =============================================================================
// Guild Prefixes
// =============================================================================

/// Supplies an extra command prefix for a guild.
///
/// Plain closures work as synchronous providers; implement the trait
/// directly when the lookup needs to await (a database, for example).
#[async_trait]
pub trait GuildPrefixProvider: Send + Sync {
    /// Returns the guild's prefix, if it has one.
    async fn guild_prefix(&self, guild_id: Snowflake) -> Option<String>;
}

#[async_trait]
impl<F> GuildPrefixProvider for F
where
    F: Fn(Snowflake) -> Option<String> + Send + Sync,
{
    async fn guild_prefix(&self, guild_id: Snowflake) -> Option<String> {
        self(guild_id)
    }
}

// =============================================================================
// Service Bundle
// =============================================================================

/// Shared handles to the injected capabilities.
#[derive(Clone)]
pub struct Services {
    /// Remote lookups.
    pub rest: Arc<dyn EntityRest>,
    /// Cache lookups.
    pub cache: Arc<dyn EntityCache>,
    /// Reply channel.
    pub replies: Arc<dyn ReplySink>,
}

impl Services {
    /// Creates a bundle with no cache.
    pub fn new(rest: Arc<dyn EntityRest>, replies: Arc<dyn ReplySink>) -> Self {
        Self {
            rest,
            cache: Arc::new(NoCache),
            replies,
        }
    }

    /// Replaces the cache.
    pub fn with_cache(mut self, cache: Arc<dyn EntityCache>) -> Self {
        self.cache = cache;
        self
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
