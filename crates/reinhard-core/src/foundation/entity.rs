//! Chat platform entities.
//!
//! These mirror the shape of the platform's REST payloads closely enough for
//! command routing and entity resolution; anything else a handler needs is
//! fetched through the injected client directly.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A platform-wide unique 64-bit identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snowflake(pub u64);

impl Snowflake {
    /// Returns the raw integer value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Snowflake> for u64 {
    fn from(value: Snowflake) -> Self {
        value.0
    }
}

impl FromStr for Snowflake {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's id.
    pub id: Snowflake,
    /// The user's account name.
    pub username: String,
    /// Whether this account is a bot.
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// Creates a non-bot user.
    pub fn new(id: impl Into<Snowflake>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            bot: false,
        }
    }

    /// Returns the mention string for this user.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// A user's membership in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// The guild this membership belongs to.
    pub guild_id: Snowflake,
    /// The underlying user.
    pub user: User,
    /// Guild-specific display name.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Ids of the roles held by this member.
    #[serde(default)]
    pub role_ids: Vec<Snowflake>,
}

impl Member {
    /// Creates a member without a nickname or roles.
    pub fn new(guild_id: impl Into<Snowflake>, user: User) -> Self {
        Self {
            guild_id: guild_id.into(),
            user,
            nickname: None,
            role_ids: Vec::new(),
        }
    }

    /// Sets the member's nickname.
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Returns the member's user id.
    pub fn id(&self) -> Snowflake {
        self.user.id
    }

    /// Returns the nickname if set, else the username.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.user.username)
    }
}

/// A guild role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// The role's id.
    pub id: Snowflake,
    /// The guild this role belongs to.
    pub guild_id: Snowflake,
    /// The role's name.
    pub name: String,
    /// Position in the guild's role hierarchy.
    #[serde(default)]
    pub position: i32,
}

impl Role {
    /// Creates a role at position 0.
    pub fn new(
        id: impl Into<Snowflake>,
        guild_id: impl Into<Snowflake>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            guild_id: guild_id.into(),
            name: name.into(),
            position: 0,
        }
    }
}
