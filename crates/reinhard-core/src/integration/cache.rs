//! Entity cache implementations.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::capability::EntityCache;
use crate::foundation::entity::{Member, Role, Snowflake, User};

/// A cache that never holds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl EntityCache for NoCache {
    fn member(&self, _guild_id: Snowflake, _user_id: Snowflake) -> Option<Member> {
        None
    }

    fn guild_members(&self, _guild_id: Snowflake) -> Vec<Member> {
        Vec::new()
    }

    fn guild_roles(&self, _guild_id: Snowflake) -> Vec<Role> {
        Vec::new()
    }

    fn user(&self, _user_id: Snowflake) -> Option<User> {
        None
    }
}

/// A map-backed cache fed by gateway events.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    members: RwLock<HashMap<Snowflake, HashMap<Snowflake, Member>>>,
    roles: RwLock<HashMap<Snowflake, HashMap<Snowflake, Role>>>,
    users: RwLock<HashMap<Snowflake, User>>,
}

impl InMemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a member, also caching its user.
    pub fn insert_member(&self, member: Member) {
        self.users.write().insert(member.user.id, member.user.clone());
        self.members
            .write()
            .entry(member.guild_id)
            .or_default()
            .insert(member.user.id, member);
    }

    /// Removes a member.
    pub fn remove_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<Member> {
        self.members
            .write()
            .get_mut(&guild_id)
            .and_then(|members| members.remove(&user_id))
    }

    /// Stores a role.
    pub fn insert_role(&self, role: Role) {
        self.roles
            .write()
            .entry(role.guild_id)
            .or_default()
            .insert(role.id, role);
    }

    /// Removes a role.
    pub fn remove_role(&self, guild_id: Snowflake, role_id: Snowflake) -> Option<Role> {
        self.roles
            .write()
            .get_mut(&guild_id)
            .and_then(|roles| roles.remove(&role_id))
    }

    /// Stores a user.
    pub fn insert_user(&self, user: User) {
        self.users.write().insert(user.id, user);
    }

    /// Drops everything cached for a guild.
    pub fn clear_guild(&self, guild_id: Snowflake) {
        self.members.write().remove(&guild_id);
        self.roles.write().remove(&guild_id);
    }
}

impl EntityCache for InMemoryCache {
    fn member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<Member> {
        self.members
            .read()
            .get(&guild_id)
            .and_then(|members| members.get(&user_id).cloned())
    }

    fn guild_members(&self, guild_id: Snowflake) -> Vec<Member> {
        self.members
            .read()
            .get(&guild_id)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    fn guild_roles(&self, guild_id: Snowflake) -> Vec<Role> {
        let mut roles: Vec<Role> = self
            .roles
            .read()
            .get(&guild_id)
            .map(|roles| roles.values().cloned().collect())
            .unwrap_or_default();
        roles.sort_by_key(|role| role.position);
        roles
    }

    fn user(&self, user_id: Snowflake) -> Option<User> {
        self.users.read().get(&user_id).cloned()
    }
}
