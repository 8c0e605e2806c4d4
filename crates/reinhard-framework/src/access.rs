//! Actor access levels.

use std::collections::HashMap;

use reinhard_core::Snowflake;

/// Maps actor ids to integer access levels.
///
/// Built once from configuration and handed to the [`Client`](crate::Client)
/// at construction. Unknown actors have level 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    levels: HashMap<Snowflake, u32>,
}

impl AccessPolicy {
    /// Creates an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an actor's level.
    pub fn with_level(mut self, actor_id: impl Into<Snowflake>, level: u32) -> Self {
        self.levels.insert(actor_id.into(), level);
        self
    }

    /// Returns an actor's level.
    pub fn level(&self, actor_id: Snowflake) -> u32 {
        self.levels.get(&actor_id).copied().unwrap_or(0)
    }

    /// Returns `true` if the actor may run a command requiring `required`.
    pub fn permits(&self, actor_id: Snowflake, required: u32) -> bool {
        self.level(actor_id) >= required
    }

    /// Returns the number of configured actors.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns `true` if no actors are configured.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl FromIterator<(Snowflake, u32)> for AccessPolicy {
    fn from_iter<I: IntoIterator<Item = (Snowflake, u32)>>(iter: I) -> Self {
        Self {
            levels: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_actor_is_level_zero() {
        let policy = AccessPolicy::new();
        assert_eq!(policy.level(Snowflake(1)), 0);
        assert!(policy.permits(Snowflake(1), 0));
        assert!(!policy.permits(Snowflake(1), 1));
    }

    #[test]
    fn test_exact_level_is_permitted() {
        let policy = AccessPolicy::new().with_level(5, 3);
        assert!(policy.permits(Snowflake(5), 3));
        assert!(policy.permits(Snowflake(5), 2));
        assert!(!policy.permits(Snowflake(5), 4));
    }
}
