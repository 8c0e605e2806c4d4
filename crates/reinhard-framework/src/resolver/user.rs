//! User resolution.

use reinhard_core::{RestErrorKind, User};

use super::{BackoffConfig, ErrorRuleTable, FailureKind, ResilientResolver, RuleAction, parse_id};
use crate::context::Context;
use crate::error::ResolveError;

/// Resolves a user from an id or mention.
///
/// Unlike members and roles, users can be resolved outside a guild. A
/// forbidden response is treated as transient.
#[derive(Debug, Clone)]
pub struct UserResolver {
    inner: ResilientResolver,
}

impl UserResolver {
    /// Creates a resolver using the given retry schedule.
    pub fn new(backoff: BackoffConfig) -> Self {
        let rules = ErrorRuleTable::new().with_rule(
            [
                FailureKind::Rest(RestErrorKind::BadRequest),
                FailureKind::Rest(RestErrorKind::NotFound),
            ],
            RuleAction::Raise("Couldn't find user.".into()),
        );

        Self {
            inner: ResilientResolver::new(backoff, rules, "Couldn't fetch user in time."),
        }
    }

    /// Resolves `argument`, which must be an id or a mention.
    pub async fn resolve(&self, ctx: &Context, argument: &str) -> Result<User, ResolveError> {
        let Some(user_id) = parse_id(argument) else {
            return Err(ResolveError::InvalidArgument(
                "No valid user mention or ID found".into(),
            ));
        };

        let services = ctx.services();
        if let Some(user) = services.cache.user(user_id) {
            return Ok(user);
        }

        let rest = &services.rest;
        self.inner
            .run(|| async move { rest.fetch_user(user_id).await.map(Some) })
            .await
    }
}

impl Default for UserResolver {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockRest, guild_context, no_cache, services_with_rest};
    use reinhard_core::{InMemoryCache, RestError, Snowflake};
    use std::sync::Arc;

    fn resolver() -> UserResolver {
        UserResolver::new(BackoffConfig {
            jitter_ms: 0,
            ..BackoffConfig::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_by_mention_in_direct_message() {
        let rest = Arc::new(MockRest::default().with_user(Ok(User::new(9, "ghost"))));
        let ctx = guild_context(services_with_rest(Arc::clone(&rest), no_cache()), None);

        let user = resolver().resolve(&ctx, "<@9>").await.unwrap();
        assert_eq!(user.username, "ghost");
        assert_eq!(MockRest::calls(&rest.user_calls), 1);
    }

    #[tokio::test]
    async fn test_name_is_rejected() {
        let rest = Arc::new(MockRest::default());
        let ctx = guild_context(services_with_rest(Arc::clone(&rest), no_cache()), None);

        assert_eq!(
            resolver().resolve(&ctx, "ghost").await,
            Err(ResolveError::InvalidArgument("No valid user mention or ID found".into()))
        );
        assert_eq!(MockRest::calls(&rest.user_calls), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_raised() {
        let rest = Arc::new(MockRest::default().with_user(Err(RestError::BadRequest("snowflake".into()))));
        let ctx = guild_context(services_with_rest(Arc::clone(&rest), no_cache()), None);

        assert_eq!(
            resolver().resolve(&ctx, "9").await,
            Err(ResolveError::NotFound("Couldn't find user.".into()))
        );
        assert_eq!(MockRest::calls(&rest.user_calls), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forbidden_is_retried() {
        let rest = Arc::new(
            MockRest::default()
                .with_user(Err(RestError::Forbidden("x".into())))
                .with_user(Ok(User::new(9, "ghost"))),
        );
        let ctx = guild_context(services_with_rest(Arc::clone(&rest), no_cache()), None);

        assert_eq!(resolver().resolve(&ctx, "9").await.unwrap().id, Snowflake(9));
        assert_eq!(MockRest::calls(&rest.user_calls), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_rest() {
        let cache = Arc::new(InMemoryCache::new());
        cache.insert_user(User::new(9, "ghost"));
        let rest = Arc::new(MockRest::default());
        let ctx = guild_context(services_with_rest(Arc::clone(&rest), cache), None);

        assert_eq!(resolver().resolve(&ctx, "9").await.unwrap().username, "ghost");
        assert_eq!(MockRest::calls(&rest.user_calls), 0);
    }
}
