//! Guild member resolution.

use reinhard_core::{EntityCache, Member, RestErrorKind, Snowflake};

use super::{BackoffConfig, ErrorRuleTable, FailureKind, ResilientResolver, RuleAction, parse_id};
use crate::context::Context;
use crate::error::ResolveError;

/// Resolves a member from an id, mention, username or nickname.
#[derive(Debug, Clone)]
pub struct MemberResolver {
    inner: ResilientResolver,
}

impl MemberResolver {
    /// Creates a resolver using the given retry schedule.
    pub fn new(backoff: BackoffConfig) -> Self {
        let rules = ErrorRuleTable::new()
            .with_rule(
                [
                    FailureKind::Rest(RestErrorKind::BadRequest),
                    FailureKind::Rest(RestErrorKind::NotFound),
                    FailureKind::EmptyResult,
                ],
                RuleAction::Raise("Couldn't find member.".into()),
            )
            // The bot lost access to the guild.
            .with_rule(
                [FailureKind::Rest(RestErrorKind::Forbidden)],
                RuleAction::AbortSilent,
            );

        Self {
            inner: ResilientResolver::new(backoff, rules, "Couldn't get member in time"),
        }
    }

    /// Resolves `argument` in the context's guild.
    ///
    /// Fails immediately outside a guild.
    pub async fn resolve(&self, ctx: &Context, argument: &str) -> Result<Member, ResolveError> {
        let Some(guild_id) = ctx.guild_id() else {
            return Err(ResolveError::InvalidContext(
                "Cannot get a member from a DM channel".into(),
            ));
        };

        let member_id = parse_id(argument);
        let services = ctx.services();
        if let Some(member) = from_cache(services.cache.as_ref(), guild_id, member_id, argument) {
            return Ok(member);
        }

        let rest = &services.rest;
        self.inner
            .run(|| async move {
                match member_id {
                    Some(member_id) => rest.fetch_member(guild_id, member_id).await.map(Some),
                    None => rest
                        .search_members(guild_id, argument)
                        .await
                        .map(|members| members.into_iter().next()),
                }
            })
            .await
    }
}

impl Default for MemberResolver {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

fn from_cache(
    cache: &dyn EntityCache,
    guild_id: Snowflake,
    member_id: Option<Snowflake>,
    argument: &str,
) -> Option<Member> {
    if let Some(member_id) = member_id {
        return cache.member(guild_id, member_id);
    }

    let name = argument.trim().to_lowercase();
    cache.guild_members(guild_id).into_iter().find(|member| {
        member.user.username.to_lowercase() == name
            || member.nickname.as_deref().is_some_and(|nick| nick.to_lowercase() == name)
    })
}
