//! Guild role resolution.

use reinhard_core::{Role, RestErrorKind, Snowflake};

use super::{BackoffConfig, ErrorRuleTable, FailureKind, ResilientResolver, RuleAction, parse_id};
use crate::context::Context;
use crate::error::ResolveError;

/// Resolves a role from an id, mention or case-insensitive name.
#[derive(Debug, Clone)]
pub struct RoleResolver {
    inner: ResilientResolver,
}

impl RoleResolver {
    /// Creates a resolver using the given retry schedule.
    pub fn new(backoff: BackoffConfig) -> Self {
        let rules = ErrorRuleTable::new()
            .with_rule(
                [
                    FailureKind::Rest(RestErrorKind::BadRequest),
                    FailureKind::Rest(RestErrorKind::NotFound),
                    FailureKind::EmptyResult,
                ],
                RuleAction::Raise("Couldn't find role.".into()),
            )
            .with_rule(
                [FailureKind::Rest(RestErrorKind::Forbidden)],
                RuleAction::AbortSilent,
            );

        Self {
            inner: ResilientResolver::new(backoff, rules, "Couldn't fetch role in time."),
        }
    }

    /// Resolves `argument` among the context guild's roles.
    ///
    /// Fails immediately outside a guild, even when the role is cached.
    pub async fn resolve(&self, ctx: &Context, argument: &str) -> Result<Role, ResolveError> {
        let Some(guild_id) = ctx.guild_id() else {
            return Err(ResolveError::InvalidContext(
                "Cannot get a role from a DM channel".into(),
            ));
        };

        let role_id = parse_id(argument);
        let name = argument.trim().to_lowercase();
        let name = name.as_str();

        let services = ctx.services();
        if let Some(role) = services
            .cache
            .guild_roles(guild_id)
            .into_iter()
            .find(|role| role_matches(role, role_id, name))
        {
            return Ok(role);
        }

        let rest = &services.rest;
        self.inner
            .run(|| async move {
                rest.fetch_roles(guild_id)
                    .await
                    .map(|roles| roles.into_iter().find(|role| role_matches(role, role_id, name)))
            })
            .await
    }
}

impl Default for RoleResolver {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

fn role_matches(role: &Role, role_id: Option<Snowflake>, name: &str) -> bool {
    match role_id {
        Some(role_id) => role.id == role_id,
        None => role.name.to_lowercase() == name,
    }
}
