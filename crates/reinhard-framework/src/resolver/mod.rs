//! Resilient entity resolution.
//!
//! Turning a raw argument into a member, role or user is done in two tiers:
//!
//! 1. A cache-bound lookup that never touches the network and is never
//!    retried.
//! 2. A bounded retry loop around one remote call per attempt. Each failure
//!    is classified by an [`ErrorRuleTable`]: named failures stop the loop
//!    at once (either with a user-facing error or a silent abort) and
//!    everything else is retried until the [`Backoff`] runs out.
//!
//! ```rust,ignore
//! let members = MemberResolver::new(load_ctx.backoff().clone());
//!
//! Command::builder("whois").handler(move |ctx, args| {
//!     let members = members.clone();
//!     async move {
//!         let member = members.resolve(&ctx, &args.join(" ")).await?;
//!         ctx.reply(member.display_name()).await?;
//!         Ok(())
//!     }
//! })
//! ```

mod backoff;
mod id;
mod member;
mod role;
mod rules;
mod user;

use std::future::Future;

use tracing::debug;

use crate::error::ResolveError;
use reinhard_core::RestResult;

pub use backoff::{Backoff, BackoffConfig};
pub use id::parse_id;
pub use member::MemberResolver;
pub use role::RoleResolver;
pub use rules::{ErrorRuleTable, FailureKind, RuleAction};
pub use user::UserResolver;

/// A retry loop governed by a backoff schedule and a rule table.
#[derive(Debug, Clone)]
pub struct ResilientResolver {
    backoff: BackoffConfig,
    rules: ErrorRuleTable,
    timeout_message: String,
}

impl ResilientResolver {
    /// Creates a resolver.
    ///
    /// `timeout_message` is the user-facing text used once every attempt
    /// failed transiently.
    pub fn new(
        backoff: BackoffConfig,
        rules: ErrorRuleTable,
        timeout_message: impl Into<String>,
    ) -> Self {
        Self {
            backoff,
            rules,
            timeout_message: timeout_message.into(),
        }
    }

    /// The backoff settings.
    pub fn backoff(&self) -> &BackoffConfig {
        &self.backoff
    }

    /// The failure rules.
    pub fn rules(&self) -> &ErrorRuleTable {
        &self.rules
    }

    /// Runs `attempt` until it yields a value, a rule stops the loop, or the
    /// schedule is exhausted.
    ///
    /// `Ok(None)` from an attempt is classified as
    /// [`FailureKind::EmptyResult`]. A rate limit carrying a retry delay
    /// stretches the next wait to at least that delay.
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Result<T, ResolveError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RestResult<Option<T>>>,
    {
        let mut backoff = self.backoff.start();

        while let Some(number) = backoff.next().await {
            let failure = match attempt().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => FailureKind::EmptyResult,
                Err(e) => {
                    if let Some(delay) = e.retry_after() {
                        backoff.defer(delay);
                    }
                    debug!(attempt = number, error = %e, "Lookup attempt failed");
                    FailureKind::Rest(e.kind())
                }
            };

            match self.rules.classify(failure) {
                Some(RuleAction::Raise(message)) => {
                    return Err(ResolveError::NotFound(message.clone()));
                }
                Some(RuleAction::AbortSilent) => {
                    debug!(attempt = number, ?failure, "Lookup aborted");
                    return Err(ResolveError::Aborted);
                }
                None => {
                    debug!(
                        attempt = number,
                        max_attempts = backoff.max_attempts(),
                        ?failure,
                        "Transient lookup failure"
                    );
                }
            }
        }

        Err(ResolveError::Timeout {
            message: self.timeout_message.clone(),
            attempts: backoff.attempt(),
        })
    }
}
