//! Commands: triggers, access level, check chain and handler.
//!
//! # Example
//!
//! ```rust,ignore
//! use reinhard_framework::{Check, Command, CommandError};
//!
//! let command = Command::builder("set_nick")
//!     .alias("nick")
//!     .level(2)
//!     .check(Check::new(|ctx| ctx.guild_id().is_some()))
//!     .handler(|ctx, args| async move {
//!         let Some(nick) = args.first() else {
//!             return Err(CommandError::new("Missing nickname.").into());
//!         };
//!         ctx.reply(format!("Nickname set to {nick}")).await?;
//!         Ok(())
//!     });
//!
//! assert_eq!(command.triggers(), ["set nick", "nick"]);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::context::Context;
use crate::error::{BoxError, ExecuteError, FrameworkError, FrameworkResult, HandlerError};
use crate::event::{CommandEvent, EventBus, EventPayload};
use reinhard_core::ReplyError;

pub use futures::future::BoxFuture;

/// A type-erased command handler.
pub type HandlerFn =
    Arc<dyn Fn(Arc<Context>, Vec<String>) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync>;

/// A synchronous check.
pub type SyncCheckFn = Arc<dyn Fn(&Context) -> Result<bool, BoxError> + Send + Sync>;

/// An asynchronous check.
pub type AsyncCheckFn =
    Arc<dyn for<'a> Fn(&'a Context) -> BoxFuture<'a, Result<bool, BoxError>> + Send + Sync>;

// =============================================================================
// Checks
// =============================================================================

/// A predicate that must pass before a command is selected.
///
/// A check that returns an error counts as failed.
#[derive(Clone)]
pub enum Check {
    /// Runs inline.
    Sync(SyncCheckFn),
    /// Awaited in place.
    Async(AsyncCheckFn),
}

impl Check {
    /// Creates an infallible synchronous check.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(move |ctx: &Context| Ok::<_, BoxError>(f(ctx))))
    }

    /// Creates a fallible synchronous check.
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    /// Creates an asynchronous check.
    pub fn future<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a Context) -> BoxFuture<'a, Result<bool, BoxError>> + Send + Sync + 'static,
    {
        Self::Async(Arc::new(f))
    }

    async fn run(&self, ctx: &Context) -> Result<bool, BoxError> {
        match self {
            Self::Sync(f) => f(ctx),
            Self::Async(f) => f(ctx).await,
        }
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Check::Sync"),
            Self::Async(_) => f.write_str("Check::Async"),
        }
    }
}

/// Handle to a registered check, used to deregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CheckId(u64);

// =============================================================================
// Command
// =============================================================================

/// An executable unit bound to one or more triggers.
pub struct Command {
    name: String,
    triggers: Vec<String>,
    level: u32,
    checks: RwLock<Vec<(CheckId, Check)>>,
    next_check_id: AtomicU64,
    handler: HandlerFn,
    owner: OnceLock<Weak<EventBus>>,
}

impl Command {
    /// Starts building a command named `name`.
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    /// The command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All triggers, canonical first.
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    /// The canonical trigger.
    pub fn trigger(&self) -> &str {
        &self.triggers[0]
    }

    /// Required access level.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Returns the first trigger that `content` starts with.
    pub fn check_prefix(&self, content: &str) -> Option<&str> {
        self.triggers
            .iter()
            .find(|trigger| content.starts_with(trigger.as_str()))
            .map(String::as_str)
    }

    /// Appends a check to the chain.
    pub fn register_check(&self, check: Check) -> CheckId {
        let id = CheckId(self.next_check_id.fetch_add(1, Ordering::Relaxed));
        self.checks.write().push((id, check));
        id
    }

    /// Removes a check from the chain.
    pub fn deregister_check(&self, id: CheckId) -> FrameworkResult<()> {
        let mut checks = self.checks.write();
        let Some(position) = checks.iter().position(|(existing, _)| *existing == id) else {
            return Err(FrameworkError::CheckNotFound {
                command: self.name.clone(),
                id: id.0,
            });
        };
        checks.remove(position);
        Ok(())
    }

    /// Returns the number of registered checks (excluding the trigger match).
    pub fn check_count(&self) -> usize {
        self.checks.read().len()
    }

    /// Runs the trigger match then every registered check in order.
    ///
    /// On a trigger match the context's triggering name is bound, even if a
    /// later check fails.
    pub async fn check(&self, ctx: &mut Context) -> bool {
        let Some(trigger) = self.check_prefix(ctx.content()).map(str::to_owned) else {
            return false;
        };
        ctx.set_triggering_name(&trigger);

        let checks: Vec<Check> = self.checks.read().iter().map(|(_, c)| c.clone()).collect();
        for (index, check) in checks.iter().enumerate() {
            match check.run(ctx).await {
                Ok(true) => {}
                Ok(false) => {
                    trace!(command = %self.name, check = index, "Command check failed");
                    return false;
                }
                Err(e) => {
                    debug!(command = %self.name, check = index, error = %e, "Command check raised");
                    return false;
                }
            }
        }

        true
    }

    /// Runs the handler with the context's whitespace-split arguments.
    ///
    /// Command errors are replied to the invoker (missing reply permissions
    /// are ignored). Aborts finish quietly. Any other failure is published as
    /// an `error` event on the owning module and returned.
    pub async fn execute(&self, ctx: Arc<Context>) -> Result<(), ExecuteError> {
        let args = ctx.args();
        debug!(command = %self.name, args = args.len(), "Executing command");

        match (self.handler)(Arc::clone(&ctx), args).await {
            Ok(()) => Ok(()),
            Err(HandlerError::Command(err)) => match ctx.reply(err.response()).await {
                Ok(_) => Ok(()),
                Err(ReplyError::MissingPermissions { channel_id }) => {
                    debug!(command = %self.name, %channel_id, "Cannot reply with command error");
                    Ok(())
                }
                Err(e) => Err(ExecuteError::Reply(e)),
            },
            Err(HandlerError::Aborted) => {
                trace!(command = %self.name, "Command aborted");
                Ok(())
            }
            Err(HandlerError::Other(err)) => {
                let err: Arc<dyn std::error::Error + Send + Sync> = Arc::from(err);
                match self.owner.get().and_then(Weak::upgrade) {
                    Some(bus) => {
                        bus.dispatch(
                            CommandEvent::Error.as_str(),
                            EventPayload::Error {
                                ctx,
                                error: Arc::clone(&err),
                            },
                        );
                    }
                    None => warn!(command = %self.name, "Command has no owning module"),
                }
                Err(ExecuteError::Handler(err))
            }
        }
    }

    /// Records the owning module's event bus.
    pub(crate) fn set_owner(&self, bus: &Arc<EventBus>) -> FrameworkResult<()> {
        let weak = Arc::downgrade(bus);
        let current = self.owner.get_or_init(|| Weak::clone(&weak));
        if Weak::ptr_eq(current, &weak) {
            Ok(())
        } else {
            Err(FrameworkError::CommandAlreadyOwned {
                command: self.name.clone(),
                module: bus.owner().to_owned(),
            })
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("triggers", &self.triggers)
            .field("level", &self.level)
            .field("checks", &self.checks.read().len())
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Command`].
#[derive(Debug)]
pub struct CommandBuilder {
    name: String,
    trigger: Option<String>,
    aliases: Vec<String>,
    level: u32,
    checks: Vec<Check>,
}

impl CommandBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trigger: None,
            aliases: Vec::new(),
            level: 0,
            checks: Vec::new(),
        }
    }

    /// Sets the canonical trigger. Defaults to the name with `_` as spaces.
    pub fn trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    /// Adds an alias trigger.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Sets the required access level.
    pub fn level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Appends a check.
    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    /// Finishes the command with an async handler.
    pub fn handler<F, Fut>(self, f: F) -> Command
    where
        F: Fn(Arc<Context>, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.handler_boxed(Arc::new(move |ctx, args| f(ctx, args).boxed()))
    }

    /// Finishes the command with a pre-boxed handler.
    pub fn handler_boxed(self, handler: HandlerFn) -> Command {
        let canonical = match self.trigger {
            Some(trigger) if !trigger.is_empty() => trigger,
            _ => self.name.replace('_', " "),
        };

        let mut triggers = Vec::with_capacity(1 + self.aliases.len());
        triggers.push(canonical);
        triggers.extend(self.aliases.into_iter().filter(|alias| !alias.is_empty()));

        let checks = self
            .checks
            .into_iter()
            .enumerate()
            .map(|(index, check)| (CheckId(index as u64), check))
            .collect::<Vec<_>>();

        Command {
            name: self.name,
            triggers,
            level: self.level,
            next_check_id: AtomicU64::new(checks.len() as u64),
            checks: RwLock::new(checks),
            handler,
            owner: OnceLock::new(),
        }
    }
}
