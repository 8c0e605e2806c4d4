//! # Reinhard Framework
//!
//! Command routing and resilient lookups on top of `reinhard-core`.
//!
//! This layer provides:
//! - [`Command`]s with triggers, access levels and check chains
//! - [`Module`]s grouping commands with a per-module [`EventBus`]
//! - The [`Client`] dispatcher: prefix resolution, matching, access gating
//! - A static [`ModuleRegistry`] mapping identifiers to module factories
//! - Resilient member / role / user resolvers with bounded backoff
//!
//! ```rust,ignore
//! use reinhard_framework::{Command, CommandError, Module, ModuleDescriptor};
//!
//! fn utility(_: &LoadContext) -> Module {
//!     Module::new("utility").command(Command::builder("echo").handler(|ctx, args| async move {
//!         ctx.reply(args.join(" ")).await?;
//!         Ok(())
//!     }))
//! }
//!
//! registry.register("reinhard.modules.utility", ModuleDescriptor::new("utility", utility));
//! ```

pub mod access;
pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod module;
pub mod registry;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use access::AccessPolicy;
pub use command::{BoxFuture, Check, CheckId, Command, CommandBuilder, HandlerFn};
pub use context::{Context, MAX_MESSAGE_LENGTH, OVERSIZE_PLACEHOLDER, TriggerKind, sanitize_content};
pub use dispatcher::{CLIENT_MODULE, Client, ClientBuilder, DispatchOutcome};
pub use error::{
    BoxError, CommandError, ExecuteError, FrameworkError, FrameworkResult, HandlerError,
    ResolveError,
};
pub use event::{CommandEvent, EventBus, EventPayload, ListenerFn, listener};
pub use module::Module;
pub use registry::{LoadContext, ModuleDescriptor, ModuleRegistry};
pub use resolver::{
    Backoff, BackoffConfig, ErrorRuleTable, FailureKind, MemberResolver, ResilientResolver,
    RoleResolver, RuleAction, UserResolver, parse_id,
};
