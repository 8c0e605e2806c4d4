//! # Reinhard
//!
//! A command-routing layer for chat bots with resilient entity lookups.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌───────────────────────────────┐
//! │   Runtime   │────▶│      Client      │────▶│ client commands                │
//! │ (event loop)│     │ prefix / mention │────▶│ module "utility" (+ EventBus)  │──▶ handler
//! └─────────────┘     │  access gating   │────▶│ module ...                     │
//!                     └──────────────────┘     └───────────────────────────────┘
//!                                                          │
//!                                               MemberResolver / RoleResolver /
//!                                               UserResolver (backoff + rules)
//! ```
//!
//! - **Runtime**: configuration, logging, SQL bootstrap and the event loop
//! - **Client**: resolves the prefix, finds the command, checks access
//! - **Modules**: named command groups with their own event bus
//! - **Resolvers**: cache-then-remote lookups with bounded retries
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reinhard::prelude::*;
//!
//! fn utility(_: &LoadContext) -> Module {
//!     Module::new("utility").command(Command::builder("echo").handler(|ctx, args| async move {
//!         ctx.reply_sanitized(args.join(" ")).await?;
//!         Ok(())
//!     }))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ModuleRegistry::new()
//!         .with("reinhard.modules.utility", ModuleDescriptor::new("utility", utility));
//!
//!     let runtime = ReinhardRuntime::builder(services).registry(registry).build()?;
//!     runtime.run(gateway_events).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON console logs

pub use reinhard_core as core;
pub use reinhard_framework as framework;
pub use reinhard_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use reinhard::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use reinhard_runtime::{ReinhardConfig, ReinhardRuntime, SchemaExecutor};

    // Commands and modules
    pub use reinhard_framework::{
        AccessPolicy, Check, Client, Command, CommandError, Context, HandlerError, LoadContext,
        Module, ModuleDescriptor, ModuleRegistry, listener,
    };

    // Events
    pub use reinhard_framework::{CommandEvent, EventPayload};

    // Resolvers
    pub use reinhard_framework::{MemberResolver, ResolveError, RoleResolver, UserResolver};

    // Platform types and capabilities
    pub use reinhard_core::{
        EntityCache, EntityRest, GatewayEvent, GuildPrefixProvider, Member, Message,
        OutgoingMessage, ReplySink, Role, Services, Snowflake, User,
    };
}
