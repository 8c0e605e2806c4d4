//! The command client: routes inbound messages to commands.
//!
//! For every message the client runs a fixed pipeline:
//!
//! 1. Resolve the effective prefixes (guild prefix first, then the global
//!    ones) and find the one the message starts with, falling back to a
//!    mention of the bot.
//! 2. Strip the prefix or mention.
//! 3. Scan commands, the client's own first and then each module's in load
//!    order, running each command's check chain.
//! 4. Skip commands the author lacks the access level for and keep scanning.
//!    Running out of commands ends dispatch silently.
//! 5. Strip the matched trigger and its separator from the content.
//! 6. Execute the command.
//!
//! # Tower Service Integration
//!
//! `Client` implements `tower::Service<Message>`, so middleware can wrap the
//! whole pipeline:
//!
//! ```rust,ignore
//! use tower::ServiceBuilder;
//! use tower::limit::ConcurrencyLimitLayer;
//!
//! let service = ServiceBuilder::new()
//!     .layer(ConcurrencyLimitLayer::new(64))
//!     .service(client.clone());
//! ```

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context as TaskContext, Poll};

use serde_json::Value;
use tower::Service;
use tracing::{Instrument, debug, debug_span, error, info, trace};

use crate::access::AccessPolicy;
use crate::command::{BoxFuture, Command};
use crate::context::{Context, TriggerKind};
use crate::error::{ExecuteError, FrameworkError, FrameworkResult};
use crate::event::{CommandEvent, EventPayload, ListenerFn, spawn_listeners};
use crate::module::Module;
use crate::registry::{LoadContext, ModuleRegistry};
use crate::resolver::BackoffConfig;
use reinhard_core::{GatewayEvent, GuildPrefixProvider, Message, Services, Snowflake};

/// Name of the module holding the client's own commands.
pub const CLIENT_MODULE: &str = "client";

/// What happened to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The message did not start with a prefix or mention.
    NoTrigger,
    /// No command matched that the author may run.
    NoCommand,
    /// A command ran.
    Executed {
        /// The command's name.
        command: String,
    },
}

struct ClientInner {
    prefixes: Vec<String>,
    own: Module,
    modules: Vec<Module>,
    access: AccessPolicy,
    guild_prefix: Option<Arc<dyn GuildPrefixProvider>>,
    bot_user_id: Option<Snowflake>,
    services: Arc<Services>,
    platform_listeners: HashMap<String, Vec<ListenerFn>>,
    started: AtomicBool,
}

/// The command dispatcher.
///
/// Cheap to clone; all state is shared and read-only after
/// [`ClientBuilder::build`].
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Starts building a client around the injected capabilities.
    pub fn builder(services: Arc<Services>) -> ClientBuilder {
        ClientBuilder::new(services)
    }

    /// The global prefixes.
    pub fn prefixes(&self) -> &[String] {
        &self.inner.prefixes
    }

    /// The access policy.
    pub fn access(&self) -> &AccessPolicy {
        &self.inner.access
    }

    /// The injected capabilities.
    pub fn services(&self) -> &Arc<Services> {
        &self.inner.services
    }

    /// The bot's own user id, if mention triggers are enabled.
    pub fn bot_user_id(&self) -> Option<Snowflake> {
        self.inner.bot_user_id
    }

    /// Loaded modules in load order, excluding the client's own.
    pub fn modules(&self) -> &[Module] {
        &self.inner.modules
    }

    /// Looks up a module by name, including the client's own.
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.all_modules().find(|module| module.name() == name)
    }

    /// Number of platform listeners registered for `event`.
    pub fn platform_listener_count(&self, event: &str) -> usize {
        self.inner.platform_listeners.get(event).map_or(0, Vec::len)
    }

    fn all_modules(&self) -> impl Iterator<Item = &Module> {
        std::iter::once(&self.inner.own).chain(self.inner.modules.iter())
    }

    /// Returns the prefixes that apply in `guild_id`.
    ///
    /// A guild prefix, when the provider returns a non-empty one, comes
    /// before the global prefixes.
    pub async fn resolve_effective_prefixes(&self, guild_id: Option<Snowflake>) -> Vec<String> {
        let (Some(guild_id), Some(provider)) = (guild_id, &self.inner.guild_prefix) else {
            return self.inner.prefixes.clone();
        };

        match provider.guild_prefix(guild_id).await {
            Some(prefix) if !prefix.is_empty() => {
                let mut prefixes = Vec::with_capacity(self.inner.prefixes.len() + 1);
                prefixes.push(prefix);
                prefixes.extend(self.inner.prefixes.iter().cloned());
                prefixes
            }
            _ => self.inner.prefixes.clone(),
        }
    }

    /// Yields every `(command, trigger)` matching `content` across the client
    /// and all modules, in scan order.
    pub fn command_from_name<'a>(
        &'a self,
        content: &'a str,
    ) -> impl Iterator<Item = (&'a Arc<Command>, &'a str)> + 'a {
        self.all_modules()
            .flat_map(move |module| module.match_by_content(content))
    }

    /// Runs the full dispatch pipeline for one message.
    pub async fn handle_message(&self, message: Message) -> Result<DispatchOutcome, ExecuteError> {
        let span = debug_span!(
            "dispatch",
            message_id = %message.id,
            channel_id = %message.channel_id,
        );
        self.dispatch(message).instrument(span).await
    }

    async fn dispatch(&self, message: Message) -> Result<DispatchOutcome, ExecuteError> {
        let Some((content, trigger, kind)) = self.resolve_trigger(&message).await else {
            trace!("No prefix or mention");
            return Ok(DispatchOutcome::NoTrigger);
        };

        let mut ctx = Context::new(
            Arc::new(message),
            content,
            trigger,
            kind,
            Arc::clone(&self.inner.services),
        );

        let Some(command) = self.find_command(&mut ctx).await else {
            trace!(content = %ctx.content(), "No command matched");
            return Ok(DispatchOutcome::NoCommand);
        };

        ctx.set_command(Arc::clone(&command));
        let consumed = ctx.triggering_name().map_or(0, |name| name.chars().count()) + 1;
        ctx.prune(consumed);

        command.execute(Arc::new(ctx)).await?;
        Ok(DispatchOutcome::Executed {
            command: command.name().to_owned(),
        })
    }

    /// Finds the prefix or mention a message starts with.
    ///
    /// Returns the remaining content, the trigger and its kind.
    async fn resolve_trigger(&self, message: &Message) -> Option<(String, String, TriggerKind)> {
        for prefix in self.resolve_effective_prefixes(message.guild_id).await {
            if let Some(rest) = message.content.strip_prefix(prefix.as_str()) {
                return Some((rest.to_owned(), prefix, TriggerKind::Prefix));
            }
        }

        let bot_user_id = self.inner.bot_user_id?;
        [format!("<@{bot_user_id}>"), format!("<@!{bot_user_id}>")]
            .into_iter()
            .find_map(|mention| {
                message
                    .content
                    .strip_prefix(mention.as_str())
                    .map(|rest| (rest.trim_start().to_owned(), mention.clone(), TriggerKind::Mention))
            })
    }

    async fn find_command(&self, ctx: &mut Context) -> Option<Arc<Command>> {
        let author_id = ctx.author_id();
        for module in self.all_modules() {
            for command in module.commands() {
                if !command.check(ctx).await {
                    continue;
                }
                if self.inner.access.permits(author_id, command.level()) {
                    return Some(Arc::clone(command));
                }
                debug!(
                    command = %command.name(),
                    required = command.level(),
                    %author_id,
                    "Insufficient access level, continuing scan"
                );
            }
        }
        None
    }

    /// Handles a created message, logging instead of returning failures.
    pub async fn on_message_create(&self, message: Message) {
        match self.handle_message(message).await {
            Ok(DispatchOutcome::Executed { command }) => debug!(%command, "Command executed"),
            Ok(_) => {}
            Err(e) => error!(error = %e, "Command execution failed"),
        }
    }

    /// Routes a gateway event.
    ///
    /// Platform listeners for the event's name are spawned; created messages
    /// then go through the command pipeline.
    pub async fn dispatch_gateway_event(&self, event: GatewayEvent) {
        let event = Arc::new(event);
        if let Some(listeners) = self.inner.platform_listeners.get(event.name()) {
            spawn_listeners(
                CLIENT_MODULE,
                event.name(),
                listeners,
                &EventPayload::Gateway(Arc::clone(&event)),
            );
        }

        if let GatewayEvent::MessageCreate(message) = event.as_ref() {
            self.on_message_create(message.clone()).await;
        }
    }

    /// Publishes `load` on every module, the client's own included.
    ///
    /// Only the first call publishes; later calls return `false`.
    pub async fn start(&self) -> bool {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            return false;
        }
        for module in self.all_modules() {
            module.dispatch_event(
                CommandEvent::Load.as_str(),
                EventPayload::Load {
                    module: module.name().to_owned(),
                },
            );
        }
        info!(modules = self.inner.modules.len(), "Command client started");
        true
    }

    /// Publishes `unload` on every module.
    pub fn shutdown(&self) {
        for module in self.all_modules() {
            module.dispatch_event(
                CommandEvent::Unload.as_str(),
                EventPayload::Unload {
                    module: module.name().to_owned(),
                },
            );
        }
        info!(modules = self.inner.modules.len(), "Command client shut down");
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("prefixes", &self.inner.prefixes)
            .field(
                "modules",
                &self.inner.modules.iter().map(Module::name).collect::<Vec<_>>(),
            )
            .field("bot_user_id", &self.inner.bot_user_id)
            .finish()
    }
}

// ============================================================================
// Tower Service Implementation for Client
// ============================================================================

impl Service<Message> for Client {
    type Response = DispatchOutcome;
    type Error = ExecuteError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, message: Message) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.handle_message(message).await })
    }
}

/// A fire-and-forget view of the client for gateway event streams.
impl Service<GatewayEvent> for Client {
    type Response = ();
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: GatewayEvent) -> Self::Future {
        let client = self.clone();
        Box::pin(async move {
            client.dispatch_gateway_event(event).await;
            Ok(())
        })
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Client`].
pub struct ClientBuilder {
    services: Arc<Services>,
    prefixes: Vec<String>,
    access: AccessPolicy,
    guild_prefix: Option<Arc<dyn GuildPrefixProvider>>,
    bot_user_id: Option<Snowflake>,
    commands: Vec<Command>,
    listeners: Vec<(String, ListenerFn)>,
    registry: ModuleRegistry,
    module_ids: Vec<String>,
    module_settings: HashMap<String, Value>,
    backoff: BackoffConfig,
}

impl ClientBuilder {
    fn new(services: Arc<Services>) -> Self {
        Self {
            services,
            prefixes: Vec::new(),
            access: AccessPolicy::default(),
            guild_prefix: None,
            bot_user_id: None,
            commands: Vec::new(),
            listeners: Vec::new(),
            registry: ModuleRegistry::default(),
            module_ids: Vec::new(),
            module_settings: HashMap::new(),
            backoff: BackoffConfig::default(),
        }
    }

    /// Adds a global prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    /// Adds several global prefixes.
    pub fn prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes.extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Sets the access policy.
    pub fn access(mut self, access: AccessPolicy) -> Self {
        self.access = access;
        self
    }

    /// Sets the per-guild prefix provider.
    pub fn guild_prefix<P>(mut self, provider: P) -> Self
    where
        P: GuildPrefixProvider + 'static,
    {
        self.guild_prefix = Some(Arc::new(provider));
        self
    }

    /// Enables mention triggers for the given bot user.
    pub fn bot_user_id(mut self, id: impl Into<Snowflake>) -> Self {
        self.bot_user_id = Some(id.into());
        self
    }

    /// Adds a command owned by the client itself.
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Adds a listener owned by the client itself.
    pub fn listen(mut self, event: impl Into<String>, listener: ListenerFn) -> Self {
        self.listeners.push((event.into(), listener));
        self
    }

    /// Sets the module registry used to resolve identifiers.
    pub fn registry(mut self, registry: ModuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Queues a module identifier for loading.
    pub fn module(mut self, identifier: impl Into<String>) -> Self {
        self.module_ids.push(identifier.into());
        self
    }

    /// Queues several module identifiers for loading.
    pub fn modules<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.module_ids.extend(identifiers.into_iter().map(Into::into));
        self
    }

    /// Sets the settings section handed to the module named `name`.
    pub fn module_settings(mut self, name: impl Into<String>, settings: Value) -> Self {
        self.module_settings.insert(name.into(), settings);
        self
    }

    /// Sets the retry schedule handed to module factories.
    pub fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Loads every queued module and binds everything.
    ///
    /// Fails without a partially loaded client if any identifier has no
    /// factories or two modules share a name. No `load` event is published
    /// until [`Client::start`].
    pub fn build(self) -> FrameworkResult<Client> {
        let mut platform_listeners: HashMap<String, Vec<ListenerFn>> = HashMap::new();
        let mut collect = |module: &mut Module| {
            for (event, listener) in module.take_platform_listeners() {
                platform_listeners.entry(event).or_default().push(listener);
            }
        };

        let mut own = Module::new(CLIENT_MODULE);
        for command in self.commands {
            own = own.command(command);
        }
        for (event, listener) in self.listeners {
            own = own.listen(event, listener);
        }
        own.bind()?;
        own.bind_listeners();
        collect(&mut own);

        let mut modules: Vec<Module> = Vec::new();
        for identifier in &self.module_ids {
            for descriptor in self.registry.resolve(identifier)? {
                let settings = self
                    .module_settings
                    .get(descriptor.name)
                    .cloned()
                    .unwrap_or(Value::Null);
                let ctx = LoadContext::new(
                    identifier.as_str(),
                    descriptor.name,
                    Arc::new(settings),
                    Arc::clone(&self.services),
                    self.backoff.clone(),
                );

                let mut module = descriptor.instantiate(&ctx);
                if module.name() == CLIENT_MODULE
                    || modules.iter().any(|loaded| loaded.name() == module.name())
                {
                    return Err(FrameworkError::DuplicateModule(module.name().to_owned()));
                }

                module.bind()?;
                module.bind_listeners();
                collect(&mut module);

                info!(
                    module = %module.name(),
                    identifier = %identifier,
                    commands = module.commands().len(),
                    "Loaded module"
                );
                modules.push(module);
            }
        }

        Ok(Client {
            inner: Arc::new(ClientInner {
                prefixes: self.prefixes,
                own,
                modules,
                access: self.access,
                guild_prefix: self.guild_prefix,
                bot_user_id: self.bot_user_id,
                services: self.services,
                platform_listeners,
                started: AtomicBool::new(false),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::event::listener;
    use crate::registry::ModuleDescriptor;
    use crate::testing::{AUTHOR_ID, BOT_ID, GUILD_ID, RecordingReplies, message, services};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    type Calls = mpsc::UnboundedReceiver<(String, Vec<String>)>;

    fn recording(name: &str, trigger: &str, level: u32) -> (Command, Calls) {
        let (tx, rx) = mpsc::unbounded_channel();
        let name_owned = name.to_owned();
        let command = Command::builder(name)
            .trigger(trigger)
            .level(level)
            .handler(move |_, args| {
                let tx = tx.clone();
                let name = name_owned.clone();
                async move {
                    tx.send((name, args)).ok();
                    Ok(())
                }
            });
        (command, rx)
    }

    fn client(commands: Vec<Command>) -> (Client, Arc<RecordingReplies>) {
        let (services, replies) = services();
        let mut builder = Client::builder(services).prefix("!");
        for command in commands {
            builder = builder.command(command);
        }
        (builder.build().unwrap(), replies)
    }

    #[tokio::test]
    async fn test_echo_scenario() {
        let (echo, mut calls) = recording("echo", "echo", 0);
        let (client, _) = client(vec![echo]);

        let outcome = client.handle_message(message(None, "!echo hi")).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Executed { command: "echo".into() });
        assert_eq!(calls.recv().await.unwrap(), ("echo".to_string(), vec!["hi".to_string()]));
    }

    #[tokio::test]
    async fn test_message_without_prefix_is_ignored() {
        let (echo, mut calls) = recording("echo", "echo", 0);
        let (client, replies) = client(vec![echo]);

        let outcome = client.handle_message(message(None, "echo hi")).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::NoTrigger);
        assert!(calls.try_recv().is_err());
        assert!(replies.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_is_ignored() {
        let (client, replies) = client(Vec::new());
        let outcome = client.handle_message(message(None, "!nothing")).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::NoCommand);
        assert!(replies.sent().is_empty());
    }

    #[tokio::test]
    async fn test_access_level_boundary() {
        let (services, replies) = services();
        let (admin, mut calls) = recording("admin", "admin", 2);
        let client = Client::builder(Arc::clone(&services))
            .prefix("!")
            .access(AccessPolicy::new().with_level(AUTHOR_ID, 2))
            .command(admin)
            .build()
            .unwrap();
        assert_eq!(
            client.handle_message(message(None, "!admin")).await.unwrap(),
            DispatchOutcome::Executed { command: "admin".into() }
        );
        assert!(calls.recv().await.is_some());

        let (admin, mut calls) = recording("admin", "admin", 3);
        let client = Client::builder(services)
            .prefix("!")
            .access(AccessPolicy::new().with_level(AUTHOR_ID, 2))
            .command(admin)
            .build()
            .unwrap();
        assert_eq!(
            client.handle_message(message(None, "!admin")).await.unwrap(),
            DispatchOutcome::NoCommand
        );
        assert!(calls.try_recv().is_err());
        assert!(replies.sent().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_access_keeps_scanning() {
        let (restricted, mut restricted_calls) = recording("ping_b", "ping", 5);
        let (open, mut open_calls) = recording("ping_a", "ping", 0);
        let (client, _) = client(vec![open, restricted]);

        let outcome = client.handle_message(message(None, "!ping")).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Executed { command: "ping_a".into() });
        assert!(open_calls.recv().await.is_some());
        assert!(restricted_calls.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_guild_prefix_takes_precedence() {
        let (services, _) = services();
        let (ping, mut calls) = recording("ping", "ping", 0);
        let client = Client::builder(services)
            .prefix("!")
            .guild_prefix(|guild_id: Snowflake| {
                (guild_id == Snowflake(GUILD_ID)).then(|| "!!".to_string())
            })
            .command(ping)
            .build()
            .unwrap();

        assert_eq!(
            client.resolve_effective_prefixes(Some(Snowflake(GUILD_ID))).await,
            ["!!", "!"]
        );
        assert_eq!(client.resolve_effective_prefixes(None).await, ["!"]);
        assert_eq!(client.resolve_effective_prefixes(Some(Snowflake(1))).await, ["!"]);

        let outcome = client
            .handle_message(message(Some(GUILD_ID), "!!ping"))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Executed { command: "ping".into() });
        assert!(calls.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_mention_trigger() {
        let (services, _) = services();
        let (echo, mut calls) = recording("echo", "echo", 0);
        let client = Client::builder(services)
            .prefix("!")
            .bot_user_id(BOT_ID)
            .command(echo)
            .build()
            .unwrap();

        let content = format!("<@{BOT_ID}> echo hi");
        client.handle_message(message(None, &content)).await.unwrap();
        assert_eq!(calls.recv().await.unwrap().1, ["hi"]);

        let content = format!("<@!{BOT_ID}>echo there");
        client.handle_message(message(None, &content)).await.unwrap();
        assert_eq!(calls.recv().await.unwrap().1, ["there"]);

        let outcome = client.handle_message(message(None, "<@1> echo")).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::NoTrigger);
    }

    fn utility(_: &LoadContext) -> Module {
        Module::new("utility")
            .command(
                Command::builder("ping")
                    .handler(|ctx, _| async move {
                        ctx.reply("module pong").await?;
                        Ok(())
                    }),
            )
            .command(Command::builder("uptime").handler(|ctx, _| async move {
                ctx.reply("up").await?;
                Ok(())
            }))
    }

    fn broken(_: &LoadContext) -> Module {
        Module::new("broken").command(
            Command::builder("crash").handler(|_, _| async { Err(HandlerError::Other("kaboom".into())) }),
        )
    }

    fn registry() -> ModuleRegistry {
        ModuleRegistry::new()
            .with("reinhard.modules.utility", ModuleDescriptor::new("utility", utility))
            .with("reinhard.modules.broken", ModuleDescriptor::new("broken", broken))
            .with("reinhard.modules.copy", ModuleDescriptor::new("utility", utility))
    }

    #[tokio::test]
    async fn test_own_commands_are_scanned_before_modules() {
        let (services, replies) = services();
        let client = Client::builder(services)
            .prefix("!")
            .command(Command::builder("ping").handler(|ctx, _| async move {
                ctx.reply("client pong").await?;
                Ok(())
            }))
            .registry(registry())
            .module("reinhard.modules.utility")
            .build()
            .unwrap();

        client.handle_message(message(None, "!ping")).await.unwrap();
        client.handle_message(message(None, "!uptime")).await.unwrap();
        assert_eq!(replies.contents(), ["client pong", "up"]);

        let names: Vec<_> = client
            .command_from_name("ping")
            .map(|(command, _)| command.name().to_owned())
            .collect();
        assert_eq!(names, ["ping", "ping"]);
        assert!(client.module("utility").is_some());
        assert!(client.module(CLIENT_MODULE).is_some());
    }

    #[test]
    fn test_unknown_module_identifier_is_fatal() {
        let (services, _) = services();
        let result = Client::builder(services)
            .registry(registry())
            .module("reinhard.modules.missing")
            .build();
        assert!(matches!(result, Err(FrameworkError::NoModules(id)) if id == "reinhard.modules.missing"));
    }

    #[test]
    fn test_duplicate_module_name_is_fatal() {
        let (services, _) = services();
        let result = Client::builder(services)
            .registry(registry())
            .modules(["reinhard.modules.utility", "reinhard.modules.copy"])
            .build();
        assert!(matches!(result, Err(FrameworkError::DuplicateModule(name)) if name == "utility"));
    }

    #[tokio::test]
    async fn test_handler_failure_reaches_boundary() {
        let (services, replies) = services();
        let client = Client::builder(services)
            .prefix("!")
            .registry(registry())
            .module("reinhard.modules.broken")
            .build()
            .unwrap();

        let result = client.handle_message(message(None, "!crash")).await;
        assert!(matches!(result, Err(ExecuteError::Handler(_))));

        // The logging boundary swallows the failure.
        client.on_message_create(message(None, "!crash")).await;
        assert!(replies.sent().is_empty());
    }

    fn greeter(_: &LoadContext) -> Module {
        Module::new("greeter")
            .listen(
                "guild_member_add",
                listener(|payload| async move {
                    if let EventPayload::Gateway(event) = payload {
                        GREETED.send(event.name().to_owned());
                    }
                    Ok(())
                }),
            )
            .listen(
                "load",
                listener(|payload| async move {
                    if let EventPayload::Load { module } = payload {
                        GREETED.send(format!("loaded {module}"));
                    }
                    Ok(())
                }),
            )
    }

    /// Test-only sink shared with the plain-fn module factory above.
    struct Greeted(parking_lot::Mutex<Option<mpsc::UnboundedSender<String>>>);

    impl Greeted {
        fn send(&self, value: String) {
            if let Some(tx) = self.0.lock().as_ref() {
                tx.send(value).ok();
            }
        }
    }

    static GREETED: Greeted = Greeted(parking_lot::Mutex::new(None));

    #[tokio::test]
    async fn test_platform_and_load_listeners() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        *GREETED.0.lock() = Some(tx);

        let (services, _) = services();
        let client = Client::builder(services)
            .prefix("!")
            .registry(ModuleRegistry::new().with("greeter", ModuleDescriptor::new("greeter", greeter)))
            .module("greeter")
            .build()
            .unwrap();

        assert!(client.start().await);
        assert_eq!(rx.recv().await.unwrap(), "loaded greeter");
        assert_eq!(client.platform_listener_count("guild_member_add"), 1);

        client
            .dispatch_gateway_event(GatewayEvent::Other {
                name: "guild_member_add".into(),
                payload: Value::Null,
            })
            .await;
        assert_eq!(rx.recv().await.unwrap(), "guild_member_add");
    }

    #[tokio::test]
    async fn test_gateway_message_runs_pipeline() {
        let (echo, mut calls) = recording("echo", "echo", 0);
        let (client, _) = client(vec![echo]);

        client
            .dispatch_gateway_event(GatewayEvent::MessageCreate(message(None, "!echo a b")))
            .await;
        assert_eq!(calls.recv().await.unwrap().1, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_client_as_tower_service() {
        let (echo, mut calls) = recording("echo", "echo", 0);
        let (client, _) = client(vec![echo]);

        let outcome = client.clone().oneshot(message(None, "!echo")).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Executed { command: "echo".into() });
        assert_eq!(calls.recv().await.unwrap().1, Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_start_loads_own_module_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (services, _) = services();
        let client = Client::builder(services)
            .prefix("!")
            .listen(
                "load",
                listener(move |payload| {
                    let tx = tx.clone();
                    async move {
                        if let EventPayload::Load { module } = payload {
                            tx.send(module).ok();
                        }
                        Ok(())
                    }
                }),
            )
            .build()
            .unwrap();

        assert!(client.start().await);
        assert_eq!(rx.recv().await.unwrap(), CLIENT_MODULE);

        assert!(!client.start().await);
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
