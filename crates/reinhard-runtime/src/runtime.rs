//! Main runtime orchestration.
//!
//! The runtime owns the loaded configuration and the command [`Client`].
//! The platform connection feeds it gateway events over an mpsc channel;
//! each event is dispatched on its own task until Ctrl+C, SIGTERM or the
//! channel closing stops the loop.
//!
//! ```rust,ignore
//! use reinhard_runtime::ReinhardRuntime;
//!
//! let runtime = ReinhardRuntime::builder(services)
//!     .config_file("reinhard.toml")
//!     .registry(modules::registry())
//!     .schema_executor(postgres)
//!     .build()?;
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(256);
//! gateway.forward_to(tx);
//! runtime.run(rx).await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigLoader, ReinhardConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;
use crate::sql::{CachedScripts, SchemaExecutor, initialise_schema};
use reinhard_core::{GatewayEvent, Services};
use reinhard_framework::{Client, ClientBuilder, ModuleRegistry};

type ClientHook = Box<dyn FnOnce(ClientBuilder) -> ClientBuilder + Send>;

/// The running bot: configuration, command client and event loop.
pub struct ReinhardRuntime {
    config: ReinhardConfig,
    client: Client,
    scripts: Option<Arc<CachedScripts>>,
    schema_executor: Option<Arc<dyn SchemaExecutor>>,
    shutdown: CancellationToken,
}

impl ReinhardRuntime {
    /// Creates a runtime builder around the platform capabilities.
    pub fn builder(services: Arc<Services>) -> RuntimeBuilder {
        RuntimeBuilder::new(services)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReinhardConfig {
        &self.config
    }

    /// Returns the command client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the loaded SQL scripts, if a database is configured.
    pub fn scripts(&self) -> Option<&Arc<CachedScripts>> {
        self.scripts.as_ref()
    }

    /// Returns a token that stops the event loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the schema script, if a database is configured.
    pub async fn initialise(&self) -> RuntimeResult<()> {
        let Some(scripts) = &self.scripts else {
            debug!("No database configured, skipping schema bootstrap");
            return Ok(());
        };

        match &self.schema_executor {
            Some(executor) => initialise_schema(scripts, executor.as_ref()).await?,
            None => warn!("Database configured without a schema executor, skipping schema bootstrap"),
        }
        Ok(())
    }

    /// Runs until Ctrl+C, SIGTERM, cancellation or the event channel closing.
    pub async fn run(&self, events: mpsc::Receiver<GatewayEvent>) -> RuntimeResult<()> {
        let token = self.shutdown.clone();
        let signals = tokio::spawn(async move {
            tokio::select! {
                () = wait_for_signal() => token.cancel(),
                () = token.cancelled() => {}
            }
        });

        info!("Reinhard is now running. Press Ctrl+C to stop.");
        let result = self.run_until(events, std::future::pending()).await;
        signals.abort();
        result
    }

    /// Runs until `shutdown` completes, cancellation or the channel closing.
    pub async fn run_until<F>(
        &self,
        events: mpsc::Receiver<GatewayEvent>,
        shutdown: F,
    ) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.initialise().await?;
        self.client.start().await;

        tokio::select! {
            () = shutdown => {
                info!("Shutdown requested");
                self.shutdown.cancel();
            }
            () = self.event_loop(events) => {}
        }

        self.client.shutdown();
        info!("Runtime stopped");
        Ok(())
    }

    async fn event_loop(&self, mut events: mpsc::Receiver<GatewayEvent>) {
        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    info!("Runtime cancelled, stopping event loop");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("Event stream closed, stopping event loop");
                        break;
                    };
                    let client = self.client.clone();
                    tokio::spawn(async move {
                        client.dispatch_gateway_event(event).await;
                    });
                }
            }
        }
    }
}

impl std::fmt::Debug for ReinhardRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReinhardRuntime")
            .field("client", &self.client)
            .field("scripts", &self.scripts.as_ref().map(|s| s.len()))
            .field("cancelled", &self.shutdown.is_cancelled())
            .finish()
    }
}

/// Waits for Ctrl+C or, on unix, SIGTERM.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = signal::ctrl_c() => {
                        if let Err(e) = result {
                            error!(error = %e, "Failed to listen for Ctrl+C");
                            return std::future::pending().await;
                        }
                        info!("Received Ctrl+C, shutting down");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`ReinhardRuntime`].
pub struct RuntimeBuilder {
    services: Arc<Services>,
    config_loader: ConfigLoader,
    config: Option<ReinhardConfig>,
    registry: ModuleRegistry,
    client_hooks: Vec<ClientHook>,
    schema_executor: Option<Arc<dyn SchemaExecutor>>,
    init_logging: bool,
}

impl RuntimeBuilder {
    /// Creates a builder searching the current directory for config files.
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            services,
            config_loader: ConfigLoader::new().with_current_dir().with_user_config_dir(),
            config: None,
            registry: ModuleRegistry::new(),
            client_hooks: Vec::new(),
            schema_executor: None,
            init_logging: true,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Uses this configuration instead of loading one.
    pub fn config(mut self, config: ReinhardConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the module registry.
    pub fn registry(mut self, registry: ModuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Customises the command client after the configuration is applied.
    ///
    /// ```rust,ignore
    /// builder.configure_client(|client| client.guild_prefix(prefixes).command(help))
    /// ```
    pub fn configure_client<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(ClientBuilder) -> ClientBuilder + Send + 'static,
    {
        self.client_hooks.push(Box::new(hook));
        self
    }

    /// Sets the executor used for the schema bootstrap.
    pub fn schema_executor(mut self, executor: Arc<dyn SchemaExecutor>) -> Self {
        self.schema_executor = Some(executor);
        self
    }

    /// Leaves the global tracing subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Loads and validates the configuration, then loads every module.
    pub fn build(self) -> RuntimeResult<ReinhardRuntime> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_loader.load()?,
        };
        validate_config(&config)?;

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let mut client = Client::builder(self.services)
            .prefixes(config.prefixes.iter().cloned())
            .access(config.access_policy()?)
            .registry(self.registry)
            .modules(config.modules.iter().cloned())
            .backoff(config.resolver.clone());
        if let Some(bot_user_id) = config.bot_user_id {
            client = client.bot_user_id(bot_user_id);
        }
        for (module, settings) in &config.module_settings {
            client = client.module_settings(module.clone(), settings.clone());
        }
        for hook in self.client_hooks {
            client = hook(client);
        }
        let client = client.build()?;

        let scripts = match &config.database {
            Some(database) => Some(Arc::new(CachedScripts::from_dir(&database.scripts_dir)?)),
            None => None,
        };

        info!(
            prefixes = ?config.prefixes,
            modules = client.modules().len(),
            scripts = scripts.as_ref().map_or(0, |s| s.len()),
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Ok(ReinhardRuntime {
            config,
            client,
            scripts,
            schema_executor: self.schema_executor,
            shutdown: CancellationToken::new(),
        })
    }
}
