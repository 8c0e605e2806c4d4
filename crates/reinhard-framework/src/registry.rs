//! Static module registry.
//!
//! The host application maps each module identifier (as listed in the
//! configuration) to the factories that build its modules:
//!
//! ```rust,ignore
//! let mut registry = ModuleRegistry::new();
//! registry
//!     .register("reinhard.modules.basic", ModuleDescriptor::new("basic", basic::module))
//!     .register("reinhard.modules.basic", ModuleDescriptor::new("help", basic::help))
//!     .register("reinhard.modules.moderation", ModuleDescriptor::new("moderation", moderation::module));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{FrameworkError, FrameworkResult};
use crate::module::Module;
use crate::resolver::BackoffConfig;
use reinhard_core::Services;

// ─── ModuleDescriptor ─────────────────────────────────────────────────────────

/// A static, `Copy` handle that builds one module.
#[derive(Debug, Clone, Copy)]
pub struct ModuleDescriptor {
    /// Module name; unique across loaded modules and used as the settings key.
    pub name: &'static str,

    /// Factory creating the unbound module.
    pub create: fn(&LoadContext) -> Module,
}

impl ModuleDescriptor {
    /// Creates a descriptor.
    pub const fn new(name: &'static str, create: fn(&LoadContext) -> Module) -> Self {
        Self { name, create }
    }

    /// Runs the factory.
    #[inline]
    pub fn instantiate(&self, ctx: &LoadContext) -> Module {
        (self.create)(ctx)
    }
}

// ─── LoadContext ──────────────────────────────────────────────────────────────

/// What a module factory gets to work with.
#[derive(Clone, Debug)]
pub struct LoadContext {
    identifier: String,
    module_name: &'static str,
    settings: Arc<Value>,
    services: Arc<Services>,
    backoff: BackoffConfig,
}

impl LoadContext {
    pub(crate) fn new(
        identifier: impl Into<String>,
        module_name: &'static str,
        settings: Arc<Value>,
        services: Arc<Services>,
        backoff: BackoffConfig,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            module_name,
            settings,
            services,
            backoff,
        }
    }

    /// The identifier the module was loaded through.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The module being built.
    pub fn module_name(&self) -> &'static str {
        self.module_name
    }

    /// The injected platform capabilities.
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// The configured retry schedule for entity resolvers.
    pub fn backoff(&self) -> &BackoffConfig {
        &self.backoff
    }

    /// Deserialises the module's settings section into `T`.
    ///
    /// A missing section deserialises from `null`; use `#[serde(default)]`
    /// or `Option` fields for optional settings.
    pub fn settings<T>(&self) -> serde_json::Result<T>
    where
        T: DeserializeOwned,
    {
        T::deserialize(self.settings.as_ref())
    }
}

// ─── ModuleRegistry ───────────────────────────────────────────────────────────

/// Maps module identifiers to module factories.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    entries: HashMap<String, Vec<ModuleDescriptor>>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a factory under `identifier`.
    pub fn register(
        &mut self,
        identifier: impl Into<String>,
        descriptor: ModuleDescriptor,
    ) -> &mut Self {
        self.entries
            .entry(identifier.into())
            .or_default()
            .push(descriptor);
        self
    }

    /// Adds a factory under `identifier` (builder pattern).
    pub fn with(mut self, identifier: impl Into<String>, descriptor: ModuleDescriptor) -> Self {
        self.register(identifier, descriptor);
        self
    }

    /// Returns the factories for `identifier`.
    ///
    /// An unknown identifier, or one without factories, is an error.
    pub fn resolve(&self, identifier: &str) -> FrameworkResult<&[ModuleDescriptor]> {
        match self.entries.get(identifier) {
            Some(descriptors) if !descriptors.is_empty() => Ok(descriptors),
            _ => Err(FrameworkError::NoModules(identifier.to_owned())),
        }
    }

    /// Returns every registered identifier.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::services;

    fn basic(_: &LoadContext) -> Module {
        Module::new("basic")
    }

    fn help(_: &LoadContext) -> Module {
        Module::new("help")
    }

    #[test]
    fn test_resolve_multiple_factories() {
        let registry = ModuleRegistry::new()
            .with("reinhard.modules.basic", ModuleDescriptor::new("basic", basic))
            .with("reinhard.modules.basic", ModuleDescriptor::new("help", help));

        let descriptors = registry.resolve("reinhard.modules.basic").unwrap();
        let names: Vec<_> = descriptors.iter().map(|d| d.name).collect();
        assert_eq!(names, ["basic", "help"]);
    }

    #[test]
    fn test_unknown_identifier_is_fatal() {
        let registry = ModuleRegistry::new();
        assert_eq!(
            registry.resolve("reinhard.modules.missing").unwrap_err(),
            FrameworkError::NoModules("reinhard.modules.missing".into())
        );
    }

    #[test]
    fn test_load_context_settings() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Settings {
            #[serde(default)]
            greeting: Option<String>,
        }

        let (services, _) = services();
        let ctx = LoadContext::new(
            "reinhard.modules.basic",
            "basic",
            Arc::new(serde_json::json!({ "greeting": "hi" })),
            Arc::clone(&services),
            BackoffConfig::default(),
        );
        assert_eq!(ctx.settings::<Settings>().unwrap().greeting.as_deref(), Some("hi"));

        let empty = LoadContext::new(
            "x",
            "basic",
            Arc::new(Value::Null),
            services,
            BackoffConfig::default(),
        );
        assert_eq!(empty.backoff().max_attempts, 5);
        assert!(empty.settings::<Option<Settings>>().unwrap().is_none());
        assert_eq!(basic(&empty).name(), "basic");
    }
}
