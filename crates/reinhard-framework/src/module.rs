//! Modules: named groups of commands with their own event bus.
//!
//! A module is assembled by its factory, bound once by the
//! [`Client`](crate::Client), and read-only afterwards:
//!
//! ```rust,ignore
//! fn moderation(ctx: &LoadContext) -> Module {
//!     Module::new("moderation")
//!         .command(Command::builder("ban").level(3).handler(ban))
//!         .command(Command::builder("kick").level(2).handler(kick))
//!         .listen("error", listener(report_error))
//!         .listen("guild_member_add", listener(greet))
//! }
//! ```
//!
//! Listeners registered under platform event names (`guild_member_add`
//! above) are not subscribed to the module's bus; the client routes gateway
//! events to them instead.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::command::Command;
use crate::error::{FrameworkError, FrameworkResult};
use crate::event::{EventBus, EventPayload, ListenerFn};
use reinhard_core::is_reserved_event;

/// A named group of commands.
pub struct Module {
    name: String,
    commands: Vec<Arc<Command>>,
    events: Arc<EventBus>,
    pending_listeners: Vec<(String, ListenerFn)>,
    platform_listeners: Vec<(String, ListenerFn)>,
    bound: bool,
}

impl Module {
    /// Creates an empty, unbound module.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            events: Arc::new(EventBus::new(name.clone())),
            name,
            commands: Vec::new(),
            pending_listeners: Vec::new(),
            platform_listeners: Vec::new(),
            bound: false,
        }
    }

    /// Adds a command (builder pattern).
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(Arc::new(command));
        self
    }

    /// Registers an event listener (builder pattern).
    pub fn listen(mut self, event: impl Into<String>, listener: ListenerFn) -> Self {
        self.pending_listeners.push((event.into(), listener));
        self
    }

    /// The module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Commands in match order.
    pub fn commands(&self) -> &[Arc<Command>] {
        &self.commands
    }

    /// The module's event bus.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Returns `true` once [`bind`](Self::bind) has run.
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Fixes the command order and takes ownership of the commands.
    ///
    /// Commands are sorted by name, descending. Overlapping triggers are
    /// logged but allowed.
    pub fn bind(&mut self) -> FrameworkResult<()> {
        if self.bound {
            return Err(FrameworkError::AlreadyBound(self.name.clone()));
        }

        self.commands.sort_by(|a, b| b.name().cmp(a.name()));
        for command in &self.commands {
            command.set_owner(&self.events)?;
        }
        for (index, command) in self.commands.iter().enumerate() {
            self.warn_overlaps(&self.commands[..index], command);
        }

        self.bound = true;
        debug!(module = %self.name, commands = self.commands.len(), "Bound module commands");
        Ok(())
    }

    /// Subscribes registered listeners to the module's bus.
    ///
    /// Listeners for platform event names are kept aside; collect them with
    /// [`take_platform_listeners`](Self::take_platform_listeners).
    pub fn bind_listeners(&mut self) {
        for (event, listener) in self.pending_listeners.drain(..) {
            if is_reserved_event(&event) {
                debug!(module = %self.name, event = %event, "Deferring platform listener");
                self.platform_listeners.push((event, listener));
            } else {
                self.events.subscribe(event, listener);
            }
        }
    }

    /// Hands over the deferred platform listeners.
    pub fn take_platform_listeners(&mut self) -> Vec<(String, ListenerFn)> {
        std::mem::take(&mut self.platform_listeners)
    }

    /// Publishes an event to this module's subscribers without waiting.
    pub fn dispatch_event(&self, event: &str, payload: EventPayload) -> usize {
        self.events.dispatch(event, payload)
    }

    /// Yields every `(command, trigger)` whose trigger prefixes `content`,
    /// in match order.
    ///
    /// The iterator is lazy and can be cloned to restart from the current
    /// position.
    pub fn match_by_content<'a>(
        &'a self,
        content: &'a str,
    ) -> impl Iterator<Item = (&'a Arc<Command>, &'a str)> + Clone + 'a {
        self.commands
            .iter()
            .filter_map(move |command| command.check_prefix(content).map(|trigger| (command, trigger)))
    }

    /// Adds a command after construction, warning on overlapping triggers.
    ///
    /// The command is appended after the existing ones.
    pub fn register_command(&mut self, command: impl Into<Arc<Command>>) -> FrameworkResult<()> {
        let command = command.into();
        if self.bound {
            command.set_owner(&self.events)?;
        }
        self.warn_overlaps(&self.commands, &command);
        self.commands.push(command);
        Ok(())
    }

    /// Removes the first command matching `trigger`.
    pub fn unregister_command(&mut self, trigger: &str) -> FrameworkResult<Arc<Command>> {
        let Some(position) = self
            .commands
            .iter()
            .position(|command| command.check_prefix(trigger).is_some())
        else {
            return Err(FrameworkError::CommandNotFound(trigger.to_owned()));
        };
        Ok(self.commands.remove(position))
    }

    /// Removes a specific command.
    pub fn remove_command(&mut self, command: &Arc<Command>) -> FrameworkResult<()> {
        let Some(position) = self.commands.iter().position(|c| Arc::ptr_eq(c, command)) else {
            return Err(FrameworkError::CommandNotFound(command.name().to_owned()));
        };
        self.commands.remove(position);
        Ok(())
    }

    fn warn_overlaps(&self, existing: &[Arc<Command>], command: &Command) {
        for trigger in command.triggers() {
            if let Some(other) = existing.iter().find(|c| c.check_prefix(trigger).is_some()) {
                warn!(
                    module = %self.name,
                    trigger = %trigger,
                    command = %command.name(),
                    overlaps = %other.name(),
                    "Possible overlapping trigger"
                );
            }
        }
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("commands", &self.commands)
            .field("bound", &self.bound)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::listener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_subscriber::layer::{self, Layer, SubscriberExt};

    fn command(name: &str, trigger: &str) -> Command {
        Command::builder(name)
            .trigger(trigger)
            .handler(|_, _| async { Ok(()) })
    }

    fn names<'a>(iter: impl Iterator<Item = (&'a Arc<Command>, &'a str)>) -> Vec<String> {
        iter.map(|(command, _)| command.name().to_owned()).collect()
    }

    #[test]
    fn test_bind_sorts_descending_by_name() {
        let mut module = Module::new("utility")
            .command(command("avatar", "avatar"))
            .command(command("ping", "ping"))
            .command(command("echo", "echo"));
        module.bind().unwrap();

        let order: Vec<_> = module.commands().iter().map(|c| c.name().to_owned()).collect();
        assert_eq!(order, ["ping", "echo", "avatar"]);
    }

    #[test]
    fn test_bind_twice_is_an_error() {
        let mut module = Module::new("utility").command(command("ping", "ping"));
        module.bind().unwrap();
        assert_eq!(
            module.bind(),
            Err(FrameworkError::AlreadyBound("utility".into()))
        );
    }

    /// Counts warn-level events.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _: layer::Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_duplicate_triggers_warn_and_both_match() {
        let mut module = Module::new("utility")
            .command(command("ping_b", "ping"))
            .command(command("ping_a", "ping"));

        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));
        tracing::subscriber::with_default(subscriber, || module.bind().unwrap());

        assert_eq!(warnings.load(Ordering::SeqCst), 1);
        assert_eq!(module.commands().len(), 2);
        assert_eq!(names(module.match_by_content("ping")), ["ping_b", "ping_a"]);
    }

    #[test]
    fn test_match_by_content_is_restartable() {
        let mut module = Module::new("utility")
            .command(command("echo", "echo"))
            .command(command("eval", "e"));
        module.bind().unwrap();

        let mut matches = module.match_by_content("echo hi");
        let restart = matches.clone();
        let (first, trigger) = matches.next().unwrap();
        assert_eq!((first.name(), trigger), ("eval", "e"));
        assert_eq!(names(restart), ["eval", "echo"]);
        assert!(module.match_by_content("nothing").next().is_none());
    }

    #[test]
    fn test_register_and_unregister_command() {
        let mut module = Module::new("utility").command(command("ping", "ping"));
        module.bind().unwrap();

        module.register_command(command("pong", "pong")).unwrap();
        assert_eq!(module.commands().len(), 2);

        let removed = module.unregister_command("ping").unwrap();
        assert_eq!(removed.name(), "ping");
        assert_eq!(
            module.unregister_command("ping").unwrap_err(),
            FrameworkError::CommandNotFound("ping".into())
        );

        let pong = Arc::clone(&module.commands()[0]);
        module.remove_command(&pong).unwrap();
        assert!(module.commands().is_empty());
    }

    #[test]
    fn test_bound_command_cannot_move_modules() {
        let mut first = Module::new("first").command(command("ping", "ping"));
        first.bind().unwrap();
        let ping = first.unregister_command("ping").unwrap();

        let mut second = Module::new("second");
        second.bind().unwrap();
        assert!(matches!(
            second.register_command(ping),
            Err(FrameworkError::CommandAlreadyOwned { .. })
        ));
    }

    #[test]
    fn test_bind_listeners_defers_platform_events() {
        let noop = || listener(|_| async { Ok(()) });
        let mut module = Module::new("utility")
            .listen("error", noop())
            .listen("guild_member_add", noop())
            .listen("load", noop());
        module.bind_listeners();

        assert_eq!(module.events().listener_count("error"), 1);
        assert_eq!(module.events().listener_count("load"), 1);
        assert_eq!(module.events().listener_count("guild_member_add"), 0);

        let deferred = module.take_platform_listeners();
        assert_eq!(deferred.len(), 1);
        assert_eq!(deferred[0].0, "guild_member_add");
        assert!(module.take_platform_listeners().is_empty());
    }
}
