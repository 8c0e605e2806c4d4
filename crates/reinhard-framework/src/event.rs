//! Per-module publish/subscribe table.
//!
//! Publishing never waits on subscribers: each subscriber runs as its own
//! tokio task and its failure is logged, not returned to the publisher.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

use crate::command::BoxFuture;
use crate::context::Context;
use crate::error::BoxError;
use reinhard_core::GatewayEvent;

/// Events published by the framework itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandEvent {
    /// A command handler failed unexpectedly.
    Error,
    /// A module was loaded.
    Load,
    /// A module is being unloaded.
    Unload,
}

impl CommandEvent {
    /// Returns the event name subscribers register under.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Load => "load",
            Self::Unload => "unload",
        }
    }
}

impl fmt::Display for CommandEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data delivered to subscribers.
#[derive(Clone)]
pub enum EventPayload {
    /// A handler failure.
    Error {
        /// Context of the failed invocation.
        ctx: Arc<Context>,
        /// The failure.
        error: Arc<dyn StdError + Send + Sync>,
    },
    /// A module finished loading.
    Load {
        /// The module's name.
        module: String,
    },
    /// A module is unloading.
    Unload {
        /// The module's name.
        module: String,
    },
    /// A raw platform event.
    Gateway(Arc<GatewayEvent>),
    /// Anything a module publishes for itself.
    Custom(Value),
}

impl fmt::Debug for EventPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error { ctx, error } => f
                .debug_struct("Error")
                .field("ctx", ctx)
                .field("error", &error.to_string())
                .finish(),
            Self::Load { module } => f.debug_struct("Load").field("module", module).finish(),
            Self::Unload { module } => f.debug_struct("Unload").field("module", module).finish(),
            Self::Gateway(event) => f.debug_tuple("Gateway").field(&event.name()).finish(),
            Self::Custom(value) => f.debug_tuple("Custom").field(value).finish(),
        }
    }
}

/// A type-erased event subscriber.
pub type ListenerFn =
    Arc<dyn Fn(EventPayload) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Wraps an async closure as a [`ListenerFn`].
pub fn listener<F, Fut>(f: F) -> ListenerFn
where
    F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Arc::new(move |payload| f(payload).boxed())
}

/// Spawns every listener for one payload.
///
/// Returns the number of tasks scheduled.
pub(crate) fn spawn_listeners(
    owner: &str,
    event: &str,
    listeners: &[ListenerFn],
    payload: &EventPayload,
) -> usize {
    if listeners.is_empty() {
        return 0;
    }

    let Ok(handle) = Handle::try_current() else {
        warn!(owner, event, "No async runtime, dropping event");
        return 0;
    };

    for listener in listeners {
        let fut = listener(payload.clone());
        let owner = owner.to_owned();
        let event = event.to_owned();
        handle.spawn(async move {
            if let Err(e) = fut.await {
                error!(owner = %owner, event = %event, error = %e, "Event listener failed");
            }
        });
    }

    listeners.len()
}

/// A named set of event subscribers.
pub struct EventBus {
    owner: String,
    listeners: RwLock<HashMap<String, Vec<ListenerFn>>>,
}

impl EventBus {
    /// Creates an empty bus owned by `owner` (used in logs).
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the owner name.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Adds a subscriber for `event`.
    pub fn subscribe(&self, event: impl Into<String>, listener: ListenerFn) {
        self.listeners
            .write()
            .entry(event.into())
            .or_default()
            .push(listener);
    }

    /// Returns how many subscribers `event` has.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }

    /// Publishes `payload` to every subscriber of `event`.
    ///
    /// Returns the number of subscribers scheduled.
    pub fn dispatch(&self, event: &str, payload: EventPayload) -> usize {
        debug!(owner = %self.owner, event, "Dispatching module event");
        let listeners = self.listeners.read().get(event).cloned().unwrap_or_default();
        spawn_listeners(&self.owner, event, &listeners, &payload)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("owner", &self.owner)
            .field("events", &self.listeners.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_dispatch_reaches_every_subscriber() {
        let bus = EventBus::new("test");
        let (tx, mut rx) = mpsc::unbounded_channel();

        for i in 0..2 {
            let tx = tx.clone();
            bus.subscribe(
                "load",
                listener(move |payload| {
                    let tx = tx.clone();
                    async move {
                        if let EventPayload::Load { module } = payload {
                            tx.send((i, module)).ok();
                        }
                        Ok(())
                    }
                }),
            );
        }

        let scheduled = bus.dispatch(
            "load",
            EventPayload::Load {
                module: "utility".into(),
            },
        );
        assert_eq!(scheduled, 2);

        let mut seen = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        seen.sort();
        assert_eq!(seen, [(0, "utility".to_string()), (1, "utility".to_string())]);
    }

    #[tokio::test]
    async fn test_failing_subscriber_is_isolated() {
        let bus = EventBus::new("test");
        let hits = Arc::new(AtomicUsize::new(0));

        bus.subscribe(
            "custom",
            listener(|_| async { Err::<(), BoxError>("boom".into()) }),
        );
        let counter = Arc::clone(&hits);
        bus.subscribe(
            "custom",
            listener(move |_| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        );

        assert_eq!(bus.dispatch("custom", EventPayload::Custom(Value::Null)), 2);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_without_subscribers() {
        let bus = EventBus::new("test");
        assert_eq!(bus.dispatch("error", EventPayload::Custom(Value::Null)), 0);
        assert_eq!(bus.listener_count("error"), 0);
        assert_eq!(CommandEvent::Unload.to_string(), "unload");
    }
}
