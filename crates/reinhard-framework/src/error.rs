//! Error types for the Reinhard framework.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use reinhard_core::{ReplyError, RestError};

/// An opaque, boxed error raised by handler code.
pub use tower::BoxError;

// =============================================================================
// Command Errors
// =============================================================================

/// An expected, user-facing command failure.
///
/// Returning this from a handler sends its text back to the channel the
/// command was invoked in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{response}")]
pub struct CommandError {
    response: String,
}

impl CommandError {
    /// Creates a command error with the given reply text.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }

    /// Returns the reply text.
    pub fn response(&self) -> &str {
        &self.response
    }
}

/// The failure outcomes of a command handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Reply to the invoker with this message.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Stop without replying and without reporting an error.
    #[error("command aborted")]
    Aborted,

    /// An unexpected failure, reported through the module's `error` event.
    #[error("{0}")]
    Other(BoxError),
}

impl HandlerError {
    /// Wraps an arbitrary error as an unexpected failure.
    pub fn other<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Other(Box::new(error))
    }
}

impl From<BoxError> for HandlerError {
    fn from(error: BoxError) -> Self {
        Self::Other(error)
    }
}

impl From<ResolveError> for HandlerError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::Aborted => Self::Aborted,
            other => Self::Command(CommandError::new(other.to_string())),
        }
    }
}

impl From<ReplyError> for HandlerError {
    fn from(error: ReplyError) -> Self {
        Self::other(error)
    }
}

impl From<RestError> for HandlerError {
    fn from(error: RestError) -> Self {
        Self::other(error)
    }
}

/// Errors surfaced from [`Command::execute`](crate::Command::execute) to the
/// dispatcher boundary.
#[derive(Debug, Clone, Error)]
pub enum ExecuteError {
    /// The handler failed unexpectedly.
    #[error("command handler failed: {0}")]
    Handler(Arc<dyn StdError + Send + Sync>),

    /// Replying with a command error failed for a reason other than
    /// missing permissions.
    #[error("failed to reply with command error: {0}")]
    Reply(#[source] ReplyError),
}

// =============================================================================
// Resolution Errors
// =============================================================================

/// Failures of the resilient entity resolvers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A non-transient lookup failure matched a rule.
    #[error("{0}")]
    NotFound(String),

    /// Resolution was abandoned on purpose; callers must not reply.
    #[error("resolution aborted")]
    Aborted,

    /// Every attempt failed transiently.
    #[error("{message}")]
    Timeout {
        /// User-facing message.
        message: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// The lookup cannot run in this context (e.g. a DM).
    #[error("{0}")]
    InvalidContext(String),

    /// The raw argument could not be interpreted.
    #[error("{0}")]
    InvalidArgument(String),
}

impl ResolveError {
    /// Returns `true` for the silent abort outcome.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

// =============================================================================
// Framework Errors
// =============================================================================

/// Usage and load-time errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameworkError {
    /// `bind` was called twice on the same module.
    #[error("module '{0}' is already bound")]
    AlreadyBound(String),

    /// No command matched the given trigger.
    #[error("`{0}` command not found")]
    CommandNotFound(String),

    /// The check is not registered on the command.
    #[error("command check {id} not found on '{command}'")]
    CheckNotFound {
        /// The command name.
        command: String,
        /// The check id.
        id: u64,
    },

    /// A module identifier resolved to no module factories.
    #[error("no modules registered for '{0}'")]
    NoModules(String),

    /// Two loaded modules share a name.
    #[error("a module named '{0}' is already loaded")]
    DuplicateModule(String),

    /// The command already belongs to another module.
    #[error("command '{command}' already belongs to another module than '{module}'")]
    CommandAlreadyOwned {
        /// The command name.
        command: String,
        /// The module it was being added to.
        module: String,
    },
}

/// Result type for framework operations.
pub type FrameworkResult<T> = Result<T, FrameworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_into_handler_error() {
        let err: HandlerError = ResolveError::NotFound("Couldn't find member.".into()).into();
        match err {
            HandlerError::Command(err) => assert_eq!(err.response(), "Couldn't find member."),
            other => panic!("unexpected {other:?}"),
        }

        let err: HandlerError = ResolveError::Aborted.into();
        assert!(matches!(err, HandlerError::Aborted));

        let err: HandlerError = ResolveError::Timeout {
            message: "Couldn't get member in time".into(),
            attempts: 5,
        }
        .into();
        assert_eq!(err.to_string(), "Couldn't get member in time");
    }

    #[test]
    fn test_command_error_display() {
        assert_eq!(CommandError::new("nope").to_string(), "nope");
    }
}
