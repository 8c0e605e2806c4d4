//! Unified error types for the Reinhard core layer.
//!
//! Framework-level errors (command failures, resolution failures) are defined
//! in `reinhard-framework`.

use std::time::Duration;

use thiserror::Error;

use crate::foundation::entity::Snowflake;

// =============================================================================
// REST Errors
// =============================================================================

/// Coarse classification of a [`RestError`].
///
/// Resolver rule tables match on this rather than on the error value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestErrorKind {
    /// HTTP 400.
    BadRequest,
    /// HTTP 401.
    Unauthorized,
    /// HTTP 403.
    Forbidden,
    /// HTTP 404.
    NotFound,
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx.
    Server,
    /// The request never produced a response.
    Transport,
    /// Anything else.
    Other,
}

/// Errors raised by a remote lookup.
#[derive(Debug, Clone, Error)]
pub enum RestError {
    /// The request was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The credentials were rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The bot lacks access to the requested resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was rate limited.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// How long the platform asked us to wait.
        retry_after: Option<Duration>,
    },

    /// The platform failed to process the request.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl RestError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> RestErrorKind {
        match self {
            Self::BadRequest(_) => RestErrorKind::BadRequest,
            Self::Unauthorized(_) => RestErrorKind::Unauthorized,
            Self::Forbidden(_) => RestErrorKind::Forbidden,
            Self::NotFound(_) => RestErrorKind::NotFound,
            Self::RateLimited { .. } => RestErrorKind::RateLimited,
            Self::Server { .. } => RestErrorKind::Server,
            Self::Transport(_) => RestErrorKind::Transport,
            Self::Other(_) => RestErrorKind::Other,
        }
    }

    /// Returns the server-provided retry delay for rate limited requests.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

// =============================================================================
// Reply Errors
// =============================================================================

/// Errors raised while sending a reply.
#[derive(Debug, Clone, Error)]
pub enum ReplyError {
    /// The bot may not send (or attach files) in the target channel.
    #[error("missing permissions to reply in channel {channel_id}")]
    MissingPermissions {
        /// The channel the reply was aimed at.
        channel_id: Snowflake,
    },

    /// The underlying request failed.
    #[error(transparent)]
    Rest(#[from] RestError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for remote lookups.
pub type RestResult<T> = Result<T, RestError>;

/// Result type for replies.
pub type ReplyResult<T> = Result<T, ReplyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            RestError::NotFound("member".into()).kind(),
            RestErrorKind::NotFound
        );
        assert_eq!(
            RestError::RateLimited { retry_after: None }.kind(),
            RestErrorKind::RateLimited
        );
        assert_eq!(
            RestError::Server {
                status: 502,
                message: "bad gateway".into()
            }
            .kind(),
            RestErrorKind::Server
        );
    }

    #[test]
    fn test_retry_after_only_for_rate_limits() {
        let limited = RestError::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
        };
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(3)));
        assert_eq!(RestError::Transport("reset".into()).retry_after(), None);
    }
}
