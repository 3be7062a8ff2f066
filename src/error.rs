//! Error types for handler failures.
//!
//! This module defines:
//!
//! - [`HandlerError`]: a failure raised by a subscriber while handling a broadcast.
//! - [`Outcome`]: the return-value contract of subscriber callbacks.
//!
//! Handler failures are never returned to the broadcaster. Each one is forwarded
//! individually to the [unobserved failure channel](crate::unobserved_failures).

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error accepted from fallible callbacks.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// # Failure raised by a subscriber.
///
/// Cheap to clone: payloads are `Arc`-backed so the same failure can be delivered to
/// any number of channel subscribers.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum HandlerError {
    /// The handler (or the future it returned) panicked.
    #[error("handler panicked: {message}")]
    Panicked {
        /// The panic payload if it was a string, `"unknown panic"` otherwise.
        message: Arc<str>,
    },

    /// The handler returned an error.
    #[error("handler failed: {source}")]
    Failed {
        /// The error returned by the handler.
        source: Arc<dyn StdError + Send + Sync + 'static>,
    },
}

impl HandlerError {
    /// Builds a [`HandlerError::Panicked`] from a `catch_unwind` payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message: Arc<str> = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            Arc::from(*msg)
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            Arc::from(msg.as_str())
        } else {
            Arc::from("unknown panic")
        };
        HandlerError::Panicked { message }
    }

    /// Wraps an error returned by a handler.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        HandlerError::Failed {
            source: Arc::from(err.into()),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventcast::HandlerError;
    ///
    /// let err = HandlerError::failed("disk full");
    /// assert_eq!(err.as_label(), "handler_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Panicked { .. } => "handler_panicked",
            HandlerError::Failed { .. } => "handler_failed",
        }
    }

    /// Returns the raw failure message: the panic payload, or the error's `Display`.
    ///
    /// # Example
    /// ```
    /// use eventcast::HandlerError;
    ///
    /// let err = HandlerError::failed("disk full");
    /// assert_eq!(err.message(), "disk full");
    /// ```
    pub fn message(&self) -> String {
        match self {
            HandlerError::Panicked { message } => message.to_string(),
            HandlerError::Failed { source } => source.to_string(),
        }
    }

    /// Returns `true` if the handler panicked rather than returning an error.
    pub fn is_panic(&self) -> bool {
        matches!(self, HandlerError::Panicked { .. })
    }
}

/// Return value of a subscriber callback.
///
/// Implemented for `()` (infallible handlers) and `Result<(), E>` for any error type
/// convertible into [`BoxError`]. An `Err` is forwarded as [`HandlerError::Failed`].
pub trait Outcome: Send + 'static {
    /// Converts the callback's return value into a handler result.
    fn into_outcome(self) -> Result<(), HandlerError>;
}

impl Outcome for () {
    #[inline]
    fn into_outcome(self) -> Result<(), HandlerError> {
        Ok(())
    }
}

impl<E> Outcome for Result<(), E>
where
    E: Into<BoxError> + Send + 'static,
{
    #[inline]
    fn into_outcome(self) -> Result<(), HandlerError> {
        self.map_err(HandlerError::failed)
    }
}
