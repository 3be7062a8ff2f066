//! # LogWriter: failure logger
//!
//! A minimal subscriber of the unobserved failure channel that writes every failure
//! as a `tracing` error event. Use it when nothing else observes handler failures.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! ERROR eventcast::channel::log: [handler-panicked] message="index out of bounds"
//! ERROR eventcast::channel::log: [handler-failed] error="connection refused"
//! ```

use tracing::error;

use crate::error::HandlerError;
use crate::subscription::Subscription;

use super::unobserved_failures;

/// Failure logger attached to the unobserved failure channel.
///
/// Holds a weak registration: logging stops when the writer is dropped.
#[must_use = "dropping the LogWriter detaches it"]
pub struct LogWriter {
    subscription: Subscription<HandlerError>,
}

impl LogWriter {
    /// Subscribes a new writer to the unobserved failure channel.
    pub fn attach() -> Self {
        Self {
            subscription: unobserved_failures().subscribe_weak(write),
        }
    }

    /// Returns `true` while the writer is attached.
    pub fn is_attached(&self) -> bool {
        self.subscription.is_active()
    }

    /// Detaches the writer.
    pub fn detach(self) {
        self.subscription.dispose();
    }
}

fn write(err: &HandlerError) {
    match err {
        HandlerError::Panicked { message } => {
            error!(label = err.as_label(), message = %message, "[handler-panicked]");
        }
        HandlerError::Failed { source } => {
            error!(label = err.as_label(), error = %source, "[handler-failed]");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_and_detach() {
        let writer = LogWriter::attach();
        assert!(writer.is_attached());
        super::super::notify(HandlerError::failed("log-writer-smoke"));
        writer.detach();
    }
}
