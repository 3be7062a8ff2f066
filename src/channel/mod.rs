//! # Unobserved failure channel.
//!
//! One process-wide [`EventSource`] of [`HandlerError`]s. Every failure raised by a
//! subscriber of any source is pushed here instead of being returned to the
//! broadcaster. Applications subscribe through [`unobserved_failures`] and may push
//! their own failures with [`notify`].
//!
//! ## Architecture
//! ```text
//! source.invoke(v) ─► handler panics / returns Err
//!                          │
//!                          ▼
//!                  channel::forward(err) ──► UNOBSERVED.invoke(&err)
//!                                                 │
//!                                   ┌─────────────┼─────────────┐
//!                                   ▼             ▼             ▼
//!                               LogWriter      metrics       tests ...
//! ```
//!
//! ## Rules
//! - Without subscribers, failures are dropped (logged at `trace`). This is intended:
//!   a broadcast never crashes its producer.
//! - A failure raised by a subscriber of the channel itself, sync or after an async
//!   suspension, is logged at `warn` and dropped rather than re-broadcast. Failures of
//!   other sources broadcast from inside a channel subscriber go through as usual.
//! - [`notify`] called from a channel subscriber re-enters the channel.
//! - The channel is never disposed.

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;

use std::sync::LazyLock;

use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::error::HandlerError;
use crate::event::Event;
use crate::source::EventSource;

static UNOBSERVED: LazyLock<EventSource<HandlerError>> =
    LazyLock::new(|| EventSource::with_config(Config::named("unobserved_failures")));

/// Returns the subscribe-only handle of the process-wide failure channel.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use eventcast::{EventSource, unobserved_failures};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let _watch = unobserved_failures().subscribe(move |err: &eventcast::HandlerError| {
///     sink.lock().push(err.message());
/// });
///
/// let source = EventSource::<u32>::new();
/// let _sub = source.event().subscribe(|v: &u32| -> Result<(), String> {
///     Err(format!("doc example rejected {v}"))
/// });
/// assert!(source.invoke(&7));
/// assert!(seen.lock().contains(&"doc example rejected 7".to_string()));
/// ```
pub fn unobserved_failures() -> Event<HandlerError> {
    UNOBSERVED.event()
}

/// Pushes a failure to every subscriber of [`unobserved_failures`].
pub fn notify(err: HandlerError) {
    deliver(err);
}

/// Forwards a subscriber failure raised while broadcasting on source `origin`.
pub(crate) fn forward(err: HandlerError, origin: usize, source: &str) {
    if origin == UNOBSERVED.id() {
        warn!(
            source,
            label = err.as_label(),
            error = %err,
            "failure raised inside an unobserved-failure subscriber dropped"
        );
        return;
    }
    debug!(
        source,
        label = err.as_label(),
        error = %err,
        "handler failure forwarded"
    );
    deliver(err);
}

fn deliver(err: HandlerError) {
    if !UNOBSERVED.invoke(&err) {
        trace!(label = err.as_label(), "no unobserved-failure subscriber, failure dropped");
    }
}
