//! # Report sinks.
//!
//! Provides [`ReportSink`] and [`AsyncReportSink`], object-style alternatives to closure
//! callbacks. A sink is registered with [`Event::subscribe_sink`](crate::Event::subscribe_sink)
//! (or its async/weak twins) and is normalized to an ordinary callback subscription.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use eventcast::{EventSource, ReportSink};
//!
//! #[derive(Default)]
//! struct Progress(AtomicU64);
//!
//! impl ReportSink<u64> for Progress {
//!     fn report(&self, value: &u64) {
//!         self.0.store(*value, Ordering::Relaxed);
//!     }
//! }
//!
//! let source = EventSource::<u64>::new();
//! let sink = Arc::new(Progress::default());
//! let _sub = source.event().subscribe_sink(sink.clone());
//!
//! source.invoke(&42);
//! assert_eq!(sink.0.load(Ordering::Relaxed), 42);
//! ```

use async_trait::async_trait;

/// Synchronous receiver of broadcast values.
///
/// Called on the broadcasting thread, in registration order with the source's other
/// subscribers. Panics are caught and forwarded to the unobserved failure channel.
pub trait ReportSink<T>: Send + Sync + 'static {
    /// Receives one broadcast value.
    fn report(&self, value: &T);
}

/// Asynchronous receiver of broadcast values.
///
/// The returned future is polled once by the broadcaster; if it is still pending,
/// [`invoke`](crate::EventSource::invoke) detaches it and
/// [`invoke_async`](crate::EventSource::invoke_async) awaits it.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Panics are caught and forwarded like any other handler failure.
#[async_trait]
pub trait AsyncReportSink<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    /// Receives one broadcast value.
    async fn report(&self, value: T);
}
