//! # Subscribe-only event handle.
//!
//! [`Event`] is the view of an [`EventSource`](crate::EventSource) that producers hand
//! out to consumers. It can subscribe but never broadcast.
//!
//! ## Subscribe shapes
//! | Callback                         | Strong                    | Weak                           |
//! |----------------------------------|---------------------------|--------------------------------|
//! | `Fn(&T) -> O`                    | [`Event::subscribe`]      | [`Event::subscribe_weak`]      |
//! | `Fn() -> O`                      | [`Event::subscribe_unit`] | [`Event::subscribe_weak_unit`] |
//! | `Fn(T) -> impl Future<Output=O>` | [`Event::subscribe_async`] | [`Event::subscribe_weak_async`] |
//! | `Fn() -> impl Future<Output=O>`  | [`Event::subscribe_async_unit`] | [`Event::subscribe_weak_async_unit`] |
//! | [`ReportSink<T>`]                | [`Event::subscribe_sink`] | [`Event::subscribe_weak_sink`] |
//! | [`AsyncReportSink<T>`]           | [`Event::subscribe_async_sink`] | [`Event::subscribe_weak_async_sink`] |
//!
//! `O` is any [`Outcome`]: `()` or `Result<(), E>`.
//!
//! ## Rules
//! - An unbound handle (and a handle of a disposed source) returns the null
//!   subscription from every subscribe call, without touching any registry.
//! - Two handles are equal iff they are bound to the same source, or both unbound.

use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::Outcome;
use crate::sink::{AsyncReportSink, ReportSink};
use crate::source::SourceCore;
use crate::subscription::{Callback, Subscription};

/// Subscribe-only view of an event source.
pub struct Event<T> {
    source: Option<Arc<SourceCore<T>>>,
}

impl<T> Event<T> {
    /// Returns a handle bound to no source.
    pub const fn unbound() -> Self {
        Self { source: None }
    }

    pub(crate) fn bound(source: Arc<SourceCore<T>>) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Returns `true` if this handle is bound to a source.
    pub fn is_bound(&self) -> bool {
        self.source.is_some()
    }
}

impl<T> Event<T>
where
    T: Send + Sync + 'static,
{
    fn register<F>(&self, weak: bool, make: F) -> Subscription<T>
    where
        F: FnOnce() -> Callback<T>,
    {
        match &self.source {
            Some(source) if !source.is_disposed() => {
                if weak {
                    source.add_weak(make())
                } else {
                    source.add(make())
                }
            }
            _ => Subscription::null(),
        }
    }

    /// Subscribes `callback` to every broadcast value.
    pub fn subscribe<F, O>(&self, callback: F) -> Subscription<T>
    where
        F: Fn(&T) -> O + Send + Sync + 'static,
        O: Outcome,
    {
        self.register(false, || Callback::from_fn(callback))
    }

    /// Subscribes a callback that ignores the broadcast value.
    pub fn subscribe_unit<F, O>(&self, callback: F) -> Subscription<T>
    where
        F: Fn() -> O + Send + Sync + 'static,
        O: Outcome,
    {
        self.register(false, || Callback::from_unit_fn(callback))
    }

    /// Subscribes an async callback that ignores the broadcast value.
    pub fn subscribe_async_unit<F, Fut>(&self, callback: F) -> Subscription<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Outcome,
    {
        self.register(false, || Callback::from_async_unit_fn(callback))
    }

    /// Subscribes a [`ReportSink`].
    pub fn subscribe_sink(&self, sink: Arc<dyn ReportSink<T>>) -> Subscription<T> {
        self.register(false, || Callback::from_sink(sink))
    }

    /// Subscribes `callback` with weak lifetime.
    ///
    /// The source holds no strong reference to the callback: it stays registered only
    /// while the returned [`Subscription`] (or a clone of it) is alive.
    #[must_use = "dropping the subscription of a weak registration unsubscribes it"]
    pub fn subscribe_weak<F, O>(&self, callback: F) -> Subscription<T>
    where
        F: Fn(&T) -> O + Send + Sync + 'static,
        O: Outcome,
    {
        self.register(true, || Callback::from_fn(callback))
    }

    /// Weak counterpart of [`subscribe_unit`](Self::subscribe_unit).
    #[must_use = "dropping the subscription of a weak registration unsubscribes it"]
    pub fn subscribe_weak_unit<F, O>(&self, callback: F) -> Subscription<T>
    where
        F: Fn() -> O + Send + Sync + 'static,
        O: Outcome,
    {
        self.register(true, || Callback::from_unit_fn(callback))
    }

    /// Weak counterpart of [`subscribe_async_unit`](Self::subscribe_async_unit).
    #[must_use = "dropping the subscription of a weak registration unsubscribes it"]
    pub fn subscribe_weak_async_unit<F, Fut>(&self, callback: F) -> Subscription<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Outcome,
    {
        self.register(true, || Callback::from_async_unit_fn(callback))
    }

    /// Weak counterpart of [`subscribe_sink`](Self::subscribe_sink).
    #[must_use = "dropping the subscription of a weak registration unsubscribes it"]
    pub fn subscribe_weak_sink(&self, sink: Arc<dyn ReportSink<T>>) -> Subscription<T> {
        self.register(true, || Callback::from_sink(sink))
    }
}

impl<T> Event<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Subscribes an async callback; it receives its own clone of each value.
    pub fn subscribe_async<F, Fut>(&self, callback: F) -> Subscription<T>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Outcome,
    {
        self.register(false, || Callback::from_async_fn(callback))
    }

    /// Subscribes an [`AsyncReportSink`].
    pub fn subscribe_async_sink(&self, sink: Arc<dyn AsyncReportSink<T>>) -> Subscription<T> {
        self.register(false, || Callback::from_async_sink(sink))
    }

    /// Weak counterpart of [`subscribe_async`](Self::subscribe_async).
    #[must_use = "dropping the subscription of a weak registration unsubscribes it"]
    pub fn subscribe_weak_async<F, Fut>(&self, callback: F) -> Subscription<T>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Outcome,
    {
        self.register(true, || Callback::from_async_fn(callback))
    }

    /// Weak counterpart of [`subscribe_async_sink`](Self::subscribe_async_sink).
    #[must_use = "dropping the subscription of a weak registration unsubscribes it"]
    pub fn subscribe_weak_async_sink(
        &self,
        sink: Arc<dyn AsyncReportSink<T>>,
    ) -> Subscription<T> {
        self.register(true, || Callback::from_async_sink(sink))
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::unbound()
    }
}

impl<T> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.source, &other.source) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T> Eq for Event<T> {}

impl<T> Hash for Event<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.as_ref().map(Arc::as_ptr).hash(state);
    }
}

impl<T> fmt::Debug for Event<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            None => f.write_str("Event::Unbound"),
            Some(source) => f.debug_tuple("Event").field(&source.label()).finish(),
        }
    }
}
