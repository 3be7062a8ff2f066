//! # Event source: the owning, broadcasting side.
//!
//! [`EventSource`] owns a lock-free registry of subscriptions and delivers values to
//! them. Consumers never see the source itself, only its [`Event`] handle.
//!
//! ## Lifecycle
//! ```text
//! EventSource::new() ──► event() handed to consumers ──► invoke / invoke_async ...
//!                                                              │
//!                    dispose() or drop ◄───────────────────────┘
//!                        ├─ disposed = true (permanent)
//!                        ├─ wait for in-flight subscribes and broadcasts
//!                        └─ dispose every subscription, clear registry
//! ```
//!
//! ## Rules
//! - Broadcast order is registration order.
//! - A broadcast works on the snapshot taken when it starts.
//! - Subscriber failures are forwarded to [`unobserved_failures`](crate::unobserved_failures),
//!   never returned to the caller.
//! - Factory variants (`invoke_with*`) evaluate the factory only if there is at least
//!   one subscriber.

mod dispatch;
mod registry;

pub(crate) use registry::SourceCore;

use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::event::Event;

/// Broadcaster of values of type `T`.
///
/// Dropping the source disposes it.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use eventcast::EventSource;
///
/// let source = EventSource::<String>::new();
/// let log = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&log);
/// let _sub = source.event().subscribe(move |s: &String| sink.lock().push(s.clone()));
///
/// assert!(source.invoke(&"hello".to_string()));
/// assert_eq!(*log.lock(), vec!["hello".to_string()]);
/// ```
pub struct EventSource<T>
where
    T: Send + Sync + 'static,
{
    core: Arc<SourceCore<T>>,
}

impl<T> EventSource<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a source with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a source with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            core: SourceCore::new(config),
        }
    }

    /// Returns the subscribe-only handle bound to this source.
    pub fn event(&self) -> Event<T> {
        Event::bound(Arc::clone(&self.core))
    }

    /// Number of registry entries. Advisory under concurrency.
    ///
    /// Weak entries whose owner is gone are counted until a broadcast or dispose touches
    /// them.
    pub fn subscription_count(&self) -> usize {
        self.core.len()
    }

    pub(crate) fn id(&self) -> usize {
        self.core.id()
    }

    /// Returns `true` once [`dispose`](Self::dispose) has started. Advisory.
    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }

    /// Delivers `value` to every subscriber on the calling thread.
    ///
    /// Returns `false` without doing anything if the source is disposed or has no
    /// subscribers, `true` otherwise. Async subscribers run until they first suspend;
    /// they are not awaited.
    pub fn invoke(&self, value: &T) -> bool {
        self.core
            .broadcast(|entries| self.core.dispatch_all(entries, value))
            .is_some()
    }

    /// Like [`invoke`](Self::invoke), building the value only if someone listens.
    pub fn invoke_with<F>(&self, factory: F) -> bool
    where
        F: FnOnce() -> T,
    {
        self.core
            .broadcast(|entries| self.core.dispatch_all(entries, &factory()))
            .is_some()
    }

    /// Like [`invoke_with`](Self::invoke_with), passing one argument to the factory.
    pub fn invoke_with1<A, F>(&self, factory: F, a: A) -> bool
    where
        F: FnOnce(A) -> T,
    {
        self.invoke_with(move || factory(a))
    }

    /// Like [`invoke_with`](Self::invoke_with), passing two arguments to the factory.
    pub fn invoke_with2<A, B, F>(&self, factory: F, a: A, b: B) -> bool
    where
        F: FnOnce(A, B) -> T,
    {
        self.invoke_with(move || factory(a, b))
    }

    /// Like [`invoke_with`](Self::invoke_with), passing three arguments to the factory.
    pub fn invoke_with3<A, B, C, F>(&self, factory: F, a: A, b: B, c: C) -> bool
    where
        F: FnOnce(A, B, C) -> T,
    {
        self.invoke_with(move || factory(a, b, c))
    }

    /// Delivers `value` to every subscriber and waits until all of them finished.
    ///
    /// A concurrent [`dispose`](Self::dispose) waits until every handler has been
    /// started, not until the suspended ones complete.
    ///
    /// Subscribers that complete synchronously cost no extra allocation. Resolves to
    /// `false` if the source is disposed or has no subscribers, `true` once every
    /// started handler finished, whether or not some of them failed.
    pub async fn invoke_async(&self, value: T) -> bool {
        let started = self
            .core
            .broadcast(|entries| self.core.start_all(entries, &value));
        drop(value);
        let Some(pending) = started else {
            return false;
        };
        self.core.await_all(pending).await;
        true
    }

    /// Like [`invoke_async`](Self::invoke_async), building the value only if someone
    /// listens.
    pub async fn invoke_async_with<F>(&self, factory: F) -> bool
    where
        F: FnOnce() -> T,
    {
        let started = self
            .core
            .broadcast(|entries| self.core.start_all(entries, &factory()));
        let Some(pending) = started else {
            return false;
        };
        self.core.await_all(pending).await;
        true
    }

    /// Async counterpart of [`invoke_with1`](Self::invoke_with1).
    pub async fn invoke_async_with1<A, F>(&self, factory: F, a: A) -> bool
    where
        F: FnOnce(A) -> T,
    {
        self.invoke_async_with(move || factory(a)).await
    }

    /// Async counterpart of [`invoke_with2`](Self::invoke_with2).
    pub async fn invoke_async_with2<A, B, F>(&self, factory: F, a: A, b: B) -> bool
    where
        F: FnOnce(A, B) -> T,
    {
        self.invoke_async_with(move || factory(a, b)).await
    }

    /// Async counterpart of [`invoke_with3`](Self::invoke_with3).
    pub async fn invoke_async_with3<A, B, C, F>(&self, factory: F, a: A, b: B, c: C) -> bool
    where
        F: FnOnce(A, B, C) -> T,
    {
        self.invoke_async_with(move || factory(a, b, c)).await
    }

    /// Disposes the source and all of its subscriptions.
    ///
    /// Idempotent. Waits (spinning, without blocking syscalls) for subscribes,
    /// unsubscribes and broadcasts already in progress on other threads, then tears the
    /// registry down. Called from a handler, it does not wait for the broadcast that
    /// handler runs in; the remaining handlers of that broadcast are skipped. Afterwards
    /// every subscribe returns the null subscription and every broadcast returns `false`.
    pub fn dispose(&self) {
        self.core.dispose();
    }
}

impl<T> Default for EventSource<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for EventSource<T>
where
    T: Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.core.dispose();
    }
}

impl<T> fmt::Debug for EventSource<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("name", &self.core.label())
            .field("subscriptions", &self.core.len())
            .field("disposed", &self.core.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use parking_lot::Mutex;

    fn logger(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> impl Fn(&String) + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |s: &String| log.lock().push(format!("{s}{tag}"))
    }

    #[test]
    fn test_invoke_in_registration_order() {
        let source = EventSource::<String>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _h1 = source.event().subscribe(logger(&log, "1"));
        let _h2 = source.event().subscribe(logger(&log, "2"));
        let _h3 = source.event().subscribe(logger(&log, "3"));

        assert!(source.invoke(&"B".to_string()));
        assert_eq!(*log.lock(), vec!["B1", "B2", "B3"]);
    }

    #[test]
    fn test_duplicates_are_invoked_twice() {
        let source = EventSource::<u32>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let handler = Arc::new(move |_: &u32| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let (a, b) = (Arc::clone(&handler), Arc::clone(&handler));
        let _s1 = source.event().subscribe(move |v: &u32| a(v));
        let _s2 = source.event().subscribe(move |v: &u32| b(v));

        source.invoke(&0);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_factory_not_called_without_subscribers() {
        let source = EventSource::<String>::new();
        let calls = AtomicUsize::new(0);
        let make = |a: &str, b: u32, c: char| {
            calls.fetch_add(1, Ordering::SeqCst);
            format!("{a}{b}{c}")
        };

        assert!(!source.invoke_with(|| make("x", 1, 'y')));
        assert!(!source.invoke_with1(|a| make(a, 1, 'y'), "x"));
        assert!(!source.invoke_with2(|a, b| make(a, b, 'y'), "x", 1));
        assert!(!source.invoke_with3(make, "x", 1, 'y'));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let log = Arc::new(Mutex::new(Vec::new()));
        let _sub = source.event().subscribe(logger(&log, ""));
        assert!(source.invoke_with3(make, "x", 1, 'y'));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*log.lock(), vec!["x1y"]);
    }

    #[test]
    fn test_factory_not_called_after_dispose() {
        let source = EventSource::<u32>::new();
        let _sub = source.event().subscribe(|_: &u32| {});
        source.dispose();
        assert!(!source.invoke_with(|| unreachable!("factory must not run")));
    }

    #[test]
    fn test_snapshot_excludes_late_subscribers() {
        let source = Arc::new(EventSource::<u32>::new());
        let late_hits = Arc::new(AtomicUsize::new(0));

        let src = Arc::clone(&source);
        let late = Arc::clone(&late_hits);
        let added = Arc::new(Mutex::new(Vec::new()));
        let keep = Arc::clone(&added);
        let _adder = source.event().subscribe(move |_: &u32| {
            let late = Arc::clone(&late);
            let sub = src.event().subscribe(move |_: &u32| {
                late.fetch_add(1, Ordering::SeqCst);
            });
            keep.lock().push(sub);
        });

        source.invoke(&1);
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);
        source.invoke(&2);
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_can_dispose_its_own_source() {
        let source = Arc::new(EventSource::<u32>::new());
        let src = Arc::clone(&source);
        let _sub = source.event().subscribe(move |_: &u32| src.dispose());

        assert!(source.invoke(&1));
        assert!(source.is_disposed());
        assert!(!source.invoke(&2));
    }

    #[test]
    fn test_handler_can_dispose_during_nested_invoke() {
        let source = Arc::new(EventSource::<u32>::new());
        let after = Arc::new(AtomicUsize::new(0));

        let src = Arc::clone(&source);
        let _sub = source.event().subscribe(move |depth: &u32| {
            if *depth == 0 {
                src.invoke(&1);
            } else {
                src.dispose();
            }
        });
        let a = Arc::clone(&after);
        let _later = source.event().subscribe(move |_: &u32| {
            a.fetch_add(1, Ordering::SeqCst);
        });

        assert!(source.invoke(&0));
        assert!(source.is_disposed());
        assert_eq!(after.load(Ordering::SeqCst), 0);
        assert_eq!(source.subscription_count(), 0);
    }

    #[test]
    fn test_drop_disposes_subscriptions() {
        let source = EventSource::<u32>::new();
        let event = source.event();
        let sub = event.subscribe(|_: &u32| {});
        assert!(sub.is_active());

        drop(source);
        assert!(!sub.is_active());
        assert!(event.subscribe(|_: &u32| {}).is_null());
    }

    #[tokio::test]
    async fn test_invoke_async_waits_for_all_handlers() {
        let source = EventSource::<u64>::new();
        let done = Arc::new(AtomicUsize::new(0));

        let d1 = Arc::clone(&done);
        let _slow = source.event().subscribe_async(move |ms: u64| {
            let d1 = Arc::clone(&d1);
            async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                d1.fetch_add(1, Ordering::SeqCst);
            }
        });
        let d2 = Arc::clone(&done);
        let _sync = source.event().subscribe(move |_: &u64| {
            d2.fetch_add(1, Ordering::SeqCst);
        });

        assert!(source.invoke_async(20).await);
        assert_eq!(done.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invoke_async_with_skips_factory_when_empty() {
        let source = EventSource::<String>::new();
        let calls = AtomicUsize::new(0);
        let delivered = source
            .invoke_async_with1(
                |n: u32| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    n.to_string()
                },
                7,
            )
            .await;
        assert!(!delivered);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invoke_async_on_disposed_source() {
        let source = EventSource::<u32>::new();
        source.dispose();
        assert!(!source.invoke_async(1).await);
        assert_eq!(source.subscription_count(), 0);
    }
}
