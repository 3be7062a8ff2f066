//! # Recorder: buffered view of a broadcast stream.
//!
//! [`Recorder`] subscribes weakly to an [`Event`] and keeps every delivered value along
//! with where and when it arrived. It is meant for assertions in tests.
//!
//! ## Example
//! ```rust
//! use eventcast::{EventSource, Recorder};
//!
//! let source = EventSource::<u32>::new();
//! let recorder = Recorder::new(&source.event());
//!
//! source.invoke(&1);
//! recorder.pause();
//! source.invoke(&2);
//! recorder.resume();
//! source.invoke(&3);
//!
//! assert_eq!(recorder.values(), vec![1, 3]);
//! assert_eq!(recorder.entries()[1].index, 1);
//! ```
//!
//! ## Rules
//! - Values delivered while paused are not buffered and do not consume an index.
//! - `offset` is measured from the recorder's creation.
//! - Dropping the recorder drops its weak subscription; the source forgets it on the
//!   next broadcast.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant, SystemTime};

use parking_lot::Mutex;

use crate::event::Event;
use crate::subscription::Subscription;

/// One recorded value.
#[derive(Clone, Debug)]
pub struct Recorded<T> {
    /// Position in the recorder's buffer (0-based).
    pub index: usize,
    /// Wall-clock time of delivery.
    pub at: SystemTime,
    /// Time elapsed between the recorder's creation and delivery.
    pub offset: Duration,
    /// Thread the value was delivered on.
    pub thread: ThreadId,
    /// Name of that thread, if it has one.
    pub thread_name: Option<String>,
    /// The delivered value.
    pub value: T,
}

struct State<T> {
    entries: Mutex<Vec<Recorded<T>>>,
    paused: AtomicBool,
    started: Instant,
}

impl<T: Clone> State<T> {
    fn record(&self, value: &T) {
        if self.paused.load(Ordering::Acquire) {
            return;
        }
        let current = thread::current();
        let mut entries = self.entries.lock();
        let index = entries.len();
        entries.push(Recorded {
            index,
            at: SystemTime::now(),
            offset: self.started.elapsed(),
            thread: current.id(),
            thread_name: current.name().map(str::to_owned),
            value: value.clone(),
        });
    }
}

/// Weakly-subscribed buffer of broadcast values.
pub struct Recorder<T> {
    state: Arc<State<T>>,
    subscription: Subscription<T>,
}

impl<T> Recorder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Starts recording values broadcast on `event`.
    ///
    /// On an unbound handle (or a disposed source) the recorder stays empty.
    pub fn new(event: &Event<T>) -> Self {
        let state = Arc::new(State {
            entries: Mutex::new(Vec::new()),
            paused: AtomicBool::new(false),
            started: Instant::now(),
        });
        let sink = Arc::clone(&state);
        let subscription = event.subscribe_weak(move |value: &T| sink.record(value));
        Self {
            state,
            subscription,
        }
    }

    /// Stops buffering until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.state.paused.store(true, Ordering::Release);
    }

    /// Resumes buffering.
    pub fn resume(&self) {
        self.state.paused.store(false, Ordering::Release);
    }

    /// Returns `true` between [`pause`](Self::pause) and [`resume`](Self::resume).
    pub fn is_paused(&self) -> bool {
        self.state.paused.load(Ordering::Acquire)
    }

    /// Returns `true` while the recorder's subscription is registered.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    /// Copies of every recorded entry, in delivery order.
    pub fn entries(&self) -> Vec<Recorded<T>> {
        self.state.entries.lock().clone()
    }

    /// Copies of every recorded value, in delivery order.
    pub fn values(&self) -> Vec<T> {
        self.state
            .entries
            .lock()
            .iter()
            .map(|e| e.value.clone())
            .collect()
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.state.entries.lock().len()
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.state.entries.lock().is_empty()
    }

    /// Drops every buffered entry; the next one gets index 0.
    pub fn clear(&self) {
        self.state.entries.lock().clear();
    }
}

impl<T> fmt::Debug for Recorder<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("len", &self.len())
            .field("paused", &self.is_paused())
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventSource;

    #[test]
    fn test_records_metadata() {
        let source = EventSource::<&'static str>::new();
        let recorder = Recorder::new(&source.event());

        source.invoke(&"a");
        source.invoke(&"b");

        let entries = recorder.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].index, 0);
        assert_eq!(entries[1].index, 1);
        assert_eq!(entries[0].thread, thread::current().id());
        assert!(entries[0].offset <= entries[1].offset);
        assert_eq!(recorder.values(), vec!["a", "b"]);
    }

    #[test]
    fn test_records_originating_thread() {
        let source = Arc::new(EventSource::<u8>::new());
        let recorder = Recorder::new(&source.event());

        let src = Arc::clone(&source);
        let worker = thread::Builder::new()
            .name("recorder-worker".into())
            .spawn(move || {
                src.invoke(&9);
                thread::current().id()
            })
            .unwrap()
            .join()
            .unwrap();

        let entries = recorder.entries();
        assert_eq!(entries[0].thread, worker);
        assert_eq!(entries[0].thread_name.as_deref(), Some("recorder-worker"));
    }

    #[test]
    fn test_pause_resume_and_clear() {
        let source = EventSource::<u32>::new();
        let recorder = Recorder::new(&source.event());

        source.invoke(&1);
        recorder.pause();
        assert!(recorder.is_paused());
        source.invoke(&2);
        recorder.resume();
        source.invoke(&3);
        assert_eq!(recorder.values(), vec![1, 3]);

        recorder.clear();
        assert!(recorder.is_empty());
        source.invoke(&4);
        assert_eq!(recorder.entries()[0].index, 0);
    }

    #[test]
    fn test_drop_releases_registration() {
        let source = EventSource::<u32>::new();
        let recorder = Recorder::new(&source.event());
        assert_eq!(source.subscription_count(), 1);

        drop(recorder);
        source.invoke(&1);
        assert_eq!(source.subscription_count(), 0);
    }

    #[test]
    fn test_unbound_event_records_nothing() {
        let recorder = Recorder::<u32>::new(&Event::unbound());
        assert!(!recorder.is_subscribed());
        assert!(recorder.is_empty());
    }
}
