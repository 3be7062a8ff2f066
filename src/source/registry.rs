//! # Lock-free subscriber registry.
//!
//! [`SourceCore`] is the shared state behind an [`EventSource`](crate::EventSource) and
//! every [`Event`](crate::Event) handle bound to it.
//!
//! ## Architecture
//! ```text
//!            ┌──────────────── ArcSwap<Vec<Entry<T>>> ────────────────┐
//!  readers:  │ load_full() ─► immutable snapshot (never blocks)       │
//!  writers:  │ load ─► copy + modify ─► compare_and_swap ─► retry     │
//!            └────────────────────────────────────────────────────────┘
//!  in_flight: critical sections in progress (add, remove, broadcast)
//!  disposed : false ─► true, never reverses
//! ```
//!
//! ## Dispose protocol
//! 1. Swap `disposed` to `true`; only the first caller proceeds.
//! 2. Spin until every critical section that started before step 1 has left, not
//!    counting the broadcasts of this source the disposing thread is itself inside.
//! 3. Swap in an empty registry and dispose every captured entry.
//!
//! Critical sections increment `in_flight` **before** checking `disposed`, and the
//! disposer sets `disposed` **before** reading `in_flight` (all `SeqCst`), so either the
//! operation observes the flag and backs out, or the disposer waits for it.
//!
//! A broadcast is a critical section for its whole synchronous part: every handler of
//! `invoke`, and the start of every handler of `invoke_async`. What an async handler
//! does after it first suspends is outside of it.
//!
//! A handler that disposes its own source does not wait for the broadcast it runs in;
//! entries it has not reached yet are skipped once torn down. Two handlers on different
//! threads that each dispose the other's source while inside a broadcast deadlock.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use tracing::debug;

use crate::config::Config;
use crate::subscription::{Callback, Entry, StrongCore, Subscription};

pub(crate) struct SourceCore<T> {
    entries: ArcSwap<Vec<Entry<T>>>,
    disposed: AtomicBool,
    in_flight: AtomicUsize,
    config: Config,
}

/// Marks the current thread as inside a registry critical section.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

thread_local! {
    /// Sources this thread is currently broadcasting on, innermost last.
    static BROADCASTING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Records a broadcast of one source on the current thread.
struct Broadcasting(usize);

impl Broadcasting {
    fn enter(id: usize) -> Self {
        BROADCASTING.with(|stack| stack.borrow_mut().push(id));
        Self(id)
    }

    /// Number of broadcasts of source `id` the current thread is inside.
    fn depth(id: usize) -> usize {
        BROADCASTING.with(|stack| stack.borrow().iter().filter(|&&s| s == id).count())
    }
}

impl Drop for Broadcasting {
    fn drop(&mut self) {
        BROADCASTING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|&s| s == self.0) {
                stack.remove(pos);
            }
        });
    }
}

impl<T> SourceCore<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            entries: ArcSwap::from_pointee(Vec::new()),
            disposed: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            config,
        })
    }

    /// Enters a critical section, or returns `None` once disposal has begun.
    fn enter(&self) -> Option<InFlight<'_>> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);
        if self.disposed.load(Ordering::SeqCst) {
            return None;
        }
        Some(guard)
    }

    /// Applies `edit` with optimistic compare-and-swap retry.
    ///
    /// `edit` returns `None` to leave the registry untouched. Returns whether a new
    /// snapshot was published.
    fn update<F>(&self, mut edit: F) -> bool
    where
        F: FnMut(&[Entry<T>]) -> Option<Vec<Entry<T>>>,
    {
        let mut current = self.entries.load_full();
        loop {
            let Some(next) = edit(&current) else {
                return false;
            };
            let prev = self.entries.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&prev, &current) {
                return true;
            }
            current = Guard::into_inner(prev);
        }
    }

    /// Registers `callback` with strong lifetime.
    pub(crate) fn add(self: &Arc<Self>, callback: Callback<T>) -> Subscription<T> {
        let Some(_guard) = self.enter() else {
            return Subscription::null();
        };
        let core = StrongCore::new(callback, Arc::downgrade(self));
        self.append(core.entry());
        Subscription::from_core(core)
    }

    /// Registers `callback` behind a weak forwarder; only the forwarder is stored.
    pub(crate) fn add_weak(self: &Arc<Self>, callback: Callback<T>) -> Subscription<T> {
        let Some(_guard) = self.enter() else {
            return Subscription::null();
        };
        let core = StrongCore::with_forwarder(callback, Arc::downgrade(self));
        self.append(core.entry());
        Subscription::from_core(core)
    }

    fn append(&self, entry: Entry<T>) {
        self.update(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend_from_slice(current);
            next.push(entry.clone());
            Some(next)
        });
    }

    /// Removes the first entry identical to `entry`. No-op once disposed.
    pub(crate) fn remove(&self, entry: &Entry<T>) -> bool {
        let Some(_guard) = self.enter() else {
            return false;
        };
        self.update(|current| {
            let idx = current.iter().position(|e| e.same(entry))?;
            let mut next = Vec::with_capacity(current.len() - 1);
            next.extend_from_slice(&current[..idx]);
            next.extend_from_slice(&current[idx + 1..]);
            Some(next)
        })
    }

    /// Runs `run` over the current registry inside a critical section.
    ///
    /// Returns `None` without calling `run` if the source is disposed or empty. A
    /// concurrent dispose waits until `run` returns.
    pub(crate) fn broadcast<R>(&self, run: impl FnOnce(&[Entry<T>]) -> R) -> Option<R> {
        let _guard = self.enter()?;
        let entries = self.entries.load_full();
        if entries.is_empty() {
            return None;
        }
        let _mark = Broadcasting::enter(self.id());
        Some(run(&entries))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.load().len()
    }

    #[inline]
    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Identity of this source, stable for its lifetime.
    #[inline]
    pub(crate) fn id(&self) -> usize {
        self as *const Self as *const () as usize
    }

    #[inline]
    pub(crate) fn label(&self) -> &str {
        self.config.label()
    }

    /// Flag, drain, tear down. Idempotent.
    pub(crate) fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.wait_quiescent();

        let entries = self.entries.swap(Arc::new(Vec::new()));
        for entry in entries.iter() {
            entry.dispose();
        }
        debug!(
            source = self.label(),
            entries = entries.len(),
            "event source disposed"
        );
    }

    fn wait_quiescent(&self) {
        let own = Broadcasting::depth(self.id());
        let mut spins = 0u32;
        while self.in_flight.load(Ordering::SeqCst) > own {
            if spins < self.config.quiesce_spins {
                spins += 1;
                std::hint::spin_loop();
            } else {
                std::thread::yield_now();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::thread;

    fn current(core: &SourceCore<u32>) -> Arc<Vec<Entry<u32>>> {
        core.entries.load_full()
    }

    fn counter_callback(hits: &Arc<AtomicU32>) -> Callback<u32> {
        let hits = Arc::clone(hits);
        Callback::from_fn(move |_: &u32| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let core = SourceCore::<u32>::new(Config::default());
        let hits = Arc::new(AtomicU32::new(0));
        let a = core.add(counter_callback(&hits));
        let b = core.add(counter_callback(&hits));
        let c = core.add_weak(counter_callback(&hits));

        let snap = current(&core);
        assert_eq!(snap.len(), 3);
        assert!(matches!(snap[0], Entry::Strong(_)));
        assert!(matches!(snap[1], Entry::Strong(_)));
        assert!(matches!(snap[2], Entry::Weak(_)));
        drop((a, b, c));
    }

    #[test]
    fn test_remove_first_identical_only() {
        let core = SourceCore::<u32>::new(Config::default());
        let hits = Arc::new(AtomicU32::new(0));
        let sub = core.add(counter_callback(&hits));
        let _other = core.add(counter_callback(&hits));

        let snap = current(&core);
        let first = snap[0].clone();
        assert!(core.remove(&first));
        assert!(!core.remove(&first));
        assert_eq!(core.len(), 1);
        assert!(sub.is_active());
    }

    #[test]
    fn test_broadcast_skipped_when_empty() {
        let core = SourceCore::<u32>::new(Config::default());
        assert!(core.broadcast(|_| unreachable!("empty registry")).is_none());
    }

    #[test]
    fn test_broadcast_marks_current_thread() {
        let core = SourceCore::<u32>::new(Config::default());
        let _sub = core.add(counter_callback(&Arc::new(AtomicU32::new(0))));
        let id = core.id();

        let depth = core
            .broadcast(|_| core.broadcast(|_| Broadcasting::depth(id)))
            .flatten();
        assert_eq!(depth, Some(2));
        assert_eq!(Broadcasting::depth(id), 0);
        assert_eq!(core.in_flight.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dispose_waits_for_broadcast_on_other_thread() {
        let core = SourceCore::<u32>::new(Config::default());
        let _sub = core.add(counter_callback(&Arc::new(AtomicU32::new(0))));
        let entered = Arc::new(std::sync::Barrier::new(2));
        let done = Arc::new(AtomicBool::new(false));

        let worker = {
            let (core, entered, done) = (Arc::clone(&core), Arc::clone(&entered), Arc::clone(&done));
            thread::spawn(move || {
                core.broadcast(|_| {
                    entered.wait();
                    thread::sleep(std::time::Duration::from_millis(100));
                    done.store(true, Ordering::SeqCst);
                })
            })
        };

        entered.wait();
        core.dispose();
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(worker.join().unwrap(), Some(()));
    }

    #[test]
    fn test_dispose_clears_and_rejects() {
        let core = SourceCore::<u32>::new(Config::named("registry-test"));
        let hits = Arc::new(AtomicU32::new(0));
        let strong = core.add(counter_callback(&hits));
        let weak = core.add_weak(counter_callback(&hits));

        core.dispose();
        core.dispose();

        assert!(core.is_disposed());
        assert_eq!(core.len(), 0);
        assert!(core.broadcast(|_| ()).is_none());
        assert!(!strong.is_active());
        assert!(!weak.is_active());
        assert!(core.add(counter_callback(&hits)).is_null());
        assert_eq!(core.in_flight.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let core = SourceCore::<u32>::new(Config::default());
        let hits = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let core = Arc::clone(&core);
                let hits = Arc::clone(&hits);
                thread::spawn(move || {
                    (0..200)
                        .map(|_| core.add(counter_callback(&hits)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let subs: Vec<_> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(core.len(), 1600);

        for sub in &subs {
            sub.dispose();
        }
        assert_eq!(core.len(), 0);
    }

    #[test]
    fn test_dispose_races_with_adds() {
        for _ in 0..20 {
            let core = SourceCore::<u32>::new(Config {
                quiesce_spins: 0,
                ..Config::default()
            });
            let hits = Arc::new(AtomicU32::new(0));

            let adders: Vec<_> = (0..4)
                .map(|_| {
                    let core = Arc::clone(&core);
                    let hits = Arc::clone(&hits);
                    thread::spawn(move || {
                        for _ in 0..100 {
                            let _ = core.add(counter_callback(&hits));
                        }
                    })
                })
                .collect();

            core.dispose();
            for a in adders {
                a.join().unwrap();
            }
            assert_eq!(core.len(), 0, "registry must stay empty after dispose");
        }
    }
}
