//! # Strong subscription core.
//!
//! [`StrongCore`] owns the consumer's callback. It is the liveness token of a
//! subscription: user-facing [`Subscription`](super::Subscription) handles hold it through
//! an `Arc`, and so does the registry for strong (non-weak) registrations.
//!
//! For weak registrations the core keeps a back-reference to its [`Forwarder`], so that
//! disposing the core removes the entry the registry actually holds.
//!
//! ## Rules
//! - `dispose` is idempotent: the first call releases the callback and detaches.
//! - A disposed core dispatches as a no-op; snapshots taken before disposal may still
//!   reach it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;

use super::callback::{Callback, Dispatch};
use super::entry::Entry;
use super::weak::Forwarder;
use crate::source::SourceCore;

pub(crate) struct StrongCore<T> {
    callback: ArcSwapOption<Callback<T>>,
    source: Weak<SourceCore<T>>,
    forwarder: Option<Arc<Forwarder<T>>>,
    disposed: AtomicBool,
}

impl<T> StrongCore<T>
where
    T: Send + Sync + 'static,
{
    /// Core registered directly in the registry.
    pub(crate) fn new(callback: Callback<T>, source: Weak<SourceCore<T>>) -> Arc<Self> {
        Arc::new(Self {
            callback: ArcSwapOption::from_pointee(callback),
            source,
            forwarder: None,
            disposed: AtomicBool::new(false),
        })
    }

    /// Core reached through a [`Forwarder`]; the forwarder is what gets registered.
    pub(crate) fn with_forwarder(callback: Callback<T>, source: Weak<SourceCore<T>>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            callback: ArcSwapOption::from_pointee(callback),
            source: source.clone(),
            forwarder: Some(Arc::new(Forwarder::new(this.clone(), source))),
            disposed: AtomicBool::new(false),
        })
    }

    /// Registry entry that represents this core.
    pub(crate) fn entry(self: &Arc<Self>) -> Entry<T> {
        match &self.forwarder {
            Some(fw) => Entry::Weak(Arc::clone(fw)),
            None => Entry::Strong(Arc::clone(self)),
        }
    }

    pub(crate) fn dispatch(&self, value: &T) -> Dispatch {
        match self.callback.load_full() {
            Some(cb) => cb.call(value),
            None => Dispatch::SKIPPED,
        }
    }

    pub(crate) fn dispose(self: &Arc<Self>) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.callback.store(None);
        if let Some(source) = self.source.upgrade() {
            source.remove(&self.entry());
        }
    }

    #[inline]
    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn is_weak(&self) -> bool {
        self.forwarder.is_some()
    }
}
