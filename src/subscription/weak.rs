//! # Weak forwarding entry.
//!
//! A [`Forwarder`] stands in the registry for a weakly-held [`StrongCore`]. It owns no
//! callback, only a `Weak` to the core, so the registry never keeps a weak subscriber's
//! callback alive.
//!
//! ```text
//! registry ──Arc──► Forwarder ──Weak──► StrongCore ◄──Arc── Subscription (user)
//!                                           │
//!                                           └──Arc──► Forwarder (back-reference)
//! ```
//!
//! Once the last user handle is dropped the core is freed. The forwarder notices on the
//! next dispatch or dispose that touches it and removes itself from the registry.

use std::sync::{Arc, Weak};

use tracing::trace;

use super::callback::Dispatch;
use super::entry::Entry;
use super::strong::StrongCore;
use crate::source::SourceCore;

pub(crate) struct Forwarder<T> {
    target: Weak<StrongCore<T>>,
    source: Weak<SourceCore<T>>,
}

impl<T> Forwarder<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(target: Weak<StrongCore<T>>, source: Weak<SourceCore<T>>) -> Self {
        Self { target, source }
    }

    pub(crate) fn dispatch(self: &Arc<Self>, value: &T) -> Dispatch {
        match self.target.upgrade() {
            Some(target) => target.dispatch(value),
            None => {
                self.detach();
                Dispatch::SKIPPED
            }
        }
    }

    pub(crate) fn dispose(self: &Arc<Self>) {
        match self.target.upgrade() {
            Some(target) => target.dispose(),
            None => self.detach(),
        }
    }

    fn detach(self: &Arc<Self>) {
        let Some(source) = self.source.upgrade() else {
            return;
        };
        if source.remove(&Entry::Weak(Arc::clone(self))) {
            trace!(source = source.label(), "weak subscription expired, entry detached");
        }
    }
}
