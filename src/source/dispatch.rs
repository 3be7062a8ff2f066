//! # Broadcast engine.
//!
//! Dispatches one value to every entry of a registry snapshot, in snapshot order.
//! Both entry points run inside [`SourceCore::broadcast`], so a concurrent dispose
//! waits for them; awaiting the pending set happens after it.
//!
//! ## Flow
//! ```text
//! dispatch_all(entries, &value)                  (invoke)
//!   for entry in entries:
//!     ├─ Done(Ok)      ─► next
//!     ├─ Done(Err(e))  ─► forward(e) to the unobserved failure channel
//!     └─ Pending(fut)  ─► detach: spawn on the ambient Tokio runtime,
//!                         forward a later Err when it completes
//!
//! start_all(entries, &value)                     (invoke_async, inside broadcast)
//!   for entry in entries:
//!     ├─ Done(Ok)      ─► next (not part of the wait set)
//!     ├─ Done(Err(e))  ─► forward(e)
//!     └─ Pending(fut)  ─► FuturesUnordered
//! await_all(pending)                             (invoke_async, after broadcast)
//!   await every pending future, forwarding each Err as it completes
//! ```
//!
//! ## Rules
//! - A failing entry never stops the loop; failures are forwarded one by one.
//! - Nothing here panics or returns an error because of a subscriber.

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{trace, warn};

use super::registry::SourceCore;
use crate::channel;
use crate::subscription::{Dispatch, Entry, OutcomeFuture};

pub(crate) type Pending = FuturesUnordered<OutcomeFuture>;

impl<T> SourceCore<T>
where
    T: Send + Sync + 'static,
{
    /// Runs every entry of `entries` on the calling thread.
    pub(crate) fn dispatch_all(&self, entries: &[Entry<T>], value: &T) {
        for entry in entries {
            match entry.dispatch(value) {
                Dispatch::Done(Ok(())) => {}
                Dispatch::Done(Err(err)) => channel::forward(err, self.id(), self.label()),
                Dispatch::Pending(fut) => self.detach_pending(fut),
            }
        }
    }

    /// Starts every entry of `entries`, collecting the ones that suspended.
    pub(crate) fn start_all(&self, entries: &[Entry<T>], value: &T) -> Pending {
        let pending = FuturesUnordered::new();
        for entry in entries {
            match entry.dispatch(value) {
                Dispatch::Done(Ok(())) => {}
                Dispatch::Done(Err(err)) => channel::forward(err, self.id(), self.label()),
                Dispatch::Pending(fut) => pending.push(fut),
            }
        }
        pending
    }

    /// Awaits every handler left pending by [`start_all`](Self::start_all).
    pub(crate) async fn await_all(&self, mut pending: Pending) {
        while let Some(outcome) = pending.next().await {
            if let Err(err) = outcome {
                channel::forward(err, self.id(), self.label());
            }
        }
    }

    /// Lets a suspended handler finish without waiting for it.
    ///
    /// Prefers the ambient Tokio runtime; without one the future is driven on a helper
    /// thread so that the handler still completes and its failure is still observed.
    fn detach_pending(&self, fut: OutcomeFuture) {
        let (id, label) = (self.id(), self.label().to_owned());
        let task = async move {
            if let Err(err) = fut.await {
                channel::forward(err, id, &label);
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                trace!(source = self.label(), "async handler pending, continuing on runtime");
                drop(handle.spawn(task));
            }
            Err(_) => {
                warn!(
                    source = self.label(),
                    "async handler pending outside a Tokio runtime, driving it on a helper thread"
                );
                std::thread::spawn(move || futures::executor::block_on(task));
            }
        }
    }
}
