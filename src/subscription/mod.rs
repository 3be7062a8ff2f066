//! # Subscription variants.
//!
//! A registration is modelled as a small tagged variant rather than a trait hierarchy:
//!
//! | Variant      | Owns                         | Lives in                       |
//! |--------------|------------------------------|--------------------------------|
//! | strong-sync  | `Fn(&T)` callback            | registry + user handle         |
//! | strong-async | `Fn(&T) -> Future` callback  | registry + user handle         |
//! | weak         | `Weak` to a strong core      | registry only                  |
//! | null         | nothing                      | user handle only               |
//!
//! Strong-sync and strong-async share one core type ([`StrongCore`](strong::StrongCore));
//! the difference is the [`Callback`](callback::Callback) variant it owns.
//!
//! ## Dispose logic
//! ```text
//! Subscription::dispose()
//!     └─► StrongCore::dispose()       (first call only)
//!           ├─ release callback
//!           └─ source.remove(entry)   entry = Forwarder if weak, else the core itself
//!
//! Forwarder::dispatch()/dispose()
//!     ├─ target alive ─► forward to StrongCore
//!     └─ target gone  ─► source.remove(self)
//! ```

mod callback;
mod entry;
mod handle;
mod strong;
mod weak;

pub(crate) use callback::{Callback, Dispatch, OutcomeFuture};
pub(crate) use entry::Entry;
pub use handle::Subscription;
pub(crate) use strong::StrongCore;
