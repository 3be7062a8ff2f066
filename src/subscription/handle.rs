//! # User-facing subscription handle.
//!
//! [`Subscription`] is what every subscribe call returns. It is either bound to a
//! strong core or the null subscription.
//!
//! ## Lifetime
//! - **Strong** registrations stay registered until [`Subscription::dispose`] is called
//!   or the source is disposed. Dropping the handle does not unsubscribe.
//! - **Weak** registrations stay registered only while at least one clone of the handle
//!   is alive. Once the last clone is dropped, the registry entry is removed the next
//!   time a broadcast or dispose touches it.
//! - The **null** subscription is returned when subscribing to an unbound handle or a
//!   disposed source. It allocates nothing and every operation on it is a no-op.

use std::fmt;
use std::sync::Arc;

use super::strong::StrongCore;

/// Disposable registration of one callback.
///
/// Cheap to clone; clones refer to the same registration.
pub struct Subscription<T> {
    core: Option<Arc<StrongCore<T>>>,
}

impl<T> Subscription<T> {
    /// Returns the null subscription.
    #[inline]
    pub const fn null() -> Self {
        Self { core: None }
    }

    #[inline]
    pub(crate) fn from_core(core: Arc<StrongCore<T>>) -> Self {
        Self { core: Some(core) }
    }

    /// Returns `true` for the null subscription.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.core.is_none()
    }
}

impl<T> Subscription<T>
where
    T: Send + Sync + 'static,
{
    /// Detaches the callback from its source and releases it.
    ///
    /// Idempotent; disposing the null subscription or an already-disposed one does
    /// nothing. A broadcast that snapshotted the registry before this call may still
    /// visit the entry, but the released callback is no longer run.
    pub fn dispose(&self) {
        if let Some(core) = &self.core {
            core.dispose();
        }
    }

    /// Returns `true` while the callback is registered and not disposed.
    ///
    /// Disposing the source also deactivates its subscriptions.
    pub fn is_active(&self) -> bool {
        self.core.as_ref().is_some_and(|core| !core.is_disposed())
    }

    /// Returns `true` if the registration was made with weak lifetime.
    pub fn is_weak(&self) -> bool {
        self.core.as_ref().is_some_and(|core| core.is_weak())
    }
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T> Default for Subscription<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> fmt::Debug for Subscription<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.core {
            None => f.write_str("Subscription::Null"),
            Some(core) => f
                .debug_struct("Subscription")
                .field("weak", &core.is_weak())
                .field("disposed", &core.is_disposed())
                .finish(),
        }
    }
}
