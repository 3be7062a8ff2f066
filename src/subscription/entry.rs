//! Registry entries: the tagged variant stored in a source's snapshot.

use std::sync::Arc;

use super::callback::Dispatch;
use super::strong::StrongCore;
use super::weak::Forwarder;

/// One registration as seen by the registry.
///
/// Equality is pointer identity of the wrapped `Arc`, so duplicates of the same
/// callback registered twice are distinct entries.
pub(crate) enum Entry<T> {
    Strong(Arc<StrongCore<T>>),
    Weak(Arc<Forwarder<T>>),
}

impl<T> Entry<T>
where
    T: Send + Sync + 'static,
{
    #[inline]
    pub(crate) fn dispatch(&self, value: &T) -> Dispatch {
        match self {
            Entry::Strong(core) => core.dispatch(value),
            Entry::Weak(fw) => fw.dispatch(value),
        }
    }

    #[inline]
    pub(crate) fn dispose(&self) {
        match self {
            Entry::Strong(core) => core.dispose(),
            Entry::Weak(fw) => fw.dispose(),
        }
    }

    #[inline]
    pub(crate) fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Entry::Strong(a), Entry::Strong(b)) => Arc::ptr_eq(a, b),
            (Entry::Weak(a), Entry::Weak(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        match self {
            Entry::Strong(core) => Entry::Strong(Arc::clone(core)),
            Entry::Weak(fw) => Entry::Weak(Arc::clone(fw)),
        }
    }
}
