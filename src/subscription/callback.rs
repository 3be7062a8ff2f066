//! # Normalized subscriber callbacks.
//!
//! Every subscribe shape (value closure, no-arg closure, async closures, report sinks)
//! is normalized into one of two [`Callback`] variants before registration:
//!
//! ```text
//! Fn(&T) -> O            ─┐
//! Fn() -> O              ─┼──► Callback::Sync   ──► call() ──► Dispatch::Done
//! ReportSink<T>          ─┘
//!
//! Fn(T) -> Fut           ─┐                              ┌─► Dispatch::Done    (ready on first poll)
//! Fn() -> Fut            ─┼──► Callback::Async  ──► call() ─┤
//! AsyncReportSink<T>     ─┘                              └─► Dispatch::Pending (suspended)
//! ```
//!
//! ## Rules
//! - Panics are caught at every stage: the sync call, the async factory call and every
//!   poll of the returned future.
//! - Async futures are polled **once** on the calling thread; the caller decides what to
//!   do with a pending one.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;

use crate::error::{HandlerError, Outcome};
use crate::sink::{AsyncReportSink, ReportSink};

/// Boxed, panic-guarded future produced by an async callback.
pub(crate) type OutcomeFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send>>;

type SyncFn<T> = Box<dyn Fn(&T) -> Result<(), HandlerError> + Send + Sync>;
type AsyncFn<T> = Box<dyn Fn(&T) -> OutcomeFuture + Send + Sync>;

/// Result of starting one handler.
pub(crate) enum Dispatch {
    /// The handler finished on the calling thread.
    Done(Result<(), HandlerError>),
    /// The handler suspended; the future must be driven to learn its outcome.
    Pending(OutcomeFuture),
}

impl Dispatch {
    /// Dispatch result of a handler that had nothing to do.
    pub(crate) const SKIPPED: Dispatch = Dispatch::Done(Ok(()));
}

/// A subscriber callback in one of its two normalized shapes.
pub(crate) enum Callback<T> {
    Sync(SyncFn<T>),
    Async(AsyncFn<T>),
}

impl<T> Callback<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn from_fn<F, O>(f: F) -> Self
    where
        F: Fn(&T) -> O + Send + Sync + 'static,
        O: Outcome,
    {
        Callback::Sync(Box::new(move |value: &T| f(value).into_outcome()))
    }

    pub(crate) fn from_unit_fn<F, O>(f: F) -> Self
    where
        F: Fn() -> O + Send + Sync + 'static,
        O: Outcome,
    {
        Callback::Sync(Box::new(move |_: &T| f().into_outcome()))
    }

    pub(crate) fn from_sink(sink: Arc<dyn ReportSink<T>>) -> Self {
        Callback::Sync(Box::new(move |value: &T| {
            sink.report(value);
            Ok(())
        }))
    }

    pub(crate) fn from_async_unit_fn<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Outcome,
    {
        Callback::Async(Box::new(move |_: &T| guard(f())))
    }

    /// Starts the handler with `value`.
    ///
    /// Never panics: a panic anywhere in the handler becomes `Dispatch::Done(Err(..))`
    /// or, after suspension, the `Err` output of the pending future.
    pub(crate) fn call(&self, value: &T) -> Dispatch {
        match self {
            Callback::Sync(f) => match panic::catch_unwind(AssertUnwindSafe(|| f(value))) {
                Ok(outcome) => Dispatch::Done(outcome),
                Err(payload) => Dispatch::Done(Err(HandlerError::from_panic(payload))),
            },
            Callback::Async(f) => match panic::catch_unwind(AssertUnwindSafe(|| f(value))) {
                Ok(fut) => poll_once(fut),
                Err(payload) => Dispatch::Done(Err(HandlerError::from_panic(payload))),
            },
        }
    }
}

impl<T> Callback<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn from_async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Outcome,
    {
        Callback::Async(Box::new(move |value: &T| guard(f(value.clone()))))
    }

    pub(crate) fn from_async_sink(sink: Arc<dyn AsyncReportSink<T>>) -> Self {
        Callback::Async(Box::new(move |value: &T| {
            let sink = Arc::clone(&sink);
            let value = value.clone();
            guard(async move { sink.report(value).await })
        }))
    }
}

/// Boxes `fut`, converting its output and any panic raised while polling it.
fn guard<Fut>(fut: Fut) -> OutcomeFuture
where
    Fut: Future + Send + 'static,
    Fut::Output: Outcome,
{
    Box::pin(
        AssertUnwindSafe(fut)
            .catch_unwind()
            .map(|res| match res {
                Ok(output) => output.into_outcome(),
                Err(payload) => Err(HandlerError::from_panic(payload)),
            }),
    )
}

/// Runs `fut` up to its first suspension point on the calling thread.
///
/// Uses a no-op waker: whoever drives a pending future afterwards polls it again with
/// a real waker, which re-registers interest.
fn poll_once(mut fut: OutcomeFuture) -> Dispatch {
    let mut cx = Context::from_waker(futures::task::noop_waker_ref());
    match fut.poll_unpin(&mut cx) {
        Poll::Ready(outcome) => Dispatch::Done(outcome),
        Poll::Pending => Dispatch::Pending(fut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn done(dispatch: Dispatch) -> Result<(), HandlerError> {
        match dispatch {
            Dispatch::Done(outcome) => outcome,
            Dispatch::Pending(_) => panic!("expected a completed dispatch"),
        }
    }

    #[test]
    fn test_sync_callback_runs() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let cb = Callback::<u32>::from_fn(move |v: &u32| {
            h.fetch_add(*v as usize, Ordering::SeqCst);
        });
        assert!(done(cb.call(&5)).is_ok());
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    fn explode() {
        panic!("callback exploded")
    }

    #[test]
    fn test_sync_panic_is_captured() {
        let cb = Callback::<u32>::from_unit_fn(explode);
        let err = done(cb.call(&1)).unwrap_err();
        assert!(err.is_panic());
        assert_eq!(err.message(), "callback exploded");
    }

    #[test]
    fn test_sync_err_is_captured() {
        let cb = Callback::<u32>::from_fn(|v: &u32| -> Result<(), String> {
            Err(format!("rejected {v}"))
        });
        let err = done(cb.call(&9)).unwrap_err();
        assert!(!err.is_panic());
        assert_eq!(err.message(), "rejected 9");
    }

    #[test]
    fn test_async_ready_on_first_poll() {
        let cb = Callback::<String>::from_async_fn(|v: String| async move {
            assert_eq!(v, "ready");
        });
        assert!(done(cb.call(&"ready".to_string())).is_ok());
    }

    #[test]
    fn test_async_factory_panic_is_captured() {
        let cb = Callback::<u32>::from_async_unit_fn(|| -> futures::future::Ready<()> {
            panic!("factory exploded")
        });
        let err = done(cb.call(&0)).unwrap_err();
        assert_eq!(err.message(), "factory exploded");
    }

    #[test]
    fn test_async_pending_then_error() {
        let (tx, rx) = futures::channel::oneshot::channel::<()>();
        let rx = parking_lot::Mutex::new(Some(rx));
        let cb = Callback::<u32>::from_async_unit_fn(move || {
            let rx = rx.lock().take();
            async move {
                if let Some(rx) = rx {
                    let _ = rx.await;
                }
                Err::<(), String>("late failure".to_string())
            }
        });

        let fut = match cb.call(&0) {
            Dispatch::Pending(fut) => fut,
            Dispatch::Done(_) => panic!("expected a pending dispatch"),
        };
        tx.send(()).unwrap();
        let err = futures::executor::block_on(fut).unwrap_err();
        assert!(!err.is_panic());
        assert_eq!(err.message(), "late failure");
    }
}
