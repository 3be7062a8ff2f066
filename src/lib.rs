//! # eventcast
//!
//! **eventcast** is an in-process publish/subscribe primitive for Rust.
//!
//! A producer owns an [`EventSource`] and hands out its subscribe-only [`Event`]
//! handle. Consumers attach callbacks (sync or async, strong or weak) and get back a
//! disposable [`Subscription`]. The producer broadcasts with
//! [`invoke`](EventSource::invoke) or [`invoke_async`](EventSource::invoke_async).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   Producer                                   Consumers
//! ┌──────────────────┐   event()    ┌──────────────────────────────────────┐
//! │  EventSource<T>  │─────────────►│  Event<T>  (subscribe-only handle)   │
//! │                  │              │   subscribe / subscribe_weak / ...   │
//! │  invoke(&v)      │              └──────────────────┬───────────────────┘
//! │  invoke_async(v) │                                 │ Subscription<T>
//! │  dispose()       │                                 ▼
//! └────────┬─────────┘      ┌───────────────────────────────────────────────┐
//!          │                │ Registry: ArcSwap<Vec<Entry<T>>>  (CoW + CAS) │
//!          │  snapshot      │  [Strong] [Weak ─ ─► Strong] [Strong] ...     │
//!          └───────────────►└──────────────────────┬────────────────────────┘
//!                                                  │ in registration order
//!                                                  ▼
//!                              handler 1 ─► handler 2 ─► handler N
//!                                   │ panic / Err (isolated per handler)
//!                                   ▼
//!                  unobserved_failures(): process-wide EventSource<HandlerError>
//! ```
//!
//! ### Lifetimes
//! ```text
//! strong:  registry ──Arc──► StrongCore(callback) ◄──Arc── Subscription
//! weak:    registry ──Arc──► Forwarder ──Weak──► StrongCore(callback) ◄──Arc── Subscription
//! null:    Subscription (nothing behind it)
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / functions                   |
//! |-------------------|----------------------------------------------------------------|-----------------------------------------|
//! | **Broadcast**     | Lock-free registry, ordered sync/async fan-out                  | [`EventSource`]                         |
//! | **Subscribe**     | Closures, async closures and sinks; strong or weak lifetime     | [`Event`], [`Subscription`], [`ReportSink`], [`AsyncReportSink`] |
//! | **Failures**      | Per-handler isolation, process-wide failure channel             | [`HandlerError`], [`unobserved_failures`], [`notify`] |
//! | **Configuration** | Source naming, dispose spin budget                              | [`Config`]                              |
//! | **Testing**       | Buffered recording of broadcast values                          | [`Recorder`], [`Recorded`]              |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], which writes unobserved failures via `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use eventcast::EventSource;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let source = EventSource::<String>::new();
//!     let event = source.event();
//!
//!     let log = Arc::new(Mutex::new(Vec::new()));
//!     let sink = Arc::clone(&log);
//!     let _sync = event.subscribe(move |s: &String| sink.lock().push(format!("sync:{s}")));
//!
//!     let sink = Arc::clone(&log);
//!     let _async = event.subscribe_async(move |s: String| {
//!         let sink = Arc::clone(&sink);
//!         async move {
//!             tokio::task::yield_now().await;
//!             sink.lock().push(format!("async:{s}"));
//!         }
//!     });
//!
//!     // Waits for the async handler too.
//!     assert!(source.invoke_async("hi".to_string()).await);
//!     assert_eq!(*log.lock(), vec!["sync:hi", "async:hi"]);
//!
//!     source.dispose();
//!     assert!(!source.invoke(&"ignored".to_string()));
//! }
//! ```
mod channel;
mod config;
mod error;
mod event;
mod recorder;
mod sink;
mod source;
mod subscription;

// ---- Public re-exports ----

pub use channel::{notify, unobserved_failures};
pub use config::Config;
pub use error::{BoxError, HandlerError, Outcome};
pub use event::Event;
pub use recorder::{Recorded, Recorder};
pub use sink::{AsyncReportSink, ReportSink};
pub use source::EventSource;
pub use subscription::Subscription;

// Optional: expose a built-in failure logger.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use channel::LogWriter;
