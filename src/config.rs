//! # Per-source configuration.
//!
//! Provides [`Config`], the settings an [`EventSource`](crate::EventSource) is built with.
//!
//! ## Sentinel values
//! - `quiesce_spins = 0` → the disposer yields on every poll of the in-flight counter
//! - `name = None` → log events carry no source label

use std::borrow::Cow;

/// Configuration for a single event source.
///
/// ## Field semantics
/// - `name`: label attached to this source's log events
/// - `quiesce_spins`: busy-wait iterations before `dispose` starts yielding the thread
///   while waiting for in-flight registry operations to drain
#[derive(Clone, Debug)]
pub struct Config {
    /// Human-readable label used in `tracing` events emitted by the source.
    pub name: Option<Cow<'static, str>>,

    /// Number of `spin_loop` iterations the disposer performs before it falls back to
    /// `thread::yield_now` between polls.
    ///
    /// Registry critical sections are short (a pointer load or a CAS loop), so a
    /// small spin budget is usually enough.
    pub quiesce_spins: u32,
}

impl Config {
    /// Returns a configuration with the given source name and default settings.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Returns the label to use in log events.
    #[inline]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `name = None`
    /// - `quiesce_spins = 64`
    fn default() -> Self {
        Self {
            name: None,
            quiesce_spins: 64,
        }
    }
}
