//! Activity-tracking side integration.
//!
//! A workout session on an external activity-tracking service is a
//! best-effort side effect of the timer's lifecycle: it begins on the first
//! `started` event, pauses when the countdown is stopped, and ends on the
//! `finished` event of the catalog's last interval. The service itself sits
//! behind the [`ActivityTracker`] trait; [`TrackingBridge`] drives it from
//! the observer protocol.
//!
//! Tracker calls are fire-and-forget: each runs on a detached task, and
//! failures are logged and swallowed. Nothing here can propagate into or
//! block the state machine.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use crate::observer::ProgressObserver;
use crate::types::{Catalog, IntervalId, IntervalSpec};

/// External workout-session service.
///
/// Implementations talk to whatever health or activity backend the embedder
/// uses. Every method is best-effort: errors are reported for logging only
/// and never influence the timer.
#[async_trait]
pub trait ActivityTracker: Send + Sync + 'static {
    /// Open a new workout session.
    async fn begin_session(&self) -> anyhow::Result<()>;

    /// Pause the open session.
    async fn pause_session(&self) -> anyhow::Result<()>;

    /// End the open session.
    async fn end_session(&self) -> anyhow::Result<()>;
}

/// Observer decorator that maps timer events onto a workout session.
///
/// The timer supports a single observer, so the bridge forwards every event
/// to an optional inner observer (typically the display surface) after
/// handling its own session bookkeeping:
///
/// - first `started` while no session is active opens one,
/// - `stopped` pauses it,
/// - `finished` for the last catalog interval ends it; a later `started`
///   opens a fresh session.
pub struct TrackingBridge {
    tracker: Arc<dyn ActivityTracker>,
    final_interval: Option<IntervalId>,
    session_active: AtomicBool,
    inner: Option<Arc<dyn ProgressObserver>>,
}

impl TrackingBridge {
    /// Bridge `tracker` to the timer events of a sequence over `catalog`.
    pub fn new(tracker: Arc<dyn ActivityTracker>, catalog: &Catalog) -> Self {
        Self {
            tracker,
            final_interval: catalog.last().map(IntervalSpec::id),
            session_active: AtomicBool::new(false),
            inner: None,
        }
    }

    /// Forward every event to `inner` after session bookkeeping.
    pub fn with_inner(mut self, inner: Arc<dyn ProgressObserver>) -> Self {
        self.inner = Some(inner);
        self
    }

    /// True while a session is considered open.
    pub fn session_active(&self) -> bool {
        self.session_active.load(Ordering::SeqCst)
    }

    fn forward(&self, deliver: impl FnOnce(&dyn ProgressObserver)) {
        if let Some(inner) = &self.inner {
            deliver(inner.as_ref());
        }
    }
}

impl ProgressObserver for TrackingBridge {
    fn started(&self, interval: &IntervalSpec) {
        if !self.session_active.swap(true, Ordering::SeqCst) {
            debug!("opening activity session");
            let tracker = Arc::clone(&self.tracker);
            tokio::spawn(async move {
                if let Err(error) = tracker.begin_session().await {
                    warn!(%error, "failed to begin activity session");
                }
            });
        }
        self.forward(|inner| inner.started(interval));
    }

    fn stopped(&self, interval: &IntervalSpec) {
        if self.session_active() {
            let tracker = Arc::clone(&self.tracker);
            tokio::spawn(async move {
                if let Err(error) = tracker.pause_session().await {
                    warn!(%error, "failed to pause activity session");
                }
            });
        }
        self.forward(|inner| inner.stopped(interval));
    }

    fn progressed(&self, elapsed_secs: u64, interval: &IntervalSpec) {
        self.forward(|inner| inner.progressed(elapsed_secs, interval));
    }

    fn finished(&self, interval: &IntervalSpec) {
        let is_final = self.final_interval == Some(interval.id());
        if is_final && self.session_active.swap(false, Ordering::SeqCst) {
            debug!("ending activity session");
            let tracker = Arc::clone(&self.tracker);
            tokio::spawn(async move {
                if let Err(error) = tracker.end_session().await {
                    warn!(%error, "failed to end activity session");
                }
            });
        }
        self.forward(|inner| inner.finished(interval));
    }

    fn moved_to(&self, interval: &IntervalSpec) {
        self.forward(|inner| inner.moved_to(interval));
    }
}
