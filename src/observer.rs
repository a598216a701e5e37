//! Progress notification protocol.
//!
//! The timer reports its lifecycle through a fixed five-event vocabulary,
//! delivered synchronously to a single registered observer. The observer is
//! held as a weak reference: the state machine never keeps its listener
//! alive, and events addressed to a dropped observer are silently discarded.

use serde::Serialize;
use std::sync::{Mutex, Weak};

use crate::types::IntervalSpec;

/// Observer of timer lifecycle and progress.
///
/// Exactly one observer is supported per [`crate::SequenceTimer`];
/// registering a new one silently replaces the previous registration.
/// Callbacks are invoked synchronously from whichever control call or tick
/// produced the event, after the timer's internal state is settled, so an
/// observer may call back into the control or query surface.
pub trait ProgressObserver: Send + Sync {
    /// The current interval began (or resumed) counting down.
    fn started(&self, interval: &IntervalSpec);

    /// The running countdown was paused; its remainder is saved.
    fn stopped(&self, interval: &IntervalSpec);

    /// One whole-second tick of the running countdown.
    ///
    /// `elapsed_secs` counts up from 0 on a fresh start; the remaining time
    /// implied by it is monotonically non-increasing within one run.
    fn progressed(&self, elapsed_secs: u64, interval: &IntervalSpec);

    /// The countdown reached zero naturally.
    fn finished(&self, interval: &IntervalSpec);

    /// The selection changed (or was re-announced by a reset).
    fn moved_to(&self, interval: &IntervalSpec);
}

/// Tagged form of the five observer callbacks.
///
/// The timer collects events in this form while its state lock is held and
/// dispatches them afterwards; tests and display bridges can also record the
/// protocol as plain values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TimerEvent {
    Started { interval: IntervalSpec },
    Stopped { interval: IntervalSpec },
    Progressed { elapsed_secs: u64, interval: IntervalSpec },
    Finished { interval: IntervalSpec },
    MovedTo { interval: IntervalSpec },
}

impl TimerEvent {
    /// The interval this event refers to.
    pub fn interval(&self) -> &IntervalSpec {
        match self {
            TimerEvent::Started { interval }
            | TimerEvent::Stopped { interval }
            | TimerEvent::Progressed { interval, .. }
            | TimerEvent::Finished { interval }
            | TimerEvent::MovedTo { interval } => interval,
        }
    }

    fn dispatch(&self, observer: &dyn ProgressObserver) {
        match self {
            TimerEvent::Started { interval } => observer.started(interval),
            TimerEvent::Stopped { interval } => observer.stopped(interval),
            TimerEvent::Progressed { elapsed_secs, interval } => {
                observer.progressed(*elapsed_secs, interval)
            }
            TimerEvent::Finished { interval } => observer.finished(interval),
            TimerEvent::MovedTo { interval } => observer.moved_to(interval),
        }
    }
}

/// Single-observer registration slot.
///
/// Holds at most one weak observer reference. Replacement is silent; a dead
/// weak makes every emit a no-op rather than an error.
#[derive(Default)]
pub(crate) struct ObserverSlot {
    slot: Mutex<Option<Weak<dyn ProgressObserver>>>,
}

impl ObserverSlot {
    /// Register `observer`, replacing any previous registration.
    pub(crate) fn set(&self, observer: Weak<dyn ProgressObserver>) {
        *self.slot.lock().expect("observer slot poisoned") = Some(observer);
    }

    /// Deliver `events` in order to the registered observer, if it is still
    /// alive. The slot lock is not held across callbacks, so an observer may
    /// re-register from within one.
    pub(crate) fn emit_all(&self, events: &[TimerEvent]) {
        if events.is_empty() {
            return;
        }
        let observer = {
            let slot = self.slot.lock().expect("observer slot poisoned");
            slot.as_ref().and_then(Weak::upgrade)
        };
        let Some(observer) = observer else {
            tracing::trace!("no live observer, dropping {} event(s)", events.len());
            return;
        };
        for event in events {
            event.dispatch(observer.as_ref());
        }
    }
}
