//! Shared helpers for unit tests.

use std::sync::{Arc, Mutex};

use crate::observer::{ProgressObserver, TimerEvent};
use crate::types::IntervalSpec;

/// Observer that records the notification protocol as plain values.
#[derive(Default)]
pub(crate) struct Recorder {
    events: Mutex<Vec<TimerEvent>>,
}

impl Recorder {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything recorded so far.
    pub(crate) fn events(&self) -> Vec<TimerEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Drain recorded events, leaving the recorder empty.
    pub(crate) fn take(&self) -> Vec<TimerEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn push(&self, event: TimerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressObserver for Recorder {
    fn started(&self, interval: &IntervalSpec) {
        self.push(TimerEvent::Started { interval: interval.clone() });
    }

    fn stopped(&self, interval: &IntervalSpec) {
        self.push(TimerEvent::Stopped { interval: interval.clone() });
    }

    fn progressed(&self, elapsed_secs: u64, interval: &IntervalSpec) {
        self.push(TimerEvent::Progressed { elapsed_secs, interval: interval.clone() });
    }

    fn finished(&self, interval: &IntervalSpec) {
        self.push(TimerEvent::Finished { interval: interval.clone() });
    }

    fn moved_to(&self, interval: &IntervalSpec) {
        self.push(TimerEvent::MovedTo { interval: interval.clone() });
    }
}
