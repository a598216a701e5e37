//! The countdown-sequence state machine.
//!
//! [`SequenceTimer`] advances a single active countdown through a fixed
//! ordered catalog of intervals. It owns all timing state, exposes the
//! transport controls (start/stop/toggle/reset/next/previous), and reports
//! progress through the [`ProgressObserver`](crate::ProgressObserver)
//! protocol.
//!
//! # Time handling
//!
//! While running, the remaining time is always derived from an absolute
//! deadline, never accumulated by counting tick invocations. A late or missed
//! tick therefore self-corrects: the next tick recomputes from the deadline.
//! Deadlines use [`tokio::time::Instant`], so tests drive the whole machine
//! on tokio's paused virtual clock.
//!
//! # Locking
//!
//! A single mutex guards the mutable state. Observer callbacks never run
//! under it: each control call and each tick collects its events while
//! holding the lock and dispatches them after releasing it, so observers may
//! re-enter the control or query surface.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::driver;
use crate::observer::{ObserverSlot, ProgressObserver, TimerEvent};
use crate::types::{Catalog, IntervalSpec};

/// Countdown state of the selected interval.
enum RunState {
    /// Never started, or fully reset.
    Idle,
    /// Counting down toward `deadline`; `cancel` stops the tick driver.
    Running { deadline: Instant, cancel: CancellationToken },
    /// Paused with a saved remainder, resumed by the next `start()`.
    Paused { remaining: Duration },
}

struct TimerState {
    /// Selected catalog index. Always in range unless the catalog is empty.
    current: usize,
    run: RunState,
    /// Bumped on every `start()`; ticks carrying a stale generation are
    /// ignored, so at most one driver is ever effective.
    generation: u64,
}

/// State shared between the public handle and the tick driver task.
pub(crate) struct TimerShared {
    catalog: Catalog,
    state: Mutex<TimerState>,
    observer: ObserverSlot,
}

impl TimerShared {
    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().expect("timer state poisoned")
    }

    fn spec_at(&self, index: usize) -> Option<&IntervalSpec> {
        self.catalog.get(index)
    }

    /// One whole-second evaluation of the running countdown.
    ///
    /// Returns `false` when the driver that delivered the tick should end:
    /// the generation is stale, the run was stopped meanwhile, or the
    /// countdown finished on this tick.
    pub(crate) fn on_tick(&self, generation: u64) -> bool {
        let (events, keep_ticking) = {
            let mut state = self.lock();
            if state.generation != generation {
                trace!(generation, "stale tick ignored");
                return false;
            }
            let RunState::Running { deadline, cancel } = &state.run else {
                trace!(generation, "tick against non-running state ignored");
                return false;
            };

            let Some(spec) = self.spec_at(state.current) else {
                // Unreachable by construction: start() refuses an empty
                // catalog and the selection is otherwise always in range.
                debug_assert!(false, "tick with no interval selected");
                return false;
            };
            let spec = spec.clone();

            let remaining = deadline.saturating_duration_since(Instant::now());
            // Round to the nearest whole second so scheduling jitter on a
            // real clock cannot shift the countdown by a full tick.
            let remaining_whole = ((remaining.as_millis() + 500) / 1000) as u64;

            if remaining_whole == 0 {
                cancel.cancel();
                state.run = RunState::Idle;
                info!(interval = %spec, "countdown finished");

                let mut events = vec![TimerEvent::Finished { interval: spec }];
                // Natural completion advances exactly like switch_to_next,
                // wrapping past the last entry.
                state.current = self.catalog.next_index(state.current);
                if let Some(next) = self.spec_at(state.current) {
                    events.push(TimerEvent::MovedTo { interval: next.clone() });
                }
                (events, false)
            } else {
                let elapsed = spec.duration_secs().saturating_sub(remaining_whole);
                trace!(interval = %spec, elapsed, "tick");
                (
                    vec![TimerEvent::Progressed { elapsed_secs: elapsed, interval: spec }],
                    true,
                )
            }
        };

        self.observer.emit_all(&events);
        keep_ticking
    }
}

/// Countdown sequencer over a fixed interval catalog.
///
/// Exactly one interval is selected at any time (unless the catalog is
/// empty), and at most one countdown runs at any time. Every control is safe
/// to call in any state; inapplicable calls are no-ops.
///
/// Controls must be called from within a tokio runtime: starting a countdown
/// spawns the one-second tick driver task.
pub struct SequenceTimer {
    shared: Arc<TimerShared>,
}

impl SequenceTimer {
    /// Create a timer over `catalog`, initially idle with the first interval
    /// selected.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            shared: Arc::new(TimerShared {
                catalog,
                state: Mutex::new(TimerState {
                    current: 0,
                    run: RunState::Idle,
                    generation: 0,
                }),
                observer: ObserverSlot::default(),
            }),
        }
    }

    /// Create a timer over the fixed reference plank workout.
    pub fn plank_workout() -> Self {
        Self::new(Catalog::plank_workout())
    }

    /// Register the single observer, replacing any previous registration.
    ///
    /// Only a weak reference is kept: the timer never keeps its observer
    /// alive, and events addressed to a dropped observer are silently
    /// discarded.
    pub fn set_observer(&self, observer: Arc<dyn ProgressObserver>) {
        self.shared.observer.set(Arc::downgrade(&observer));
    }

    /// Begin (or resume) the countdown of the selected interval.
    ///
    /// No-op if the catalog is empty or a countdown is already running. A
    /// remainder saved by a prior [`stop`](Self::stop) resumes where it left
    /// off; otherwise the countdown starts fresh at the interval's full
    /// duration. Emits `started`, then ticks once immediately.
    pub fn start(&self) {
        let (events, generation, cancel) = {
            let mut state = self.shared.lock();
            let Some(spec) = self.shared.spec_at(state.current) else {
                return;
            };
            if matches!(state.run, RunState::Running { .. }) {
                return;
            }

            let remaining = match &state.run {
                RunState::Paused { remaining } => *remaining,
                _ => spec.duration(),
            };
            let cancel = CancellationToken::new();
            state.generation += 1;
            state.run = RunState::Running {
                deadline: Instant::now() + remaining,
                cancel: cancel.clone(),
            };
            info!(interval = %spec, remaining_secs = remaining.as_secs(), "countdown started");

            (
                vec![TimerEvent::Started { interval: spec.clone() }],
                state.generation,
                cancel,
            )
        };

        self.shared.observer.emit_all(&events);
        // Spawned after `started` is delivered so the immediate first tick
        // can never be observed ahead of it.
        driver::spawn(Arc::clone(&self.shared), generation, cancel);
    }

    /// Pause the running countdown, saving its exact remainder.
    ///
    /// No-op unless running. The remainder is `deadline - now` clamped at
    /// zero, so a later [`start`](Self::start) resumes precisely. Emits
    /// `stopped`.
    pub fn stop(&self) {
        let events = {
            let mut state = self.shared.lock();
            let Some(spec) = self.shared.spec_at(state.current) else {
                return;
            };
            let RunState::Running { deadline, cancel } = &state.run else {
                return;
            };

            cancel.cancel();
            let remaining = deadline.saturating_duration_since(Instant::now());
            state.run = RunState::Paused { remaining };
            info!(interval = %spec, remaining_secs = remaining.as_secs(), "countdown stopped");

            vec![TimerEvent::Stopped { interval: spec.clone() }]
        };

        self.shared.observer.emit_all(&events);
    }

    /// Dispatch to [`start`](Self::start) or [`stop`](Self::stop) based on
    /// the current run state.
    pub fn toggle(&self) {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Return the selected interval to a fresh idle state.
    ///
    /// Stops the countdown if running (emitting `stopped`), discards any
    /// saved remainder so the next start begins at full duration, and
    /// re-announces the selection via `movedTo` without changing it.
    pub fn reset(&self) {
        let events = {
            let mut state = self.shared.lock();
            let mut events = Vec::new();

            if let RunState::Running { cancel, .. } = &state.run {
                cancel.cancel();
                if let Some(spec) = self.shared.spec_at(state.current) {
                    events.push(TimerEvent::Stopped { interval: spec.clone() });
                }
            }
            state.run = RunState::Idle;

            if let Some(spec) = self.shared.spec_at(state.current) {
                debug!(interval = %spec, "reset");
                events.push(TimerEvent::MovedTo { interval: spec.clone() });
            }
            events
        };

        self.shared.observer.emit_all(&events);
    }

    /// Select the next interval, wrapping past the last entry back to the
    /// first. Stops any running countdown and discards any saved remainder.
    /// No-op if the catalog is empty.
    pub fn switch_to_next(&self) {
        let events = {
            let mut state = self.shared.lock();
            if self.shared.catalog.is_empty() {
                return;
            }
            let next = self.shared.catalog.next_index(state.current);
            self.change_index(&mut state, next)
        };

        self.shared.observer.emit_all(&events);
    }

    /// Select the previous interval, clamped at the first entry.
    ///
    /// Backward navigation deliberately does not wrap, unlike
    /// [`switch_to_next`](Self::switch_to_next) and natural completion. The
    /// selection is re-announced via `movedTo` even when already at the
    /// first entry.
    pub fn switch_to_previous(&self) {
        let events = {
            let mut state = self.shared.lock();
            if self.shared.catalog.is_empty() {
                return;
            }
            let previous = self.shared.catalog.previous_index(state.current);
            self.change_index(&mut state, previous)
        };

        self.shared.observer.emit_all(&events);
    }

    /// True iff a countdown is currently running.
    pub fn is_running(&self) -> bool {
        matches!(self.shared.lock().run, RunState::Running { .. })
    }

    /// The selected interval, absent only when the catalog is empty.
    pub fn current_interval(&self) -> Option<&IntervalSpec> {
        let index = self.shared.lock().current;
        self.shared.catalog.get(index)
    }

    /// One-based position of the selection for display: `(index + 1, total)`,
    /// or `(0, 0)` when the catalog is empty.
    pub fn sequence_position(&self) -> (usize, usize) {
        if self.shared.catalog.is_empty() {
            return (0, 0);
        }
        let index = self.shared.lock().current;
        (index + 1, self.shared.catalog.len())
    }

    /// The catalog this timer sequences.
    pub fn catalog(&self) -> &Catalog {
        &self.shared.catalog
    }

    /// Move the selection to `new_index`, stopping any running countdown and
    /// clearing any remainder first. Always emits `movedTo`, even when the
    /// index is unchanged, so display surfaces re-announce their labels.
    fn change_index(&self, state: &mut TimerState, new_index: usize) -> Vec<TimerEvent> {
        let mut events = Vec::new();

        if let RunState::Running { cancel, .. } = &state.run {
            cancel.cancel();
            if let Some(spec) = self.shared.spec_at(state.current) {
                events.push(TimerEvent::Stopped { interval: spec.clone() });
            }
        }
        state.run = RunState::Idle;
        state.current = new_index;

        if let Some(spec) = self.shared.spec_at(new_index) {
            debug!(interval = %spec, position = new_index + 1, "selection moved");
            events.push(TimerEvent::MovedTo { interval: spec.clone() });
        }
        events
    }
}

impl Drop for SequenceTimer {
    fn drop(&mut self) {
        let state = self.shared.lock();
        if let RunState::Running { cancel, .. } = &state.run {
            debug!("dropping sequence timer with an active countdown");
            cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Recorder;

    fn two_interval_timer() -> SequenceTimer {
        SequenceTimer::new(Catalog::new([("A", 5), ("B", 3)]).unwrap())
    }

    /// Let the freshly spawned driver deliver its immediate first tick
    /// without advancing the paused clock.
    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    /// Advance the paused clock across `n` one-second tick boundaries.
    async fn advance_ticks(n: u64) {
        for _ in 0..n {
            tokio::time::sleep(Duration::from_millis(1010)).await;
        }
    }

    fn saved_remainder(timer: &SequenceTimer) -> Option<Duration> {
        match timer.shared.lock().run {
            RunState::Paused { remaining } => Some(remaining),
            _ => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_emits_started_and_immediate_tick() {
        let timer = two_interval_timer();
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.start();
        settle().await;

        let events = recorder.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], TimerEvent::Started { interval } if interval.name() == "A"));
        assert!(matches!(events[1], TimerEvent::Progressed { elapsed_secs: 0, .. }));
        assert!(timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_noop_while_running() {
        let timer = two_interval_timer();
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.start();
        settle().await;
        timer.start();
        settle().await;
        recorder.take();

        // A second driver would double the tick rate
        advance_ticks(2).await;
        let progressed = recorder
            .events()
            .iter()
            .filter(|event| matches!(event, TimerEvent::Progressed { .. }))
            .count();
        assert_eq!(progressed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_noop_on_empty_catalog() {
        let timer = SequenceTimer::new(Catalog::new(Vec::<(String, u64)>::new()).unwrap());
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.start();
        timer.toggle();
        timer.switch_to_next();
        timer.switch_to_previous();
        settle().await;

        assert!(recorder.events().is_empty());
        assert!(!timer.is_running());
        assert_eq!(timer.sequence_position(), (0, 0));
        assert!(timer.current_interval().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_noop_when_idle() {
        let timer = two_interval_timer();
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.stop();
        assert!(recorder.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_saves_exact_remainder() {
        let timer = two_interval_timer();

        timer.start();
        settle().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        timer.stop();

        assert_eq!(saved_remainder(&timer), Some(Duration::from_secs(3)));
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn resume_continues_from_remainder() {
        let timer = two_interval_timer();
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.start();
        settle().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        timer.stop();
        recorder.take();

        timer.start();
        settle().await;

        let events = recorder.events();
        assert!(matches!(events[0], TimerEvent::Started { .. }));
        // Immediate tick reports progress carried over from before the pause
        assert!(matches!(events[1], TimerEvent::Progressed { elapsed_secs: 2, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn fractional_remainder_finishes_on_the_next_tick() {
        let timer = two_interval_timer();
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.start();
        settle().await;
        tokio::time::sleep(Duration::from_millis(4400)).await;
        timer.stop();
        recorder.take();

        assert_eq!(saved_remainder(&timer), Some(Duration::from_millis(600)));

        // 600ms rounds to one whole second left, so the resumed run gets
        // one progress report before completing.
        timer.start();
        settle().await;
        advance_ticks(1).await;
        settle().await;

        let events = recorder.take();
        assert!(matches!(&events[0], TimerEvent::Started { interval } if interval.name() == "A"));
        assert!(matches!(events[1], TimerEvent::Progressed { elapsed_secs: 4, .. }));
        assert!(matches!(&events[2], TimerEvent::Finished { interval } if interval.name() == "A"));
        assert!(matches!(&events[3], TimerEvent::MovedTo { interval } if interval.name() == "B"));
        assert_eq!(events.len(), 4);
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_after_stop() {
        let timer = two_interval_timer();
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.start();
        settle().await;
        timer.stop();
        recorder.take();

        advance_ticks(4).await;
        assert!(recorder.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_discards_remainder() {
        let timer = two_interval_timer();
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.start();
        settle().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        timer.stop();
        timer.reset();

        assert_eq!(saved_remainder(&timer), None);
        recorder.take();

        // A fresh start counts down from the full duration again
        timer.start();
        settle().await;
        let events = recorder.events();
        assert!(matches!(events[1], TimerEvent::Progressed { elapsed_secs: 0, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_while_running_stops_then_reannounces() {
        let timer = two_interval_timer();
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.start();
        settle().await;
        recorder.take();
        timer.reset();

        let events = recorder.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], TimerEvent::Stopped { .. }));
        assert!(matches!(&events[1], TimerEvent::MovedTo { interval } if interval.name() == "A"));
        // Selection did not change
        assert_eq!(timer.sequence_position(), (1, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_while_idle_only_reannounces() {
        let timer = two_interval_timer();
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.reset();

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], TimerEvent::MovedTo { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn switch_to_next_wraps_past_the_end() {
        let timer = two_interval_timer();
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.switch_to_next();
        assert_eq!(timer.sequence_position(), (2, 2));
        timer.switch_to_next();
        assert_eq!(timer.sequence_position(), (1, 2));

        let events = recorder.events();
        assert!(matches!(&events[0], TimerEvent::MovedTo { interval } if interval.name() == "B"));
        assert!(matches!(&events[1], TimerEvent::MovedTo { interval } if interval.name() == "A"));
    }

    #[tokio::test(start_paused = true)]
    async fn switch_to_previous_clamps_at_zero() {
        let timer = two_interval_timer();
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.switch_to_previous();
        assert_eq!(timer.sequence_position(), (1, 2));

        // The clamped no-move still re-announces the selection
        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], TimerEvent::MovedTo { interval } if interval.name() == "A"));
    }

    #[tokio::test(start_paused = true)]
    async fn switching_while_running_stops_and_discards() {
        let timer = two_interval_timer();
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.start();
        settle().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        recorder.take();

        timer.switch_to_next();
        assert!(!timer.is_running());
        assert_eq!(saved_remainder(&timer), None);

        let events = recorder.events();
        assert!(matches!(&events[0], TimerEvent::Stopped { interval } if interval.name() == "A"));
        assert!(matches!(&events[1], TimerEvent::MovedTo { interval } if interval.name() == "B"));

        // No stray ticks from the cancelled run
        recorder.take();
        advance_ticks(3).await;
        assert!(recorder.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_dispatches_by_run_state() {
        let timer = two_interval_timer();
        let recorder = Recorder::new();
        timer.set_observer(recorder.clone());

        timer.toggle();
        settle().await;
        assert!(timer.is_running());
        assert!(matches!(recorder.events()[0], TimerEvent::Started { .. }));

        recorder.take();
        timer.toggle();
        assert!(!timer.is_running());
        assert!(matches!(recorder.events()[0], TimerEvent::Stopped { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_advances_without_observer() {
        let timer = two_interval_timer();
        {
            let recorder = Recorder::new();
            timer.set_observer(recorder.clone());
            timer.start();
            settle().await;
            // recorder dropped here
        }

        advance_ticks(6).await;

        // The run finished and the selection advanced with nobody listening
        assert!(!timer.is_running());
        assert_eq!(timer.sequence_position(), (2, 2));
        assert_eq!(timer.current_interval().unwrap().name(), "B");
    }
}
