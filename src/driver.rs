//! Tick driver task for the running countdown.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::timer::TimerShared;

/// One tick per second, whole-second granularity.
pub(crate) const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Spawn the periodic driver for one run of the selected interval.
///
/// The first tick fires immediately (tokio `interval` semantics) so the
/// display gets instant feedback, then once per second. The task holds no
/// timing state of its own: every tick is recomputed from the absolute
/// deadline inside the state machine, which makes a missed or late tick
/// self-correcting.
///
/// The task ends when its token is cancelled (any transition away from
/// Running), when the countdown finishes naturally, or when the state
/// machine reports the generation stale. At most one driver is ever
/// effective per timer.
pub(crate) fn spawn(shared: Arc<TimerShared>, generation: u64, cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut ticker = interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(generation, "tick driver started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(generation, "tick driver cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    if !shared.on_tick(generation) {
                        debug!(generation, "tick driver ended");
                        break;
                    }
                }
            }
        }
    });
}
