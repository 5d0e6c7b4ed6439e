use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::pipeline::scheduler::{RenderScheduler, TickOutcome};

/// Period between display refresh callbacks for `refresh_hz`.
pub fn refresh_period(refresh_hz: u32) -> Duration {
    Duration::from_secs_f64(1.0 / refresh_hz.max(1) as f64)
}

/// Drive `scheduler` like a display refresh callback until it stops.
///
/// Ticks that arrive while an iteration is still running are skipped, not
/// queued, so iterations never overlap or reorder. A stop request through a
/// [`PipelineHandle`](crate::pipeline::PipelineHandle) wakes the loop
/// immediately. Returns once the scheduler is `Stopped`, or straight away
/// if it was never started.
pub async fn run_display_loop(scheduler: &mut RenderScheduler, refresh_hz: u32) {
    let handle = scheduler.handle();
    let mut ticker = tokio::time::interval(refresh_period(refresh_hz));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut iterations: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = handle.stop_requested() => {}
        }
        match scheduler.tick() {
            TickOutcome::Stopped | TickOutcome::NotStreaming => break,
            _ => iterations += 1,
        }
    }
    tracing::debug!("display loop exited after {iterations} callbacks");
}
