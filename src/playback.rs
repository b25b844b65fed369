use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::timer::Timer;
use crate::typewriter::Typewriter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveStats {
    pub wakes: usize,
    pub elapsed_ms: u64,
}

/// Deliver every wake-up `tw` asks for until it goes idle.
///
/// A looping typewriter never goes idle; it runs until `stop` is set. On stop
/// the active job is killed and `aborted` is returned.
pub fn drive(tw: &mut Typewriter, timer: &mut impl Timer, stop: &AtomicBool) -> Result<DriveStats> {
    drive_with(tw, timer, stop, None, |_, _| {})
}

/// Like [`drive`], but stops without error once the next wake-up would land
/// after `until_ms`, and calls `on_wake` after every delivered wake-up.
pub fn drive_with(
    tw: &mut Typewriter,
    timer: &mut impl Timer,
    stop: &AtomicBool,
    until_ms: Option<u64>,
    mut on_wake: impl FnMut(&Typewriter, u64),
) -> Result<DriveStats> {
    let mut stats = DriveStats::default();

    loop {
        if stop.load(Ordering::SeqCst) {
            tw.kill_activity();
            debug!(wakes = stats.wakes, "playback aborted");
            return Err(anyhow!("aborted"));
        }

        let Some(deadline) = tw.next_wake() else {
            break;
        };
        if until_ms.is_some_and(|until| deadline > until) {
            break;
        }

        timer.sleep_until(deadline, stop);
        if stop.load(Ordering::SeqCst) {
            continue;
        }

        let now = timer.now_ms();
        tw.wake(now);
        stats.wakes += 1;
        stats.elapsed_ms = now;
        on_wake(tw, now);
    }

    Ok(stats)
}
