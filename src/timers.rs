//! Wall-clock timing of pipeline stages.

use std::time::{Duration, Instant};

/// Adds the time between its creation and its drop to a `Duration` slot.
///
/// Dropping happens on every exit path, so a stage that fails with `?` is
/// still accounted for.
///
/// ```rust,ignore
/// let mut spent = Duration::ZERO;
/// {
///     let _timer = PhaseTimer::new(&mut spent);
///     tuples = stage.filter(tuples, ctx)?;
/// }
/// ```
pub struct PhaseTimer<'a> {
    start: Instant,
    slot: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub fn new(slot: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            slot,
        }
    }
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        *self.slot += self.start.elapsed();
    }
}
