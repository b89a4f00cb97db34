//! Throughput sampling for long-running programs.

use std::fmt;
use std::num::NonZeroU64;
use std::time::{Duration, Instant};

/// One periodic report, emitted every `interval` executed steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsReport {
    /// 1 for the first report, 2 for the second, ...
    pub index: u64,
    /// Total steps executed so far.
    pub steps: u64,
    /// Time since the previous report (or the start of the run).
    pub elapsed: Duration,
    /// Mean of all `elapsed` values reported so far.
    pub average: Duration,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stats: interval {}; elapsed {} ms; average {} ms",
            self.index,
            self.elapsed.as_millis(),
            self.average.as_millis()
        )
    }
}

/// Counts steps and produces a [`StatsReport`] at each interval boundary.
#[derive(Debug)]
pub(crate) struct StatsTracker {
    interval: NonZeroU64,
    since: Instant,
    total: Duration,
}

impl StatsTracker {
    pub(crate) fn new(interval: NonZeroU64) -> Self {
        Self { interval, since: Instant::now(), total: Duration::ZERO }
    }

    /// Call after each executed step with the running step count.
    pub(crate) fn tick(&mut self, steps: u64) -> Option<StatsReport> {
        if steps == 0 || steps % self.interval.get() != 0 {
            return None;
        }
        let now = Instant::now();
        Some(self.report_at(steps, now.duration_since(self.since), now))
    }

    fn report_at(&mut self, steps: u64, elapsed: Duration, now: Instant) -> StatsReport {
        let index = steps / self.interval.get();
        self.total += elapsed;
        self.since = now;
        let average = self.total / u32::try_from(index).unwrap_or(u32::MAX);
        StatsReport { index, steps, elapsed, average }
    }
}
