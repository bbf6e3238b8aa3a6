//! Wait-time and passenger accounting.
use std::{fmt, time::Duration};

/// Running totals reported by planes.
///
/// Owned by the controller and mutated only under its state lock.
#[derive(Debug, Clone, Default)]
pub struct WaitTimeStats {
    total_wait: Duration,
    min_wait: Option<Duration>,
    max_wait: Option<Duration>,
    waits_recorded: u32,
    passengers_boarded: u64,
    planes_served: usize,
}

impl WaitTimeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one plane's combined landing + departure wait.
    pub fn record_wait(&mut self, wait: Duration) {
        self.total_wait += wait;
        self.min_wait = Some(self.min_wait.map_or(wait, |m| m.min(wait)));
        self.max_wait = Some(self.max_wait.map_or(wait, |m| m.max(wait)));
        self.waits_recorded += 1;
    }

    pub fn record_passengers(&mut self, count: u32) {
        self.passengers_boarded += u64::from(count);
    }

    pub fn record_served(&mut self) {
        self.planes_served += 1;
    }

    /// Point-in-time copy with derived averages.
    pub fn summary(&self) -> StatsSummary {
        let average_wait = match self.waits_recorded {
            0 => None,
            n => Some(self.total_wait / n),
        };
        StatsSummary {
            planes_served: self.planes_served,
            passengers_boarded: self.passengers_boarded,
            total_wait: self.total_wait,
            min_wait: self.min_wait,
            max_wait: self.max_wait,
            average_wait,
        }
    }
}

/// Snapshot of [`WaitTimeStats`] for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSummary {
    pub planes_served: usize,
    pub passengers_boarded: u64,
    pub total_wait: Duration,
    pub min_wait: Option<Duration>,
    pub max_wait: Option<Duration>,
    pub average_wait: Option<Duration>,
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = |d: Option<Duration>| d.map_or(0, |d| d.as_millis());
        write!(
            f,
            "planes served: {}, passengers boarded: {}, wait ms (min/avg/max): {}/{}/{}",
            self.planes_served,
            self.passengers_boarded,
            ms(self.min_wait),
            ms(self.average_wait),
            ms(self.max_wait),
        )
    }
}
