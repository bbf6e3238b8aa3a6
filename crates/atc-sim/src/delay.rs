use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::trace;

use atc_agent::{Delay, Service};
use atc_model::PlaneId;

use crate::config::DelayRange;

/// Uniformly random service time within a range.
#[derive(Debug, Clone, Copy)]
pub struct RandomDelay {
    range: DelayRange,
}

impl RandomDelay {
    pub fn new(range: DelayRange) -> Self {
        Self { range }
    }

    fn sample(&self) -> Duration {
        let (lo, hi) = (self.range.min_ms, self.range.max_ms.max(self.range.min_ms));
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }
}

#[async_trait]
impl Delay for RandomDelay {
    async fn pause(&self, plane: PlaneId, service: Service) {
        let wait = self.sample();
        trace!(plane = %plane, %service, wait_ms = wait.as_millis() as u64, "service");
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_in_range() {
        let delay = RandomDelay::new(DelayRange {
            min_ms: 5,
            max_ms: 9,
        });
        for _ in 0..200 {
            let d = delay.sample();
            assert!(d >= Duration::from_millis(5) && d <= Duration::from_millis(9));
        }
    }

    #[test]
    fn inverted_range_collapses_to_min() {
        let delay = RandomDelay::new(DelayRange {
            min_ms: 7,
            max_ms: 3,
        });
        assert_eq!(delay.sample(), Duration::from_millis(7));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_sleeps_for_the_sample() {
        let delay = RandomDelay::new(DelayRange {
            min_ms: 40,
            max_ms: 40,
        });
        let start = tokio::time::Instant::now();
        delay.pause(PlaneId(1), Service::Refuel).await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
