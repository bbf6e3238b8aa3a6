use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;

use atc_model::PlaneId;

/// Simulated ground or runway activity that takes time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Service {
    RunwayRoll,
    Taxi,
    Disembark,
    Refuel,
    Board,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::RunwayRoll => "runway-roll",
            Service::Taxi => "taxi",
            Service::Disembark => "disembark",
            Service::Refuel => "refuel",
            Service::Board => "board",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of simulated service time.
///
/// Not part of the arbitration contract: planes call it between protocol steps,
/// never while waiting on the controller.
#[async_trait]
pub trait Delay: Send + Sync + 'static {
    /// Suspend the calling plane for the duration of `service`.
    async fn pause(&self, plane: PlaneId, service: Service);
}

/// Shared handle to a delay source.
pub type DelayHandle = Arc<dyn Delay>;

/// Returns immediately; useful for tests that only care about ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn pause(&self, _: PlaneId, _: Service) {
        tokio::task::yield_now().await;
    }
}

/// Same sleep for every service.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl Delay for FixedDelay {
    async fn pause(&self, _: PlaneId, _: Service) {
        tokio::time::sleep(self.0).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn fixed_delay_sleeps_at_least_its_duration() {
        let d = FixedDelay(Duration::from_millis(15));
        let started = Instant::now();
        d.pause(PlaneId(1), Service::Taxi).await;
        assert!(started.elapsed() >= Duration::from_millis(15));
    }

    #[tokio::test]
    async fn delays_work_behind_a_handle() {
        let handle: DelayHandle = Arc::new(NoDelay);
        handle.pause(PlaneId(1), Service::Refuel).await;
    }

    #[test]
    fn service_names() {
        assert_eq!(Service::RunwayRoll.to_string(), "runway-roll");
        assert_eq!(Service::Board.as_str(), "board");
    }
}
