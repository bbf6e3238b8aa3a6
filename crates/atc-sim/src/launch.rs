use std::{sync::Arc, time::Duration};

use anyhow::{Context, anyhow};
use rand::Rng;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use atc_agent::{DelayHandle, Plane, PlaneReport, PlaneSpec};
use atc_core::{AtcError, Controller, DispatchOutcome, EventHandle, StatsSummary};

use crate::config::SimConfig;

/// How a simulation run ended.
#[derive(Debug)]
pub enum SimOutcome {
    /// Every plane completed and the airport passed its final check.
    Completed {
        summary: StatsSummary,
        reports: Vec<PlaneReport>,
    },
    /// Stopped by the token before every plane was served.
    Cancelled { served: usize },
}

/// Run one airport until it drains or `token` fires.
///
/// Planes arrive one by one with a random gap of up to `arrival_spread_ms`.
/// Fatal protocol errors and a failed final check are returned as errors.
pub async fn simulate(
    cfg: &SimConfig,
    sink: EventHandle,
    delay: DelayHandle,
    token: &CancellationToken,
) -> anyhow::Result<SimOutcome> {
    let controller = Controller::new(cfg.airport(), sink, token)?;
    let dispatch = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.run().await }
    });

    let mut planes = JoinSet::new();
    for id in 1..=cfg.planes {
        let spec = random_spec(cfg, id);
        info!(plane = %spec.id, passengers = spec.arriving_passengers, "plane inbound");
        planes.spawn(Plane::new(spec, Arc::clone(&controller), Arc::clone(&delay)).run());

        if id == cfg.planes {
            break;
        }
        let gap = arrival_gap(cfg.arrival_spread_ms);
        tokio::select! {
            _ = tokio::time::sleep(gap) => {}
            _ = token.cancelled() => {
                warn!(launched = id, "stopped launching planes");
                break;
            }
        }
    }

    let mut reports = Vec::with_capacity(cfg.planes as usize);
    let mut fatal: Option<AtcError> = None;
    while let Some(joined) = planes.join_next().await {
        match joined.context("plane task panicked")? {
            Ok(report) => reports.push(report),
            Err(e) if e.is_fatal() => {
                fatal.get_or_insert(e);
            }
            Err(_) => {}
        }
    }

    let outcome = dispatch.await.context("dispatch task panicked")??;
    if let Some(e) = fatal {
        return Err(anyhow!(e).context("a plane broke the airport protocol"));
    }

    match outcome {
        DispatchOutcome::Cancelled { served } => Ok(SimOutcome::Cancelled { served }),
        DispatchOutcome::Drained { served } => {
            if let Err(e) = controller.sanity_check() {
                error!(served, error = %e, "airport left in an inconsistent state");
                return Err(anyhow!(e).context("inconsistent state after drain"));
            }
            reports.sort_by_key(|r| r.id);
            Ok(SimOutcome::Completed {
                summary: controller.stats(),
                reports,
            })
        }
    }
}

fn random_spec(cfg: &SimConfig, id: u32) -> PlaneSpec {
    let mut rng = rand::thread_rng();
    PlaneSpec::new(
        id,
        rng.gen_range(0..=cfg.max_passengers),
        rng.gen_range(0..=cfg.max_passengers),
    )
    .with_emergency(cfg.is_emergency(id))
}

fn arrival_gap(spread_ms: u64) -> Duration {
    if spread_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=spread_ms))
}
