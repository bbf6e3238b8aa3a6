mod config;
mod delay;
mod launch;

use std::{path::PathBuf, sync::Arc};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use atc_observe::{LoggerTimeZone, TracingSink, init_local_offset, init_logger};

use crate::{
    config::SimConfig,
    delay::RandomDelay,
    launch::{SimOutcome, simulate},
};

fn main() -> anyhow::Result<()> {
    // 1) config: first argument is an optional JSON file
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let cfg = SimConfig::load(path.as_deref())?;

    // 2) logger; the local offset must be read before any worker thread exists
    if cfg.logger.tz == LoggerTimeZone::Local {
        init_local_offset();
    }
    init_logger(&cfg.logger)?;
    info!(gates = cfg.gates, planes = cfg.planes, "airport simulation starting");

    // 3) runtime
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cfg))
}

async fn run(cfg: SimConfig) -> anyhow::Result<()> {
    let token = CancellationToken::new();
    tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, grounding the airport");
                token.cancel();
            }
        }
    });

    let delay = Arc::new(RandomDelay::new(cfg.service_delay));
    let outcome = simulate(&cfg, Arc::new(TracingSink::new()), delay, &token).await?;

    match outcome {
        SimOutcome::Completed { summary, reports } => {
            for r in &reports {
                info!(
                    plane = %r.id,
                    gate = %r.gate,
                    emergency = r.emergency,
                    wait_ms = r.wait().as_millis() as u64,
                    boarded = r.passengers_boarded,
                    "turnaround"
                );
            }
            println!("--- airport statistics ---");
            println!("{summary}");
        }
        SimOutcome::Cancelled { served } => {
            println!("simulation interrupted after {served} of {} planes", cfg.planes);
        }
    }
    Ok(())
}
