use std::{fs, path::Path};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use atc_model::AirportConfig;
use atc_observe::LoggerConfig;

/// Inclusive range of simulated service time, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min_ms: 50,
            max_ms: 300,
        }
    }
}

/// Launcher settings, read from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
    pub gates: usize,
    pub planes: u32,
    /// Ids of the planes that request an emergency landing.
    pub emergency: Vec<u32>,
    /// Upper bound of the random passenger count, both ways.
    pub max_passengers: u32,
    /// Upper bound of the random gap between two plane arrivals.
    pub arrival_spread_ms: u64,
    pub service_delay: DelayRange,
    pub logger: LoggerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gates: 3,
            planes: 6,
            emergency: vec![5],
            max_passengers: 50,
            arrival_spread_ms: 2_000,
            service_delay: DelayRange::default(),
            logger: LoggerConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.airport().validate()?;
        if self.service_delay.min_ms > self.service_delay.max_ms {
            bail!(
                "serviceDelay.minMs ({}) exceeds serviceDelay.maxMs ({})",
                self.service_delay.min_ms,
                self.service_delay.max_ms
            );
        }
        if let Some(id) = self.emergency.iter().find(|id| **id == 0 || **id > self.planes) {
            bail!("emergency plane {id} is not one of planes 1..={}", self.planes);
        }
        Ok(())
    }

    pub fn airport(&self) -> AirportConfig {
        AirportConfig::new(self.gates, self.planes as usize)
    }

    pub fn is_emergency(&self, id: u32) -> bool {
        self.emergency.contains(&id)
    }
}
