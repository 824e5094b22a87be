use std::time::Duration;

use dropgate_gateway::SweepConfig;
use serde::Deserialize;

/// Periodic sweep configuration.
#[derive(Debug, Deserialize)]
pub struct SweepSettings {
    /// Whether the sweep processor runs at all (default: true).
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Seconds between sweeps (default: 3600).
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_seconds: default_interval(),
        }
    }
}

impl SweepSettings {
    /// Processor configuration for these settings.
    pub fn processor_config(&self) -> SweepConfig {
        SweepConfig {
            interval: Duration::from_secs(self.interval_seconds.max(1)),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u64 {
    3600
}
