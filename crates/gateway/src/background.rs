//! Background processor for the periodic maintenance sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::gateway::Gateway;

/// Configuration for the sweep processor.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// How often to remove expired entries (default: 3600 seconds).
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
        }
    }
}

/// Runs [`Gateway::sweep`] on a fixed cadence until told to stop.
pub struct SweepProcessor {
    gateway: Arc<Gateway>,
    config: SweepConfig,
    shutdown_rx: mpsc::Receiver<()>,
}

impl SweepProcessor {
    /// Run the sweep loop.
    ///
    /// The first sweep happens one interval after start. Sweep errors are
    /// logged and retried on the next tick. Returns when a shutdown signal
    /// arrives or every sender has been dropped.
    pub async fn run(&mut self) {
        info!(interval = ?self.config.interval, "sweep processor starting");

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("sweep processor received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.gateway.sweep().await {
                        error!(error = %e, "error running sweep");
                    }
                }
            }
        }

        info!("sweep processor stopped");
    }
}

/// Builder for [`SweepProcessor`].
#[derive(Default)]
pub struct SweepProcessorBuilder {
    gateway: Option<Arc<Gateway>>,
    config: SweepConfig,
}

impl SweepProcessorBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gateway whose store is swept.
    #[must_use]
    pub fn gateway(mut self, gateway: Arc<Gateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set the processor configuration.
    #[must_use]
    pub fn config(mut self, config: SweepConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the processor and the sender that stops it.
    ///
    /// # Errors
    ///
    /// Returns an error if no gateway was provided.
    pub fn build(self) -> Result<(SweepProcessor, mpsc::Sender<()>), &'static str> {
        let gateway = self.gateway.ok_or("gateway is required")?;
        if self.config.interval.is_zero() {
            return Err("sweep interval must be greater than zero");
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        Ok((
            SweepProcessor {
                gateway,
                config: self.config,
                shutdown_rx,
            },
            shutdown_tx,
        ))
    }
}
