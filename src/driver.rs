//! Scheduling driver for the RCE sensor
//!
//! Plays the host-platform role: owns the update cadence, invokes the sensor
//! entity serially on a timer, and publishes an immutable state snapshot
//! after every tick for the web layer to serve.

use crate::config::Config;
use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};
use crate::pse::{PriceSource, PseClient};
use crate::sensor::RceSensor;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, interval};

/// Immutable view of the published entity state after one tick
#[derive(Debug, Clone, Serialize)]
pub struct SensorSnapshot {
    /// RFC 3339 timestamp of the publishing tick
    pub timestamp: String,

    /// Entity display name
    pub name: String,

    /// Stable unique identifier
    pub unique_id: String,

    /// Entity icon
    pub icon: String,

    /// Combined unit string, e.g. `PLN/MWh`
    pub unit_of_measurement: String,

    /// Current hour's price, if known
    pub native_value: Option<f64>,

    /// Device registry metadata
    pub device_info: serde_json::Value,

    /// Statistics and raw series attributes
    pub attributes: serde_json::Value,

    /// Ticks handled since startup
    pub total_ticks: u64,
}

impl SensorSnapshot {
    fn from_sensor(sensor: &RceSensor, total_ticks: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            name: sensor.name().to_string(),
            unique_id: sensor.unique_id().to_string(),
            icon: sensor.icon().to_string(),
            unit_of_measurement: sensor.unit_of_measurement(),
            native_value: sensor.native_value(),
            device_info: sensor.device_info(),
            attributes: sensor.extra_state_attributes(),
            total_ticks,
        }
    }

    fn initial() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            name: String::new(),
            unique_id: String::new(),
            icon: String::new(),
            unit_of_measurement: String::new(),
            native_value: None,
            device_info: serde_json::Value::Null,
            attributes: serde_json::Value::Null,
            total_ticks: 0,
        }
    }
}

/// Main driver for the RCE sensor
pub struct RceDriver {
    config: Config,
    tz: chrono_tz::Tz,
    sensor: RceSensor,
    logger: StructuredLogger,

    shutdown_tx: mpsc::UnboundedSender<()>,
    shutdown_rx: mpsc::UnboundedReceiver<()>,

    snapshot_tx: watch::Sender<Arc<SensorSnapshot>>,
    total_ticks: u64,
}

impl RceDriver {
    /// Create a new driver, loading configuration from the default locations
    pub fn new() -> Result<Self> {
        let config = Config::load().map_err(|e| {
            eprintln!("Failed to load configuration: {}", e);
            e
        })?;
        config.validate()?;

        crate::logging::init_logging(&config.logging)?;

        let source: Arc<dyn PriceSource> =
            Arc::new(PseClient::new(&config.source.base_url, config.source.timeout_secs)?);
        Self::with_config(config, source)
    }

    /// Create a driver from an explicit configuration and price source
    pub fn with_config(config: Config, source: Arc<dyn PriceSource>) -> Result<Self> {
        let tz = config.tz()?;
        let logger = get_logger("driver");
        logger.info("Initializing RCE sensor driver");

        let sensor = RceSensor::new(
            config.sensor.clone(),
            config.refresh.tomorrow_cutoff_hour,
            source,
        );

        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(Arc::new(SensorSnapshot::initial()));

        Ok(Self {
            config,
            tz,
            sensor,
            logger,
            shutdown_tx,
            shutdown_rx,
            snapshot_tx,
            total_ticks: 0,
        })
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to published snapshots
    pub fn subscribe(&self) -> watch::Receiver<Arc<SensorSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Handle used to stop the main loop
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<()> {
        self.shutdown_tx.clone()
    }

    /// Run the driver main loop
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info("Starting RCE sensor main loop");

        let mut tick_interval =
            interval(Duration::from_secs(self.config.refresh.scan_interval_secs));

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    self.tick().await;
                }
                _ = self.shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }

        self.logger.info("RCE sensor main loop stopped");
        Ok(())
    }

    /// Handle one scheduled tick: update the sensor and publish a snapshot
    pub async fn tick(&mut self) {
        let now = Utc::now().with_timezone(&self.tz).naive_local();
        self.logger.debug(&format!("Tick at {}", now));

        self.sensor.update(now).await;
        self.total_ticks += 1;

        let snapshot = SensorSnapshot::from_sensor(&self.sensor, self.total_ticks);
        self.snapshot_tx.send(Arc::new(snapshot)).ok();
    }
}
