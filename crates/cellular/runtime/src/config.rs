//! Configuration for the cellular manager

use cellular_types::{HealthThresholds, LinkProfile, WeightedScoring};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main manager configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Background health monitor
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Dispatch defaults for `process_data` and `broadcast_data`
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Link quality applied when a connection request names none
    #[serde(default)]
    pub links: LinkProfile,

    /// Health score weighting
    #[serde(default)]
    pub scoring: WeightedScoring,

    /// Health classification bands
    #[serde(default)]
    pub thresholds: HealthThresholds,

    /// Event bus sizing
    #[serde(default)]
    pub events: EventConfig,
}

/// Health monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Run the monitor while the manager is running
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between health checks
    #[serde(default = "default_monitor_interval")]
    pub interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_monitor_interval(),
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Dispatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Default per-call timeout in milliseconds; none when unset
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl DispatchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Event bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Broadcast capacity of the manager bus
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_monitor_interval() -> u64 {
    30
}

fn default_channel_capacity() -> usize {
    1024
}

impl ManagerConfig {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// Environment variables use the `CELLULAR_` prefix and `__` between
    /// nested keys, e.g. `CELLULAR_MONITOR__INTERVAL_SECS=5`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ManagerConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CELLULAR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Configuration without a background monitor
    pub fn without_monitor() -> Self {
        Self {
            monitor: MonitorConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
