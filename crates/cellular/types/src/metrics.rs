//! Per-cell running performance counters

use crate::scoring::ScoringPolicy;
use crate::status::CellularStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Running counters for a single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellularMetrics {
    pub status: CellularStatus,
    pub last_activity: DateTime<Utc>,

    /// Running mean of processing time in milliseconds
    pub processing_time_avg: f64,

    pub error_count: u64,
    pub success_count: u64,

    /// Memory usage gauge, percent
    pub memory_usage: f64,

    /// CPU usage gauge, percent
    pub cpu_usage: f64,

    /// Number of outgoing connections
    pub connection_count: usize,

    /// Successful operations per second since start
    pub data_throughput: f64,

    pub uptime_percentage: f64,
}

impl Default for CellularMetrics {
    fn default() -> Self {
        Self {
            status: CellularStatus::Inactive,
            last_activity: Utc::now(),
            processing_time_avg: 0.0,
            error_count: 0,
            success_count: 0,
            memory_usage: 0.0,
            cpu_usage: 0.0,
            connection_count: 0,
            data_throughput: 0.0,
            uptime_percentage: 100.0,
        }
    }
}

impl CellularMetrics {
    /// Total operations recorded so far.
    pub fn operations(&self) -> u64 {
        self.success_count + self.error_count
    }

    /// Success rate in percent; 100 before the first operation.
    pub fn success_rate(&self) -> f64 {
        let total = self.operations();
        if total == 0 {
            return 100.0;
        }
        self.success_count as f64 / total as f64 * 100.0
    }

    /// Record one operation.
    ///
    /// The processing-time mean is folded in before the counters move, so
    /// `n` is the number of operations prior to this one. `elapsed` is the
    /// wall time since the cell started and drives the uptime estimate.
    pub fn record_operation(
        &mut self,
        processing_time_ms: Option<f64>,
        success: bool,
        elapsed: Duration,
        policy: &dyn ScoringPolicy,
    ) {
        if let Some(sample) = processing_time_ms {
            let n = self.operations() as f64;
            self.processing_time_avg = (self.processing_time_avg * n + sample) / (n + 1.0);
        }

        if success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }

        self.last_activity = Utc::now();
        self.uptime_percentage = policy.uptime_percentage(elapsed, self.error_count);

        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.data_throughput = self.success_count as f64 / secs;
        }
    }

    /// Composite health score under `policy`.
    pub fn health_score(&self, policy: &dyn ScoringPolicy) -> f64 {
        policy.health_score(self)
    }
}
