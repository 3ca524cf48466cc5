//! Health scoring policy
//!
//! The orchestrator never hard-codes how metrics become a score; it asks a
//! [`ScoringPolicy`]. [`WeightedScoring`] carries the stock weighting.

use crate::metrics::CellularMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Turns cell metrics into a 0-100 health score.
pub trait ScoringPolicy: Send + Sync + fmt::Debug {
    /// Composite health score in `[0, 100]`.
    ///
    /// May return a non-finite value when the metrics themselves are
    /// corrupt; callers treat that as a failed health check.
    fn health_score(&self, metrics: &CellularMetrics) -> f64;

    /// Uptime percentage after `elapsed` wall time with `error_count` errors.
    fn uptime_percentage(&self, elapsed: Duration, error_count: u64) -> f64;
}

/// Linear weighting of success rate, latency, resource headroom and uptime.
///
/// `score = w_s*successRate + w_p*perfScore + w_r*headroom + w_u*uptime`
/// with `perfScore = min(100, reference_ms / max(avg_ms, 1))` and
/// `headroom = max(0, 100 - (memory + cpu))`.
///
/// Uptime is a heuristic: every recorded error is charged a fixed penalty of
/// wall time. It is not a real availability measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightedScoring {
    pub success_weight: f64,
    pub performance_weight: f64,
    pub resource_weight: f64,
    pub uptime_weight: f64,

    /// Average processing time (ms) that still earns a full performance score
    pub performance_reference_ms: f64,

    /// Wall time charged per recorded error when estimating uptime
    pub error_penalty_secs: f64,
}

impl Default for WeightedScoring {
    fn default() -> Self {
        Self {
            success_weight: 0.4,
            performance_weight: 0.3,
            resource_weight: 0.2,
            uptime_weight: 0.1,
            performance_reference_ms: 1000.0,
            error_penalty_secs: 60.0,
        }
    }
}

impl ScoringPolicy for WeightedScoring {
    fn health_score(&self, metrics: &CellularMetrics) -> f64 {
        let success_rate = metrics.success_rate();
        let perf_score =
            (self.performance_reference_ms / metrics.processing_time_avg.max(1.0)).min(100.0);
        let headroom = (100.0 - (metrics.memory_usage + metrics.cpu_usage)).max(0.0);

        let score = self.success_weight * success_rate
            + self.performance_weight * perf_score
            + self.resource_weight * headroom
            + self.uptime_weight * metrics.uptime_percentage;

        // NaN passes through clamp untouched
        score.clamp(0.0, 100.0)
    }

    fn uptime_percentage(&self, elapsed: Duration, error_count: u64) -> f64 {
        let elapsed = elapsed.as_secs_f64();
        if elapsed <= 0.0 {
            return if error_count == 0 { 100.0 } else { 0.0 };
        }

        let penalty = error_count as f64 * self.error_penalty_secs;
        ((elapsed - penalty) / elapsed * 100.0).clamp(0.0, 100.0)
    }
}

/// Score thresholds used when classifying components and the whole system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthThresholds {
    /// A component is healthy only when its score is strictly above this
    pub healthy_score: f64,

    /// Healthy-component percentage below which the system is critical
    pub critical_below: f64,

    /// Healthy-component percentage below which the system is degraded
    pub degraded_below: f64,

    /// Healthy-component percentage below which the system is in warning
    pub warning_below: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            healthy_score: 70.0,
            critical_below: 50.0,
            degraded_below: 70.0,
            warning_below: 90.0,
        }
    }
}

impl HealthThresholds {
    pub fn is_healthy_score(&self, score: f64) -> bool {
        score > self.healthy_score
    }
}
