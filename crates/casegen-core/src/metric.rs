//! Metric schema and values
//!
//! The seven metric fields every case record carries. The schema is fixed
//! for the whole system; [`MetricSchema::check`] is the conformance gate the
//! generator applies to each assembled record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the seven metric fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    /// Measured yield, percent
    YieldPct,
    /// Signed yield shift, percentage points
    ChangeMagnitude,
    /// Spread of the monitored metric
    MetricVariance,
    /// Confidence in the measurement path, 0..1
    MeasurementConfidence,
    /// Number of lots touched
    AffectedLotCount,
    /// Rework rate, percent
    ReworkRate,
    /// Observation window, hours
    TimeWindowHours,
}

impl MetricKey {
    /// All keys in record order
    pub const ALL: [MetricKey; 7] = [
        MetricKey::YieldPct,
        MetricKey::ChangeMagnitude,
        MetricKey::MetricVariance,
        MetricKey::MeasurementConfidence,
        MetricKey::AffectedLotCount,
        MetricKey::ReworkRate,
        MetricKey::TimeWindowHours,
    ];

    /// Wire name of the key
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MetricKey::YieldPct => "yield_pct",
            MetricKey::ChangeMagnitude => "change_magnitude",
            MetricKey::MetricVariance => "metric_variance",
            MetricKey::MeasurementConfidence => "measurement_confidence",
            MetricKey::AffectedLotCount => "affected_lot_count",
            MetricKey::ReworkRate => "rework_rate",
            MetricKey::TimeWindowHours => "time_window_hours",
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sampled metric value
///
/// Counts serialize as JSON integers, measures as JSON floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Whole-number field (lots, hours)
    Count(u32),
    /// Continuous field
    Measure(f64),
}

impl MetricValue {
    /// Numeric view of the value
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            MetricValue::Count(n) => f64::from(n),
            MetricValue::Measure(x) => x,
        }
    }
}

/// Metrics of one record, keyed in schema order
pub type Metrics = BTreeMap<MetricKey, MetricValue>;

/// Comma-separated wire names, e.g. `yield_pct, rework_rate`
pub(crate) fn display_keys(keys: &[MetricKey]) -> String {
    keys.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
}

/// The fixed seven-field metric schema
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricSchema;

impl MetricSchema {
    /// Required keys
    #[must_use]
    pub fn keys() -> &'static [MetricKey] {
        &MetricKey::ALL
    }

    /// Number of required keys
    #[must_use]
    pub const fn len() -> usize {
        MetricKey::ALL.len()
    }

    /// Check that `metrics` carries exactly the schema keys
    ///
    /// Returns the missing keys on mismatch. Keys outside the schema are
    /// unrepresentable in [`Metrics`].
    pub fn check(metrics: &Metrics) -> Result<(), Vec<MetricKey>> {
        let missing: Vec<MetricKey> = Self::keys()
            .iter()
            .copied()
            .filter(|key| !metrics.contains_key(key))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}
