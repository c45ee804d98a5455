//! Bucket range table
//!
//! Maps (signal field, bucket name) to an inclusive numeric interval.
//! Buckets within a field are ordered by severity and assumed not to
//! overlap; neither property is enforced.

use crate::error::ConfigError;
use crate::metric::MetricKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Signal-spec entry naming a bucket for one metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalField {
    #[serde(rename = "yield_bucket")]
    Yield,
    #[serde(rename = "variance_bucket")]
    Variance,
    #[serde(rename = "change_bucket")]
    Change,
    #[serde(rename = "measurement_bucket")]
    Measurement,
    #[serde(rename = "lots_bucket")]
    Lots,
    #[serde(rename = "rework_bucket")]
    Rework,
    #[serde(rename = "window_bucket")]
    Window,
}

impl SignalField {
    /// All signal fields
    pub const ALL: [SignalField; 7] = [
        SignalField::Yield,
        SignalField::Variance,
        SignalField::Change,
        SignalField::Measurement,
        SignalField::Lots,
        SignalField::Rework,
        SignalField::Window,
    ];

    /// Wire name of the field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SignalField::Yield => "yield_bucket",
            SignalField::Variance => "variance_bucket",
            SignalField::Change => "change_bucket",
            SignalField::Measurement => "measurement_bucket",
            SignalField::Lots => "lots_bucket",
            SignalField::Rework => "rework_bucket",
            SignalField::Window => "window_bucket",
        }
    }

    /// Metric this bucket drives
    #[must_use]
    pub const fn metric(self) -> MetricKey {
        match self {
            SignalField::Yield => MetricKey::YieldPct,
            SignalField::Variance => MetricKey::MetricVariance,
            SignalField::Change => MetricKey::ChangeMagnitude,
            SignalField::Measurement => MetricKey::MeasurementConfidence,
            SignalField::Lots => MetricKey::AffectedLotCount,
            SignalField::Rework => MetricKey::ReworkRate,
            SignalField::Window => MetricKey::TimeWindowHours,
        }
    }

    /// Whether the metric is a whole-number count
    #[must_use]
    pub const fn is_count(self) -> bool {
        matches!(self, SignalField::Lots | SignalField::Window)
    }
}

impl fmt::Display for SignalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive interval `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketInterval {
    pub min: f64,
    pub max: f64,
}

impl BucketInterval {
    /// Create interval
    #[inline]
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive membership test with a tolerance for rounding
    #[inline]
    #[must_use]
    pub fn contains(&self, value: f64, epsilon: f64) -> bool {
        value >= self.min - epsilon && value <= self.max + epsilon
    }

    /// Integer view of the interval, for count fields
    ///
    /// Only meaningful after [`BucketTable::validate`] has accepted the bounds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn as_count_range(&self) -> CountRange {
        CountRange {
            min: self.min as u32,
            max: self.max as u32,
        }
    }
}

/// Inclusive whole-number interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    /// Inclusive membership test
    #[inline]
    #[must_use]
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// The (field, bucket) → interval table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BucketTable {
    buckets: BTreeMap<SignalField, BTreeMap<String, BucketInterval>>,
}

impl BucketTable {
    /// Create empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard severity tiers
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::new();
        table
            .insert(SignalField::Yield, "none", 91.5, 96.0)
            .insert(SignalField::Yield, "small", 89.0, 92.4)
            .insert(SignalField::Yield, "medium", 80.0, 88.9)
            .insert(SignalField::Yield, "large", 50.0, 79.9)
            .insert(SignalField::Variance, "low", 0.01, 0.15)
            .insert(SignalField::Variance, "medium", 0.16, 0.35)
            .insert(SignalField::Variance, "high", 0.36, 0.90)
            .insert(SignalField::Change, "small", 0.1, 4.0)
            .insert(SignalField::Change, "medium", 4.1, 10.0)
            .insert(SignalField::Change, "large", 10.1, 25.0)
            .insert(SignalField::Measurement, "low", 0.0, 0.50)
            .insert(SignalField::Measurement, "medium", 0.51, 0.80)
            .insert(SignalField::Measurement, "high", 0.81, 1.0)
            .insert(SignalField::Lots, "small", 1.0, 3.0)
            .insert(SignalField::Lots, "medium", 4.0, 10.0)
            .insert(SignalField::Lots, "large", 11.0, 50.0)
            .insert(SignalField::Rework, "low", 0.0, 2.0)
            .insert(SignalField::Rework, "medium", 2.1, 8.0)
            .insert(SignalField::Rework, "high", 8.1, 25.0)
            .insert(SignalField::Window, "short", 1.0, 12.0)
            .insert(SignalField::Window, "medium", 13.0, 48.0)
            .insert(SignalField::Window, "long", 49.0, 168.0);
        table
    }

    /// Insert or replace a bucket
    pub fn insert(&mut self, field: SignalField, bucket: &str, min: f64, max: f64) -> &mut Self {
        self.buckets
            .entry(field)
            .or_default()
            .insert(bucket.to_string(), BucketInterval::new(min, max));
        self
    }

    /// Look up the interval for `(field, bucket)`
    ///
    /// Only intervals that pass the [`Self::validate`] checks are returned,
    /// so every result is safe to sample from.
    ///
    /// # Errors
    /// [`ConfigError::UnknownBucket`] if the pair is undefined, otherwise the
    /// interval's own defect
    pub fn lookup(&self, field: SignalField, bucket: &str) -> Result<BucketInterval, ConfigError> {
        let interval = self
            .buckets
            .get(&field)
            .and_then(|tiers| tiers.get(bucket))
            .copied()
            .ok_or_else(|| ConfigError::UnknownBucket {
                field,
                bucket: bucket.to_string(),
            })?;
        check_interval(field, bucket, interval)?;
        Ok(interval)
    }

    /// Bucket names defined for a field
    pub fn bucket_names(&self, field: SignalField) -> impl Iterator<Item = &str> {
        self.buckets
            .get(&field)
            .into_iter()
            .flat_map(|tiers| tiers.keys().map(String::as_str))
    }

    /// Number of defined buckets across all fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(BTreeMap::len).sum()
    }

    /// Check if table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check interval invariants for every bucket
    ///
    /// # Errors
    /// The first non-finite, inverted, negative-magnitude or non-integral count interval
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, tiers) in &self.buckets {
            for (bucket, interval) in tiers {
                check_interval(*field, bucket, *interval)?;
            }
        }
        Ok(())
    }
}

fn check_interval(field: SignalField, bucket: &str, interval: BucketInterval) -> Result<(), ConfigError> {
    let BucketInterval { min, max } = interval;
    let bucket = || bucket.to_string();
    if !(min.is_finite() && max.is_finite()) {
        return Err(ConfigError::NonFiniteBounds { field, bucket: bucket(), min, max });
    }
    if min > max {
        return Err(ConfigError::InvertedInterval { field, bucket: bucket(), min, max });
    }
    if field == SignalField::Change && min < 0.0 {
        return Err(ConfigError::NegativeMagnitude { field, bucket: bucket(), min, max });
    }
    if field.is_count() && !(is_whole(min) && is_whole(max) && min >= 0.0) {
        return Err(ConfigError::NonIntegralCountBounds { field, bucket: bucket(), min, max });
    }
    Ok(())
}

fn is_whole(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value <= f64::from(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_valid() {
        let table = BucketTable::standard();
        assert!(table.validate().is_ok());
        assert_eq!(table.len(), 22);
    }

    #[test]
    fn lookup_known_bucket() {
        let table = BucketTable::standard();
        let interval = table.lookup(SignalField::Change, "large").unwrap();
        assert_eq!(interval, BucketInterval::new(10.1, 25.0));
    }

    #[test]
    fn lookup_unknown_bucket() {
        let table = BucketTable::standard();
        let err = table.lookup(SignalField::Window, "eternal").unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownBucket {
                field: SignalField::Window,
                bucket: "eternal".to_string()
            }
        );
    }

    #[test]
    fn bucket_name_is_field_scoped() {
        // "none" is a yield tier only
        let table = BucketTable::standard();
        assert!(table.lookup(SignalField::Yield, "none").is_ok());
        assert!(table.lookup(SignalField::Variance, "none").is_err());
    }

    #[test]
    fn validate_rejects_inverted() {
        let mut table = BucketTable::new();
        table.insert(SignalField::Rework, "odd", 5.0, 1.0);
        assert!(matches!(
            table.validate(),
            Err(ConfigError::InvertedInterval { .. })
        ));
    }

    #[test]
    fn validate_rejects_fractional_counts() {
        let mut table = BucketTable::new();
        table.insert(SignalField::Lots, "half", 0.5, 3.0);
        assert!(matches!(
            table.validate(),
            Err(ConfigError::NonIntegralCountBounds { .. })
        ));
    }

    #[test]
    fn validate_rejects_negative_change() {
        let mut table = BucketTable::new();
        table.insert(SignalField::Change, "signed", -1.0, 3.0);
        assert!(matches!(
            table.validate(),
            Err(ConfigError::NegativeMagnitude { .. })
        ));
    }

    #[test]
    fn lookup_rejects_malformed_interval() {
        let mut table = BucketTable::new();
        table.insert(SignalField::Window, "odd", 30.0, 7.0);
        table.insert(SignalField::Yield, "wide", 0.0, f64::INFINITY);
        assert!(matches!(
            table.lookup(SignalField::Window, "odd"),
            Err(ConfigError::InvertedInterval { .. })
        ));
        assert!(matches!(
            table.lookup(SignalField::Yield, "wide"),
            Err(ConfigError::NonFiniteBounds { .. })
        ));
    }

    #[test]
    fn count_range_from_interval() {
        let range = BucketInterval::new(11.0, 50.0).as_count_range();
        assert_eq!(range, CountRange { min: 11, max: 50 });
        assert!(range.contains(11));
        assert!(range.contains(50));
        assert!(!range.contains(51));
    }

    #[test]
    fn bucket_names_sorted() {
        let table = BucketTable::standard();
        let names: Vec<&str> = table.bucket_names(SignalField::Window).collect();
        assert_eq!(names, vec!["long", "medium", "short"]);
    }
}
