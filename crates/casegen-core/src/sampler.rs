//! Physics-aware metric sampler
//!
//! Draws one value per metric field from its bucket interval. Yield and
//! change magnitude are the only linked pair: a positive shift may never
//! carry yield past 100%. When the requested change bucket cannot fit under
//! the headroom, the draw is downgraded to `[0.1, 0.9 * headroom]` instead
//! of retried, so every call terminates after one draw per field.
//!
//! Intervals are resolved against the bucket table once, at catalog
//! validation; sampling itself cannot fail.

use crate::bucket::{BucketInterval, BucketTable, CountRange, SignalField};
use crate::error::ConfigError;
use crate::family::{ChangeDirection, SignalSpec};
use crate::metric::{MetricKey, MetricValue, Metrics};
use rand::Rng;

/// Upper bound for yield, percent
pub const MAX_YIELD_PCT: f64 = 100.0;

/// Lower bound of the downgraded positive-shift draw
pub const FALLBACK_MIN_SHIFT: f64 = 0.1;

/// Share of the headroom the downgraded draw may use
pub const FALLBACK_HEADROOM_SHARE: f64 = 0.9;

/// Signal spec with every bucket resolved to its interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSignals {
    pub yield_pct: BucketInterval,
    pub change: BucketInterval,
    pub direction: ChangeDirection,
    pub variance: BucketInterval,
    pub measurement: BucketInterval,
    pub lots: CountRange,
    pub rework: BucketInterval,
    pub window: CountRange,
}

impl ResolvedSignals {
    /// Resolve every bucket of `spec` through `table`
    ///
    /// # Errors
    /// [`ConfigError::UnknownBucket`] for the first undefined bucket, or the
    /// interval error [`BucketTable::validate`] would report for a malformed one
    pub fn resolve(spec: &SignalSpec, table: &BucketTable) -> Result<Self, ConfigError> {
        let lookup = |field: SignalField| table.lookup(field, spec.bucket(field));
        Ok(Self {
            yield_pct: lookup(SignalField::Yield)?,
            change: lookup(SignalField::Change)?,
            direction: spec.change_dir,
            variance: lookup(SignalField::Variance)?,
            measurement: lookup(SignalField::Measurement)?,
            lots: lookup(SignalField::Lots)?.as_count_range(),
            rework: lookup(SignalField::Rework)?,
            window: lookup(SignalField::Window)?.as_count_range(),
        })
    }
}

/// Output of one sampling call
#[derive(Debug, Clone, PartialEq)]
pub struct SampledMetrics {
    /// The seven metric values
    pub metrics: Metrics,
    /// Positive shift was downgraded below its bucket to respect headroom
    pub change_downgraded: bool,
}

/// Draw a full metric set for one record
///
/// Draw order is fixed (yield, change, variance, confidence, lots, rework,
/// window) and is part of the reproducibility contract.
pub fn sample_metrics<R: Rng + ?Sized>(signals: &ResolvedSignals, rng: &mut R) -> SampledMetrics {
    let mut metrics = Metrics::new();

    let yield_pct = round_to(uniform(rng, signals.yield_pct.min, signals.yield_pct.max), 2);
    metrics.insert(MetricKey::YieldPct, MetricValue::Measure(yield_pct));

    let (change, change_downgraded) = sample_change(signals, yield_pct, rng);
    metrics.insert(MetricKey::ChangeMagnitude, MetricValue::Measure(change));

    let variance = round_to(uniform(rng, signals.variance.min, signals.variance.max), 3);
    metrics.insert(MetricKey::MetricVariance, MetricValue::Measure(variance));

    let confidence = round_to(
        uniform(rng, signals.measurement.min, signals.measurement.max),
        2,
    );
    metrics.insert(
        MetricKey::MeasurementConfidence,
        MetricValue::Measure(confidence),
    );

    let lots = rng.gen_range(signals.lots.min..=signals.lots.max);
    metrics.insert(MetricKey::AffectedLotCount, MetricValue::Count(lots));

    let rework = round_to(uniform(rng, signals.rework.min, signals.rework.max), 2);
    metrics.insert(MetricKey::ReworkRate, MetricValue::Measure(rework));

    let window = rng.gen_range(signals.window.min..=signals.window.max);
    metrics.insert(MetricKey::TimeWindowHours, MetricValue::Count(window));

    SampledMetrics {
        metrics,
        change_downgraded,
    }
}

/// Signed change magnitude, rounded to 2 places, and whether it was downgraded
fn sample_change<R: Rng + ?Sized>(
    signals: &ResolvedSignals,
    yield_pct: f64,
    rng: &mut R,
) -> (f64, bool) {
    let bucket = signals.change;
    match signals.direction {
        ChangeDirection::Zero => (0.0, false),
        ChangeDirection::Neg => {
            let magnitude = uniform(rng, bucket.min, bucket.max).abs();
            (normalize_zero(round_to(-magnitude, 2)), false)
        }
        ChangeDirection::Pos => {
            let headroom = MAX_YIELD_PCT - yield_pct;
            let (magnitude, downgraded) = if bucket.min > headroom {
                (fallback_shift(rng, headroom), true)
            } else {
                (uniform(rng, bucket.min, bucket.max.min(headroom)), false)
            };
            (normalize_zero(round_to(magnitude.max(0.0), 2)), downgraded)
        }
    }
}

/// Downgraded draw from `[0.1, 0.9 * headroom]`
///
/// With less than ~0.11 points of headroom the lower bound drops to the
/// upper one; with none at all the shift is zero.
fn fallback_shift<R: Rng + ?Sized>(rng: &mut R, headroom: f64) -> f64 {
    if headroom <= 0.0 {
        return 0.0;
    }
    let upper = FALLBACK_HEADROOM_SHARE * headroom;
    uniform(rng, FALLBACK_MIN_SHIFT.min(upper), upper)
}

/// Uniform draw over the closed interval between `a` and `b`
fn uniform<R: Rng + ?Sized>(rng: &mut R, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if lo == hi {
        return lo;
    }
    rng.gen_range(lo..=hi)
}

/// Round half away from zero to `places` decimals
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}
