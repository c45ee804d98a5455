//! Error types for case generation
//!
//! Two fatal classes exist inside the sampling path:
//! - [`ConfigError`]: a malformed catalog, bucket table, domain or run setting,
//!   detected before any sampling begins
//! - [`SchemaViolation`]: an assembled record whose metric keys differ from the
//!   metric schema, which aborts the whole run
//!
//! Everything outside the sampling path (files, parsing) reports through
//! [`LoadError`] and [`SinkError`].

use crate::bucket::SignalField;
use crate::domain::ContextField;
use crate::metric::{display_keys, MetricKey};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Startup-time configuration defects. Never recovered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Bucket name not present in the bucket table for this field
    #[error("unknown bucket '{bucket}' for {field}")]
    UnknownBucket { field: SignalField, bucket: String },

    /// Interval bound is NaN or infinite
    #[error("bucket '{bucket}' for {field} has non-finite bounds: [{min}, {max}]")]
    NonFiniteBounds {
        field: SignalField,
        bucket: String,
        min: f64,
        max: f64,
    },

    /// Interval with `min > max`
    #[error("bucket '{bucket}' for {field} is inverted: [{min}, {max}]")]
    InvertedInterval {
        field: SignalField,
        bucket: String,
        min: f64,
        max: f64,
    },

    /// Count fields need whole, non-negative bounds
    #[error("bucket '{bucket}' for {field} must have whole non-negative bounds, got [{min}, {max}]")]
    NonIntegralCountBounds {
        field: SignalField,
        bucket: String,
        min: f64,
        max: f64,
    },

    /// Change buckets describe magnitudes and cannot be negative
    #[error("bucket '{bucket}' for {field} must be non-negative, got [{min}, {max}]")]
    NegativeMagnitude {
        field: SignalField,
        bucket: String,
        min: f64,
        max: f64,
    },

    /// Placeholder-led list did not start with the placeholder marker
    #[error("{field} list must start with a placeholder entry")]
    MissingPlaceholder { field: ContextField },

    /// Domain has no selectable values
    #[error("{field} domain has no selectable values")]
    EmptyDomain { field: ContextField },

    /// Domain contains an empty or whitespace-only value
    #[error("{field} domain contains a blank value")]
    BlankDomainValue { field: ContextField },

    /// Domain contains the same value twice
    #[error("{field} domain lists '{value}' more than once")]
    DuplicateDomainValue { field: ContextField, value: String },

    /// Domain handed in for the wrong context field
    #[error("{found} domain supplied where {expected} was expected")]
    MisplacedDomain {
        expected: ContextField,
        found: ContextField,
    },

    /// Allow-list names a value outside the field's domain
    #[error("allow-list for {field} names '{value}', which is not in the domain")]
    ConstraintOutsideDomain { field: ContextField, value: String },

    /// Catalog has no families
    #[error("family catalog is empty")]
    EmptyCatalog,

    /// Family has a blank title
    #[error("family #{index} has a blank title")]
    BlankTitle { index: usize },

    /// A family failed validation
    #[error("family #{index} '{title}': {source}")]
    InvalidFamily {
        index: usize,
        title: String,
        #[source]
        source: Box<ConfigError>,
    },

    /// Run needs at least one repetition per family
    #[error("repetitions per family must be at least 1")]
    ZeroRepetitions,

    /// Run asks for more repetitions than a corpus may hold
    #[error("repetitions per family must be at most {max}, got {requested}")]
    TooManyRepetitions { requested: u32, max: u32 },

    /// Lookback window reaches past the representable date range
    #[error("lookback of {days} days from {reference_time} is outside the supported date range")]
    LookbackOutOfRange {
        days: u32,
        reference_time: DateTime<Utc>,
    },
}

impl ConfigError {
    /// Attach family position and title to a per-family defect
    #[must_use]
    pub fn in_family(self, index: usize, title: impl Into<String>) -> Self {
        Self::InvalidFamily {
            index,
            title: title.into(),
            source: Box::new(self),
        }
    }
}

/// A record whose metric keys do not match the metric schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "schema violation in {case_id} (family #{family_index} '{family}', repetition {repetition}): missing {}",
    display_keys(.missing)
)]
pub struct SchemaViolation {
    /// Identifier of the offending record
    pub case_id: String,
    /// Position of the family in the catalog
    pub family_index: usize,
    /// Family title
    pub family: String,
    /// Zero-based repetition within the family
    pub repetition: u32,
    /// Schema keys absent from the record
    pub missing: Vec<MetricKey>,
}

/// Errors that abort a generation run
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaViolation),
}

/// Errors reading configuration or catalog files
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML config did not parse
    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// YAML catalog did not parse
    #[error("invalid YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON catalog did not parse
    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog file extension not recognised
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Loaded content is structurally valid but semantically wrong
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LoadError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors writing or reading a case corpus
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SinkError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create JSON error for path
    pub fn json_error(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bucket_display() {
        let err = ConfigError::UnknownBucket {
            field: SignalField::Yield,
            bucket: "huge".to_string(),
        };
        assert_eq!(err.to_string(), "unknown bucket 'huge' for yield_bucket");
    }

    #[test]
    fn family_context_wraps_source() {
        let err = ConfigError::EmptyDomain {
            field: ContextField::Site,
        }
        .in_family(3, "Etch excursion");
        assert!(err.to_string().starts_with("family #3 'Etch excursion'"));
        assert!(matches!(err, ConfigError::InvalidFamily { index: 3, .. }));
    }

    #[test]
    fn schema_violation_names_record() {
        let err = SchemaViolation {
            case_id: "C-007".to_string(),
            family_index: 1,
            family: "Etch".to_string(),
            repetition: 1,
            missing: vec![MetricKey::ReworkRate],
        };
        let msg = err.to_string();
        assert!(msg.contains("C-007"));
        assert!(msg.ends_with("missing rework_rate"), "{msg}");
    }

    #[test]
    fn error_conversions() {
        let err: GenerateError = ConfigError::EmptyCatalog.into();
        assert!(matches!(err, GenerateError::Config(ConfigError::EmptyCatalog)));
    }
}
