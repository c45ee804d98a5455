//! Case records
//!
//! The output unit handed to downstream matching. Created once by the
//! generator and never updated.

use crate::context::Context;
use crate::family::SignalSpec;
use crate::metric::Metrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Sequential case identifier, rendered `C-001`, `C-002`, …
///
/// Numbering starts at 1 and runs across the whole corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaseId(pub u32);

impl CaseId {
    /// First identifier of a run
    pub const FIRST: CaseId = CaseId(1);

    /// Following identifier
    #[inline]
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{:03}", self.0)
    }
}

/// Error parsing a [`CaseId`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid case id '{0}', expected C-NNN")]
pub struct CaseIdError(String);

impl FromStr for CaseId {
    type Err = CaseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("C-")
            .filter(|digits| digits.len() >= 3 && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
            .map(CaseId)
            .ok_or_else(|| CaseIdError(s.to_string()))
    }
}

impl Serialize for CaseId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CaseId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One synthetic historical investigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_id: CaseId,
    pub created_at: DateTime<Utc>,
    pub family: String,
    pub title: String,
    pub context: Context,
    pub metrics: Metrics,
    pub signals: SignalSpec,
    pub matched_signals_template: String,
    pub resolution_summary: String,
    pub next_checks_hint: Vec<String>,
}
