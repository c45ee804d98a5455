//! Pattern families
//!
//! A family is the unit of narrative coherence: one failure archetype with
//! its context restrictions, signal buckets and resolution text. Families
//! are authored statically and never mutated during generation.

use crate::bucket::SignalField;
use crate::domain::ContextField;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the yield shift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    /// Yield moved up; bounded by headroom to 100%
    Pos,
    /// Yield moved down
    Neg,
    /// No shift; change bucket ignored
    Zero,
}

impl ChangeDirection {
    /// Wire tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ChangeDirection::Pos => "pos",
            ChangeDirection::Neg => "neg",
            ChangeDirection::Zero => "zero",
        }
    }
}

impl fmt::Display for ChangeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket per metric field plus the change direction
///
/// Serialized verbatim into every record for traceability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalSpec {
    pub yield_bucket: String,
    pub variance_bucket: String,
    pub change_dir: ChangeDirection,
    pub change_bucket: String,
    pub measurement_bucket: String,
    pub lots_bucket: String,
    pub rework_bucket: String,
    pub window_bucket: String,
}

impl SignalSpec {
    /// Bucket name for a field
    #[must_use]
    pub fn bucket(&self, field: SignalField) -> &str {
        match field {
            SignalField::Yield => &self.yield_bucket,
            SignalField::Variance => &self.variance_bucket,
            SignalField::Change => &self.change_bucket,
            SignalField::Measurement => &self.measurement_bucket,
            SignalField::Lots => &self.lots_bucket,
            SignalField::Rework => &self.rework_bucket,
            SignalField::Window => &self.window_bucket,
        }
    }
}

/// Optional allow-lists per context field
///
/// An absent entry and an empty list both mean "draw from the full domain".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstraintSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_group: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_step: Option<Vec<String>>,
}

impl ConstraintSpec {
    /// No restrictions
    #[must_use]
    pub fn unconstrained() -> Self {
        Self::default()
    }

    /// Restrict a field to `values`
    #[must_use]
    pub fn with(mut self, field: ContextField, values: Vec<String>) -> Self {
        *self.slot_mut(field) = Some(values);
        self
    }

    /// Raw entry for a field, as authored
    #[must_use]
    pub fn entry(&self, field: ContextField) -> Option<&[String]> {
        match field {
            ContextField::Site => self.site.as_deref(),
            ContextField::ToolGroup => self.tool_group.as_deref(),
            ContextField::ProcessStep => self.process_step.as_deref(),
        }
    }

    /// Effective allow-list: `None` when absent or empty
    #[must_use]
    pub fn allowed(&self, field: ContextField) -> Option<&[String]> {
        self.entry(field).filter(|values| !values.is_empty())
    }

    /// Check if no field is effectively restricted
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        ContextField::ALL.iter().all(|f| self.allowed(*f).is_none())
    }

    fn slot_mut(&mut self, field: ContextField) -> &mut Option<Vec<String>> {
        match field {
            ContextField::Site => &mut self.site,
            ContextField::ToolGroup => &mut self.tool_group,
            ContextField::ProcessStep => &mut self.process_step,
        }
    }
}

/// One failure archetype
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternFamily {
    pub title: String,
    #[serde(default)]
    pub constraints: ConstraintSpec,
    pub signals: SignalSpec,
    pub matched_template: String,
    pub resolution: String,
    #[serde(default)]
    pub hints: Vec<String>,
}
