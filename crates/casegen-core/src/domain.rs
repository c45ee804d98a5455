//! Categorical domains
//!
//! Ordered value lists for the three context fields. Upstream lists are led
//! by a non-selectable placeholder (`"— Select site —"`); the core only ever
//! works with the stripped list.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Marker every placeholder entry starts with
pub const PLACEHOLDER_MARKER: char = '—';

/// One of the three categorical context fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextField {
    Site,
    ToolGroup,
    ProcessStep,
}

impl ContextField {
    /// All context fields, in resolution order
    pub const ALL: [ContextField; 3] = [
        ContextField::Site,
        ContextField::ToolGroup,
        ContextField::ProcessStep,
    ];

    /// Wire name of the field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ContextField::Site => "site",
            ContextField::ToolGroup => "tool_group",
            ContextField::ProcessStep => "process_step",
        }
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selectable values of one context field
///
/// Invariant: non-empty, values unique and non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalDomain {
    field: ContextField,
    values: Vec<String>,
}

impl CategoricalDomain {
    /// Create from an already-stripped list
    ///
    /// # Errors
    /// Empty list, blank value or duplicate value
    pub fn new<I, S>(field: ContextField, values: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(ConfigError::EmptyDomain { field });
        }
        {
            let mut seen = HashSet::with_capacity(values.len());
            for value in &values {
                if value.trim().is_empty() {
                    return Err(ConfigError::BlankDomainValue { field });
                }
                if !seen.insert(value.as_str()) {
                    return Err(ConfigError::DuplicateDomainValue {
                        field,
                        value: value.clone(),
                    });
                }
            }
        }
        Ok(Self { field, values })
    }

    /// Create from a placeholder-led list, stripping the placeholder
    ///
    /// # Errors
    /// Missing placeholder, no real value after it, or any [`Self::new`] defect
    pub fn from_placeholder_led<I, S>(field: ContextField, values: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values = values.into_iter().map(Into::into);
        match values.next() {
            Some(first) if first.starts_with(PLACEHOLDER_MARKER) => Self::new(field, values),
            _ => Err(ConfigError::MissingPlaceholder { field }),
        }
    }

    /// Field this domain belongs to
    #[inline]
    #[must_use]
    pub fn field(&self) -> ContextField {
        self.field
    }

    /// Selectable values, in order
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Check membership
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Values containing `keyword` (case-sensitive), in domain order
    #[must_use]
    pub fn matching(&self, keyword: &str) -> Vec<String> {
        self.values
            .iter()
            .filter(|v| v.contains(keyword))
            .cloned()
            .collect()
    }

    /// Number of selectable values
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed domain
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The three context domains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextDomains {
    pub sites: CategoricalDomain,
    pub tool_groups: CategoricalDomain,
    pub process_steps: CategoricalDomain,
}

impl ContextDomains {
    /// Bundle three domains
    ///
    /// # Errors
    /// [`ConfigError::MisplacedDomain`] if a domain is wired to the wrong slot
    pub fn new(
        sites: CategoricalDomain,
        tool_groups: CategoricalDomain,
        process_steps: CategoricalDomain,
    ) -> Result<Self, ConfigError> {
        for (expected, domain) in [
            (ContextField::Site, &sites),
            (ContextField::ToolGroup, &tool_groups),
            (ContextField::ProcessStep, &process_steps),
        ] {
            if domain.field() != expected {
                return Err(ConfigError::MisplacedDomain {
                    expected,
                    found: domain.field(),
                });
            }
        }
        Ok(Self {
            sites,
            tool_groups,
            process_steps,
        })
    }

    /// Build from three placeholder-led lists
    ///
    /// # Errors
    /// Any domain defect
    pub fn from_placeholder_led(
        sites: &[String],
        tool_groups: &[String],
        process_steps: &[String],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            sites: CategoricalDomain::from_placeholder_led(ContextField::Site, sites.iter().cloned())?,
            tool_groups: CategoricalDomain::from_placeholder_led(
                ContextField::ToolGroup,
                tool_groups.iter().cloned(),
            )?,
            process_steps: CategoricalDomain::from_placeholder_led(
                ContextField::ProcessStep,
                process_steps.iter().cloned(),
            )?,
        })
    }

    /// Plant sites, tool groups and process steps of the reference fab
    #[must_use]
    pub fn standard() -> Self {
        let domain = |field, values: &[&str]| CategoricalDomain {
            field,
            values: values.iter().map(|v| (*v).to_string()).collect(),
        };
        Self {
            sites: domain(
                ContextField::Site,
                &["Plant-A", "Plant-B", "Plant-C", "Plant-D"],
            ),
            tool_groups: domain(
                ContextField::ToolGroup,
                &[
                    "ETCH-CLUSTER-1",
                    "ETCH-CLUSTER-2",
                    "LITHO-LINE-1",
                    "LITHO-LINE-2",
                    "DEP-STACK-1",
                    "INSPECT-GROUP-1",
                ],
            ),
            process_steps: domain(
                ContextField::ProcessStep,
                &["lithography", "etch", "deposition", "inspection", "metrology"],
            ),
        }
    }

    /// Domain for a field
    #[must_use]
    pub fn get(&self, field: ContextField) -> &CategoricalDomain {
        match field {
            ContextField::Site => &self.sites,
            ContextField::ToolGroup => &self.tool_groups,
            ContextField::ProcessStep => &self.process_steps,
        }
    }
}

impl Default for ContextDomains {
    fn default() -> Self {
        Self::standard()
    }
}
