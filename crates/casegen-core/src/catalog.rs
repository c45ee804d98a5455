//! Family catalog
//!
//! Two-phase like the rest of the engine:
//! 1. **Authoring**: a [`FamilyCatalog`] is an ordered list of families,
//!    built in code or loaded from YAML/JSON
//! 2. **Validation**: [`FamilyCatalog::validate`] checks every bucket and
//!    allow-list against the bucket table and domains, producing a
//!    [`ValidatedCatalog`]
//!
//! Generation only accepts a [`ValidatedCatalog`], so an unknown bucket or an
//! out-of-domain allow-list value surfaces before the first draw.

use crate::bucket::BucketTable;
use crate::domain::{ContextDomains, ContextField};
use crate::error::{ConfigError, LoadError};
use crate::family::PatternFamily;
use crate::sampler::ResolvedSignals;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ordered list of pattern families
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyCatalog {
    families: Vec<PatternFamily>,
}

impl FamilyCatalog {
    /// Create from families, keeping their order
    #[must_use]
    pub fn new(families: Vec<PatternFamily>) -> Self {
        Self { families }
    }

    /// Parse a YAML list of families
    ///
    /// # Errors
    /// Malformed YAML or a family missing a required entry
    pub fn from_yaml_str(yaml: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON array of families
    ///
    /// # Errors
    /// Malformed JSON or a family missing a required entry
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file
    ///
    /// # Errors
    /// Unreadable file, unknown extension or parse failure
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::io_error(path, e))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Families in catalog order
    #[inline]
    #[must_use]
    pub fn families(&self) -> &[PatternFamily] {
        &self.families
    }

    /// Append a family
    pub fn push(&mut self, family: PatternFamily) {
        self.families.push(family);
    }

    /// Number of families
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Check if catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Validate against a bucket table and context domains
    ///
    /// # Errors
    /// The first defect found, wrapped with the family's index and title
    pub fn validate(
        self,
        table: &BucketTable,
        domains: &ContextDomains,
    ) -> Result<ValidatedCatalog, ConfigError> {
        table.validate()?;
        if self.families.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        let mut resolved = Vec::with_capacity(self.families.len());
        for (index, family) in self.families.into_iter().enumerate() {
            if family.title.trim().is_empty() {
                return Err(ConfigError::BlankTitle { index });
            }
            let signals = ResolvedSignals::resolve(&family.signals, table)
                .map_err(|e| e.in_family(index, family.title.as_str()))?;
            check_constraints(&family, domains).map_err(|e| e.in_family(index, family.title.as_str()))?;
            resolved.push(ResolvedFamily { family, signals });
        }

        tracing::debug!(families = resolved.len(), "family catalog validated");
        Ok(ValidatedCatalog {
            families: resolved,
            table: table.clone(),
            domains: domains.clone(),
        })
    }
}

fn check_constraints(family: &PatternFamily, domains: &ContextDomains) -> Result<(), ConfigError> {
    for field in ContextField::ALL {
        let Some(values) = family.constraints.entry(field) else {
            continue;
        };
        if values.is_empty() {
            tracing::warn!(
                family = %family.title,
                %field,
                "empty allow-list, drawing from the full domain"
            );
            continue;
        }
        let domain = domains.get(field);
        if let Some(outside) = values.iter().find(|v| !domain.contains(v)) {
            return Err(ConfigError::ConstraintOutsideDomain {
                field,
                value: outside.clone(),
            });
        }
    }
    Ok(())
}

/// Family with its buckets resolved to intervals
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFamily {
    pub family: PatternFamily,
    pub signals: ResolvedSignals,
}

/// Catalog that passed validation
///
/// Only constructible through [`FamilyCatalog::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCatalog {
    families: Vec<ResolvedFamily>,
    table: BucketTable,
    domains: ContextDomains,
}

impl ValidatedCatalog {
    /// Resolved families in catalog order
    #[inline]
    #[must_use]
    pub fn families(&self) -> &[ResolvedFamily] {
        &self.families
    }

    /// Family by title
    #[must_use]
    pub fn find(&self, title: &str) -> Option<&ResolvedFamily> {
        self.families.iter().find(|f| f.family.title == title)
    }

    /// Bucket table the catalog was validated against
    #[inline]
    #[must_use]
    pub fn table(&self) -> &BucketTable {
        &self.table
    }

    /// Domains the catalog was validated against
    #[inline]
    #[must_use]
    pub fn domains(&self) -> &ContextDomains {
        &self.domains
    }

    /// Number of families
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Always false for a validated catalog
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}
