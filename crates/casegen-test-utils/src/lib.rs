//! Testing utilities for the casegen workspace
//!
//! Shared fixtures: a pinned reference time, small domains and a family builder.

#![allow(missing_docs)]

use casegen_core::{
    BucketTable, CaseRecord, CategoricalDomain, ChangeDirection, ConstraintSpec, ContextDomains,
    ContextField, FamilyCatalog, GeneratorConfig, PatternFamily, SignalSpec, ValidatedCatalog,
};
use chrono::{DateTime, TimeZone, Utc};

/// Reference instant used by every fixture
pub fn fixed_reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Generator settings anchored at [`fixed_reference_time`]
pub fn fixed_config(seed: u64, repetitions_per_family: u32) -> GeneratorConfig {
    GeneratorConfig::new(seed, repetitions_per_family).with_reference_time(fixed_reference_time())
}

/// Two sites, three tool groups, three steps
pub fn small_domains() -> ContextDomains {
    ContextDomains::new(
        CategoricalDomain::new(ContextField::Site, ["Fab-1", "Fab-2"]).unwrap(),
        CategoricalDomain::new(ContextField::ToolGroup, ["ETCH-A", "ETCH-B", "CMP-A"]).unwrap(),
        CategoricalDomain::new(ContextField::ProcessStep, ["etch", "polish", "clean"]).unwrap(),
    )
    .unwrap()
}

/// Standard catalog over standard domains, validated
pub fn standard_validated_catalog() -> ValidatedCatalog {
    let domains = ContextDomains::standard();
    casegen_core::standard_catalog(&domains)
        .validate(&BucketTable::standard(), &domains)
        .unwrap()
}

/// Standard corpus for `seed`
pub fn standard_corpus(seed: u64, repetitions_per_family: u32) -> Vec<CaseRecord> {
    casegen_core::generate(&standard_validated_catalog(), fixed_config(seed, repetitions_per_family))
        .unwrap()
}

/// Validate `families` against the standard table and `domains`
pub fn validated(families: Vec<PatternFamily>, domains: &ContextDomains) -> ValidatedCatalog {
    FamilyCatalog::new(families)
        .validate(&BucketTable::standard(), domains)
        .unwrap()
}

/// Builder for test families, starting from a mild negative drift
#[derive(Debug, Clone)]
pub struct FamilyBuilder {
    family: PatternFamily,
}

impl FamilyBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            family: PatternFamily {
                title: title.to_string(),
                constraints: ConstraintSpec::unconstrained(),
                signals: SignalSpec {
                    yield_bucket: "medium".into(),
                    variance_bucket: "low".into(),
                    change_dir: ChangeDirection::Neg,
                    change_bucket: "small".into(),
                    measurement_bucket: "medium".into(),
                    lots_bucket: "medium".into(),
                    rework_bucket: "low".into(),
                    window_bucket: "short".into(),
                },
                matched_template: format!("Matched: {title}"),
                resolution: "Resolved.".into(),
                hints: vec!["scope_segmentation".into()],
            },
        }
    }

    #[must_use]
    pub fn yield_bucket(mut self, bucket: &str) -> Self {
        self.family.signals.yield_bucket = bucket.to_string();
        self
    }

    #[must_use]
    pub fn change(mut self, direction: ChangeDirection, bucket: &str) -> Self {
        self.family.signals.change_dir = direction;
        self.family.signals.change_bucket = bucket.to_string();
        self
    }

    #[must_use]
    pub fn allow(mut self, field: ContextField, values: &[&str]) -> Self {
        let values = values.iter().map(|v| (*v).to_string()).collect();
        self.family.constraints = self.family.constraints.with(field, values);
        self
    }

    pub fn build(self) -> PatternFamily {
        self.family
    }
}
