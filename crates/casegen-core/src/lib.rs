//! Casegen Core (casegen-core)
//!
//! Synthetic historical case data for manufacturing-anomaly investigation.
//! Each record pairs a failure archetype ("family") with a sampled plant
//! context and seven physically consistent metric values.
//!
//! Two-phase like the rest of the workspace:
//! 1. **Validation**: a [`FamilyCatalog`] is checked against the
//!    [`BucketTable`] and [`ContextDomains`], producing a [`ValidatedCatalog`]
//! 2. **Generation**: a [`Generator`] draws the corpus from one seeded stream
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use casegen_core::prelude::*;
//!
//! let domains = ContextDomains::standard();
//! let catalog = standard_catalog(&domains).validate(&BucketTable::standard(), &domains)?;
//!
//! let run = Generator::new(&catalog, GeneratorConfig::new(42, 5))?.run()?;
//! write_cases("data/realistic_cases.json", &run.cases)?;
//! println!("{}", run.report.generate_text());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod audit;
pub mod bucket;
pub mod catalog;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod family;
pub mod generator;
pub mod metric;
pub mod presets;
pub mod record;
pub mod sampler;
pub mod sink;

pub use audit::{audit_cases, AuditFinding, AuditReport, FindingKind};
pub use bucket::{BucketInterval, BucketTable, CountRange, SignalField};
pub use catalog::{FamilyCatalog, ResolvedFamily, ValidatedCatalog};
pub use config::{CasegenConfig, DomainsConfig};
pub use context::{resolve_context, Context};
pub use domain::{CategoricalDomain, ContextDomains, ContextField, PLACEHOLDER_MARKER};
pub use error::*;
pub use family::{ChangeDirection, ConstraintSpec, PatternFamily, SignalSpec};
pub use generator::{generate, FamilyTally, GenerationReport, GenerationRun, Generator, GeneratorConfig};
pub use metric::{MetricKey, MetricSchema, MetricValue, Metrics};
pub use presets::standard_catalog;
pub use record::{CaseId, CaseRecord};
pub use sampler::{sample_metrics, ResolvedSignals, SampledMetrics};
pub use sink::{read_cases, write_cases};

/// Common imports
pub mod prelude {
    pub use crate::audit::{audit_cases, AuditReport};
    pub use crate::bucket::BucketTable;
    pub use crate::catalog::{FamilyCatalog, ValidatedCatalog};
    pub use crate::config::CasegenConfig;
    pub use crate::domain::ContextDomains;
    pub use crate::error::{ConfigError, GenerateError, LoadError, SinkError};
    pub use crate::generator::{GenerationReport, Generator, GeneratorConfig};
    pub use crate::presets::standard_catalog;
    pub use crate::record::CaseRecord;
    pub use crate::sink::{read_cases, write_cases};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
