//! Run configuration file
//!
//! ```toml
//! seed = 42
//! repetitions_per_family = 5
//! lookback_days = 180
//! output = "data/realistic_cases.json"
//! catalog = "families.yaml"
//!
//! [domains]
//! sites = ["— Select site —", "Plant-A", "Plant-B"]
//! tool_groups = ["— Select tool group —", "ETCH-CLUSTER-1"]
//! process_steps = ["— Select step —", "etch"]
//! ```
//!
//! Every key is optional. Without `catalog` the standard families are used;
//! without `[domains]` the standard domains are.

use crate::bucket::BucketTable;
use crate::catalog::{FamilyCatalog, ValidatedCatalog};
use crate::domain::ContextDomains;
use crate::error::{ConfigError, LoadError};
use crate::generator::{GeneratorConfig, DEFAULT_LOOKBACK_DAYS};
use crate::presets::standard_catalog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default corpus location
pub const DEFAULT_OUTPUT: &str = "data/realistic_cases.json";

/// Contents of a `casegen.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CasegenConfig {
    pub seed: u64,
    pub repetitions_per_family: u32,
    pub lookback_days: u32,
    pub output: PathBuf,
    /// YAML or JSON family catalog; relative paths resolve against the config file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domains: Option<DomainsConfig>,
}

impl Default for CasegenConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            repetitions_per_family: 5,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            output: PathBuf::from(DEFAULT_OUTPUT),
            catalog: None,
            domains: None,
        }
    }
}

/// Placeholder-led domain lists, as a UI would offer them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainsConfig {
    pub sites: Vec<String>,
    pub tool_groups: Vec<String>,
    pub process_steps: Vec<String>,
}

impl CasegenConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Malformed TOML or unknown keys
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Unreadable file or invalid TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::io_error(path, e))?;
        let mut config = Self::from_toml_str(&text).map_err(|source| LoadError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        if let (Some(catalog), Some(dir)) = (&config.catalog, path.parent()) {
            if catalog.is_relative() {
                config.catalog = Some(dir.join(catalog));
            }
        }
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Context domains, standard unless overridden
    ///
    /// # Errors
    /// Any placeholder or domain defect in `[domains]`
    pub fn context_domains(&self) -> Result<ContextDomains, ConfigError> {
        match &self.domains {
            Some(d) => ContextDomains::from_placeholder_led(&d.sites, &d.tool_groups, &d.process_steps),
            None => Ok(ContextDomains::standard()),
        }
    }

    /// Family catalog for `domains`, standard unless a file is configured
    ///
    /// # Errors
    /// Catalog file could not be loaded
    pub fn family_catalog(&self, domains: &ContextDomains) -> Result<FamilyCatalog, LoadError> {
        match &self.catalog {
            Some(path) => FamilyCatalog::load(path),
            None => Ok(standard_catalog(domains)),
        }
    }

    /// Domains and catalog, validated against the standard bucket table
    ///
    /// # Errors
    /// Any load or validation failure
    pub fn validated_catalog(&self) -> Result<ValidatedCatalog, LoadError> {
        let domains = self.context_domains()?;
        let catalog = self.family_catalog(&domains)?;
        Ok(catalog.validate(&BucketTable::standard(), &domains)?)
    }

    /// In-memory run settings anchored at `reference_time`
    #[must_use]
    pub fn generator_config(&self, reference_time: DateTime<Utc>) -> GeneratorConfig {
        GeneratorConfig {
            seed: self.seed,
            repetitions_per_family: self.repetitions_per_family,
            reference_time,
            lookback_days: self.lookback_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContextField;
    use chrono::TimeZone;

    #[test]
    fn empty_file_takes_defaults() {
        let config = CasegenConfig::from_toml_str("").unwrap();
        assert_eq!(config, CasegenConfig::default());
        assert_eq!(config.seed, 42);
        assert_eq!(config.repetitions_per_family, 5);
        assert_eq!(config.output, PathBuf::from("data/realistic_cases.json"));
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(CasegenConfig::from_toml_str("seeds = 3").is_err());
    }

    #[test]
    fn domains_are_placeholder_led() {
        let config = CasegenConfig::from_toml_str(
            r#"
            [domains]
            sites = ["— Select site —", "Fab-1", "Fab-2"]
            tool_groups = ["— Select tool group —", "ETCH-A"]
            process_steps = ["— Select step —", "etch"]
            "#,
        )
        .unwrap();
        let domains = config.context_domains().unwrap();
        assert_eq!(domains.sites.values(), ["Fab-1", "Fab-2"]);

        let bad = CasegenConfig::from_toml_str(
            r#"
            [domains]
            sites = ["Fab-1"]
            tool_groups = ["— x", "ETCH-A"]
            process_steps = ["— x", "etch"]
            "#,
        )
        .unwrap();
        assert_eq!(
            bad.context_domains().unwrap_err(),
            ConfigError::MissingPlaceholder {
                field: ContextField::Site
            }
        );
    }

    #[test]
    fn custom_domains_narrow_standard_catalog() {
        let config = CasegenConfig {
            domains: Some(DomainsConfig {
                sites: vec!["—".into(), "Fab-1".into()],
                tool_groups: vec!["—".into(), "ETCH-A".into(), "CMP-B".into()],
                process_steps: vec!["—".into(), "etch".into(), "polish".into()],
            }),
            ..CasegenConfig::default()
        };
        let catalog = config.validated_catalog().unwrap();
        let etch = &catalog.families()[1].family.constraints;
        assert_eq!(etch.allowed(ContextField::ToolGroup).unwrap(), ["ETCH-A"]);
    }

    #[test]
    fn relative_catalog_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("casegen.toml");
        std::fs::write(&path, "catalog = \"families.yaml\"\nseed = 7\n").unwrap();
        let config = CasegenConfig::load(&path).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.catalog, Some(dir.path().join("families.yaml")));
    }

    #[test]
    fn invalid_toml_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("casegen.toml");
        std::fs::write(&path, "seed = \"forty-two\"").unwrap();
        let err = CasegenConfig::load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Toml { .. }));
        assert!(err.to_string().contains("casegen.toml"));
    }

    #[test]
    fn generator_config_carries_settings() {
        let config = CasegenConfig {
            seed: 9,
            lookback_days: 30,
            ..CasegenConfig::default()
        };
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let run = config.generator_config(at);
        assert_eq!(run.seed, 9);
        assert_eq!(run.lookback_days, 30);
        assert_eq!(run.reference_time, at);
    }
}
