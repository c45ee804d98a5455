//! Corpus audit
//!
//! Re-checks the generator's guarantees on a corpus that already exists,
//! typically one read back from disk. Findings are collected, not raised:
//! an audit reports every defect it sees in one pass.

use crate::bucket::{BucketTable, SignalField};
use crate::catalog::ValidatedCatalog;
use crate::domain::ContextField;
use crate::family::ChangeDirection;
use crate::metric::{display_keys, MetricKey, MetricSchema};
use crate::record::{CaseId, CaseRecord};
use crate::sampler::MAX_YIELD_PCT;
use serde::Serialize;
use std::fmt;

/// Slack on `yield + change <= 100` for two-decimal rounding
pub const HEADROOM_EPSILON: f64 = 0.01;

/// Slack on bucket bounds for rounded draws
pub const BUCKET_EPSILON: f64 = 1e-9;

/// What an audit finding is about
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingKind {
    MissingMetrics { missing: Vec<MetricKey> },
    IdentifierGap { expected: String },
    TitleMismatch { title: String },
    HeadroomExceeded { yield_pct: f64, change_magnitude: f64 },
    WrongSign { direction: ChangeDirection, change_magnitude: f64 },
    OutsideBucket { field: SignalField, bucket: String, value: f64, min: f64, max: f64 },
    UnknownBucket { field: SignalField, bucket: String },
    OutsideAllowList { field: ContextField, value: String },
    UnknownFamily,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMetrics { missing } => write!(f, "missing metrics {}", display_keys(missing)),
            Self::IdentifierGap { expected } => write!(f, "expected identifier {expected}"),
            Self::TitleMismatch { title } => write!(f, "title '{title}' differs from family"),
            Self::HeadroomExceeded { yield_pct, change_magnitude } => write!(
                f,
                "positive shift {change_magnitude} on yield {yield_pct} exceeds 100%"
            ),
            Self::WrongSign { direction, change_magnitude } => {
                write!(f, "change {change_magnitude} has wrong sign for direction {direction}")
            }
            Self::OutsideBucket { field, bucket, value, min, max } => {
                write!(f, "{value} outside {field} '{bucket}' [{min}, {max}]")
            }
            Self::UnknownBucket { field, bucket } => write!(f, "unknown bucket '{bucket}' for {field}"),
            Self::OutsideAllowList { field, value } => {
                write!(f, "{field} '{value}' not in the family allow-list")
            }
            Self::UnknownFamily => f.write_str("family not in catalog"),
        }
    }
}

/// A single defect in one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditFinding {
    /// Position of the record in the corpus
    pub index: usize,
    pub case_id: String,
    #[serde(flatten)]
    pub kind: FindingKind,
}

/// Outcome of an audit
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditReport {
    pub records: usize,
    /// Records whose positive shift was drawn below its bucket
    pub downgraded_shifts: usize,
    pub findings: Vec<AuditFinding>,
}

impl AuditReport {
    /// No findings
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();
        report.push_str("=== Corpus Audit Report ===\n\n");
        report.push_str(&format!("Records: {}\n", self.records));
        report.push_str(&format!("Downgraded Positive Shifts: {}\n", self.downgraded_shifts));
        report.push_str(&format!("Findings: {}\n", self.findings.len()));
        if !self.findings.is_empty() {
            report.push_str("\n=== Findings ===\n");
            for finding in &self.findings {
                report.push_str(&format!(
                    "#{} {}: {}\n",
                    finding.index, finding.case_id, finding.kind
                ));
            }
        }
        report
    }
}

/// Audit `cases` against the catalog they were generated from
#[must_use]
pub fn audit_cases(cases: &[CaseRecord], catalog: &ValidatedCatalog) -> AuditReport {
    let mut findings = Vec::new();
    let mut downgraded_shifts = 0;
    let mut expected_id = CaseId::FIRST;

    for (index, case) in cases.iter().enumerate() {
        let mut flag = |kind: FindingKind| {
            findings.push(AuditFinding {
                index,
                case_id: case.case_id.to_string(),
                kind,
            });
        };

        if case.case_id != expected_id {
            flag(FindingKind::IdentifierGap {
                expected: expected_id.to_string(),
            });
        }
        expected_id = expected_id.next();

        if case.title != case.family {
            flag(FindingKind::TitleMismatch {
                title: case.title.clone(),
            });
        }
        if let Err(missing) = MetricSchema::check(&case.metrics) {
            flag(FindingKind::MissingMetrics { missing });
        }

        let downgraded = check_metrics(case, catalog.table(), &mut flag);
        downgraded_shifts += usize::from(downgraded);

        match catalog.find(&case.family) {
            Some(resolved) => {
                for field in ContextField::ALL {
                    let Some(allowed) = resolved.family.constraints.allowed(field) else {
                        continue;
                    };
                    let value = case.context.get(field);
                    if !allowed.iter().any(|v| v == value) {
                        flag(FindingKind::OutsideAllowList {
                            field,
                            value: value.to_string(),
                        });
                    }
                }
            }
            None => flag(FindingKind::UnknownFamily),
        }
    }

    let report = AuditReport {
        records: cases.len(),
        downgraded_shifts,
        findings,
    };
    tracing::debug!(
        records = report.records,
        findings = report.findings.len(),
        "corpus audited"
    );
    report
}

/// Sign, headroom and bucket checks; returns whether the shift was a downgrade
fn check_metrics(case: &CaseRecord, table: &BucketTable, flag: &mut impl FnMut(FindingKind)) -> bool {
    let metric = |key: MetricKey| case.metrics.get(&key).map(|v| v.as_f64());
    let direction = case.signals.change_dir;
    let mut downgraded = false;

    if let Some(change) = metric(MetricKey::ChangeMagnitude) {
        let sign_ok = match direction {
            ChangeDirection::Pos => change >= 0.0,
            ChangeDirection::Neg => change <= 0.0,
            ChangeDirection::Zero => change == 0.0,
        };
        if !sign_ok {
            flag(FindingKind::WrongSign {
                direction,
                change_magnitude: change,
            });
        }
        if direction == ChangeDirection::Pos {
            if let Some(yield_pct) = metric(MetricKey::YieldPct) {
                if yield_pct + change > MAX_YIELD_PCT + HEADROOM_EPSILON {
                    flag(FindingKind::HeadroomExceeded {
                        yield_pct,
                        change_magnitude: change,
                    });
                }
                if let Ok(bucket) = table.lookup(SignalField::Change, &case.signals.change_bucket) {
                    downgraded = bucket.min > MAX_YIELD_PCT - yield_pct;
                }
            }
        }
    }

    for field in SignalField::ALL {
        let Some(value) = metric(field.metric()) else {
            continue;
        };
        let skip = match field {
            SignalField::Change => direction == ChangeDirection::Zero || downgraded,
            _ => false,
        };
        if skip {
            continue;
        }
        let bucket = case.signals.bucket(field);
        match table.lookup(field, bucket) {
            Ok(interval) => {
                let value = if field == SignalField::Change { value.abs() } else { value };
                if !interval.contains(value, BUCKET_EPSILON) {
                    flag(FindingKind::OutsideBucket {
                        field,
                        bucket: bucket.to_string(),
                        value,
                        min: interval.min,
                        max: interval.max,
                    });
                }
            }
            Err(_) => flag(FindingKind::UnknownBucket {
                field,
                bucket: bucket.to_string(),
            }),
        }
    }
    downgraded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContextDomains;
    use crate::generator::{generate, GeneratorConfig};
    use crate::metric::MetricValue;
    use crate::presets::standard_catalog;

    fn corpus() -> (ValidatedCatalog, Vec<CaseRecord>) {
        let domains = ContextDomains::standard();
        let catalog = standard_catalog(&domains)
            .validate(&BucketTable::standard(), &domains)
            .unwrap();
        let cases = generate(&catalog, GeneratorConfig::new(42, 5)).unwrap();
        (catalog, cases)
    }

    #[test]
    fn generated_corpus_is_clean() {
        let (catalog, cases) = corpus();
        let report = audit_cases(&cases, &catalog);
        assert!(report.is_clean(), "{}", report.generate_text());
        assert_eq!(report.records, 50);
        assert_eq!(report.downgraded_shifts, 5);
    }

    #[test]
    fn detects_identifier_gap() {
        let (catalog, mut cases) = corpus();
        cases.remove(3);
        let report = audit_cases(&cases, &catalog);
        assert_eq!(report.findings.len(), cases.len() - 3);
        assert_eq!(
            report.findings[0].kind,
            FindingKind::IdentifierGap {
                expected: "C-004".into()
            }
        );
    }

    #[test]
    fn detects_wrong_sign_and_missing_metric() {
        let (catalog, mut cases) = corpus();
        // family #2 is negative-direction
        cases[5]
            .metrics
            .insert(MetricKey::ChangeMagnitude, MetricValue::Measure(5.0));
        cases[6].metrics.remove(&MetricKey::ReworkRate);
        let report = audit_cases(&cases, &catalog);
        assert!(report.findings.iter().any(|f| f.index == 5
            && matches!(f.kind, FindingKind::WrongSign { direction: ChangeDirection::Neg, .. })));
        assert!(report.findings.iter().any(|f| f.index == 6
            && f.kind
                == FindingKind::MissingMetrics {
                    missing: vec![MetricKey::ReworkRate]
                }));
        assert!(report
            .generate_text()
            .contains("C-007: missing metrics rework_rate"));
    }

    #[test]
    fn detects_allow_list_breach() {
        let (catalog, mut cases) = corpus();
        cases[5].context.tool_group = "LITHO-LINE-1".into();
        let report = audit_cases(&cases, &catalog);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(
            report.findings[0].kind,
            FindingKind::OutsideAllowList {
                field: ContextField::ToolGroup,
                value: "LITHO-LINE-1".into()
            }
        );
    }

    #[test]
    fn detects_headroom_breach() {
        let (catalog, mut cases) = corpus();
        let positive = &mut cases[20];
        positive
            .metrics
            .insert(MetricKey::YieldPct, MetricValue::Measure(95.0));
        positive
            .metrics
            .insert(MetricKey::ChangeMagnitude, MetricValue::Measure(6.0));
        let report = audit_cases(&cases, &catalog);
        assert!(report
            .findings
            .iter()
            .any(|f| f.index == 20 && matches!(f.kind, FindingKind::HeadroomExceeded { .. })));
    }

    #[test]
    fn detects_out_of_bucket_value() {
        let (catalog, mut cases) = corpus();
        cases[0]
            .metrics
            .insert(MetricKey::AffectedLotCount, MetricValue::Count(99));
        let report = audit_cases(&cases, &catalog);
        assert_eq!(report.findings.len(), 1);
        assert!(matches!(
            report.findings[0].kind,
            FindingKind::OutsideBucket {
                field: SignalField::Lots,
                ..
            }
        ));
    }

    #[test]
    fn unknown_family_reported() {
        let (catalog, mut cases) = corpus();
        cases[0].family = "Retired family".into();
        cases[0].title = "Retired family".into();
        let report = audit_cases(&cases, &catalog);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].kind, FindingKind::UnknownFamily);
        assert!(report.generate_text().contains("family not in catalog"));
    }
}
