//! Standard failure archetypes
//!
//! Allow-lists are derived from the supplied domains by keyword, so a
//! custom domain narrows them naturally. A keyword with no hits leaves an
//! empty allow-list, which resolves to the full domain.

use crate::catalog::FamilyCatalog;
use crate::domain::{ContextDomains, ContextField};
use crate::family::{ChangeDirection, ConstraintSpec, PatternFamily, SignalSpec};

/// Compact signal notation: yield, variance, direction, change, measurement, lots, rework, window
#[allow(clippy::too_many_arguments)]
fn signals(
    yield_bucket: &str,
    variance_bucket: &str,
    change_dir: ChangeDirection,
    change_bucket: &str,
    measurement_bucket: &str,
    lots_bucket: &str,
    rework_bucket: &str,
    window_bucket: &str,
) -> SignalSpec {
    SignalSpec {
        yield_bucket: yield_bucket.to_string(),
        variance_bucket: variance_bucket.to_string(),
        change_dir,
        change_bucket: change_bucket.to_string(),
        measurement_bucket: measurement_bucket.to_string(),
        lots_bucket: lots_bucket.to_string(),
        rework_bucket: rework_bucket.to_string(),
        window_bucket: window_bucket.to_string(),
    }
}

fn family(
    title: &str,
    constraints: ConstraintSpec,
    signals: SignalSpec,
    matched_template: &str,
    resolution: &str,
    hints: &[&str],
) -> PatternFamily {
    PatternFamily {
        title: title.to_string(),
        constraints,
        signals,
        matched_template: matched_template.to_string(),
        resolution: resolution.to_string(),
        hints: hints.iter().map(|h| (*h).to_string()).collect(),
    }
}

/// The ten standard families, in catalog order
#[must_use]
pub fn standard_catalog(domains: &ContextDomains) -> FamilyCatalog {
    use ChangeDirection::{Neg, Pos, Zero};

    let steps = |keywords: &[&str]| -> Vec<String> {
        keywords
            .iter()
            .flat_map(|k| domains.process_steps.matching(k))
            .collect()
    };
    let tools = |keywords: &[&str]| -> Vec<String> {
        keywords
            .iter()
            .flat_map(|k| domains.tool_groups.matching(k))
            .collect()
    };
    let none = ConstraintSpec::unconstrained;

    FamilyCatalog::new(vec![
        family(
            "Yield dip coincident with metrology instability",
            none()
                .with(ContextField::ProcessStep, steps(&["metrology", "inspection"]))
                .with(ContextField::ToolGroup, tools(&["INSPECT"])),
            signals("small", "high", Zero, "small", "low", "medium", "low", "short"),
            "Matched: variance=high, measurement=low, window=short",
            "Recalibrated measurement path; confirmed yield was stable after validation.",
            &["measurement_validation", "scope_segmentation"],
        ),
        family(
            "Etch cluster excursion limited to one tool group",
            none()
                .with(ContextField::ProcessStep, steps(&["etch"]))
                .with(ContextField::ToolGroup, tools(&["ETCH"])),
            signals("medium", "medium", Neg, "medium", "high", "small", "medium", "medium"),
            "Matched: context=tool_group, yield=medium, change=neg",
            "Isolated to specific chamber; corrected config drift; monitored recovery.",
            &["scope_segmentation", "recent_changes_review"],
        ),
        family(
            "Slow drift across sites over long window",
            none(),
            signals("medium", "low", Neg, "small", "medium", "large", "medium", "long"),
            "Matched: window=long, lots=large, drift-like change",
            "Segmented by process_step; identified gradual parameter drift; escalated with evidence pack.",
            &["scope_segmentation", "escalation_packaging"],
        ),
        family(
            "Yield shift after recent recipe change",
            none(),
            signals("large", "medium", Neg, "large", "high", "medium", "high", "short"),
            "Matched: window=short, change=neg large, rework=high",
            "Rolled back change; validated with A/B lots; documented change correlation.",
            &["recent_changes_review", "escalation_packaging"],
        ),
        family(
            "Positive yield shift causing false alarms",
            none(),
            signals("none", "medium", Pos, "large", "medium", "medium", "low", "short"),
            "Matched: change=pos, window=short",
            "Validated new baseline; updated control limits to reflect improved performance.",
            &["recent_changes_review", "measurement_validation"],
        ),
        family(
            "Yield stable but rework rate exceeding limits",
            none()
                .with(ContextField::ProcessStep, steps(&["litho", "dep"]))
                .with(ContextField::ToolGroup, tools(&["LITHO", "DEP"])),
            signals("small", "low", Zero, "small", "high", "large", "high", "medium"),
            "Matched: rework=high, yield=small",
            "Identified litho overlay alignment issue; forced recalibration.",
            &["scope_segmentation", "maintenance_logs_review"],
        ),
        family(
            "Inconsistent yield across large lot population",
            none(),
            signals("medium", "high", Neg, "medium", "medium", "large", "medium", "medium"),
            "Matched: lots=large, variance=high",
            "Correlated spread to raw material batch variance; quarantined specific batch.",
            &["scope_segmentation", "recent_changes_review"],
        ),
        family(
            "High variance obscuring small yield degradation",
            none(),
            signals("small", "high", Neg, "small", "medium", "medium", "low", "medium"),
            "Matched: variance=high, yield=small, window=medium",
            "Improved segmentation granularity; reduced noise with filters; confirmed mild degradation.",
            &["scope_segmentation", "measurement_validation"],
        ),
        family(
            "Catastrophic yield drop on specific tool",
            none().with(ContextField::ProcessStep, steps(&["etch", "litho", "dep"])),
            signals("large", "low", Neg, "large", "high", "small", "low", "short"),
            "Matched: yield=large drop, window=short",
            "Emergency tool down; replaced failed RF generator; qualified tool recovery.",
            &["maintenance_logs_review", "escalation_packaging"],
        ),
        family(
            "Gradual degradation approaching control limits",
            none(),
            signals("medium", "medium", Neg, "small", "medium", "large", "low", "long"),
            "Matched: window=long, change=small neg",
            "Scheduled preventive maintenance (PM) pulled forward; replaced aging consumables.",
            &["scope_segmentation", "maintenance_logs_review"],
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CategoricalDomain;

    #[test]
    fn keyword_allow_lists_follow_domains() {
        let catalog = standard_catalog(&ContextDomains::standard());
        let metrology = &catalog.families()[0].constraints;
        assert_eq!(
            metrology.allowed(ContextField::ProcessStep).unwrap(),
            ["metrology", "inspection"]
        );
        assert_eq!(
            metrology.allowed(ContextField::ToolGroup).unwrap(),
            ["INSPECT-GROUP-1"]
        );

        let rework = &catalog.families()[5].constraints;
        assert_eq!(
            rework.allowed(ContextField::ToolGroup).unwrap(),
            ["LITHO-LINE-1", "LITHO-LINE-2", "DEP-STACK-1"]
        );
        assert!(rework.allowed(ContextField::Site).is_none());
    }

    #[test]
    fn missing_keywords_leave_empty_allow_lists() {
        let domains = ContextDomains::new(
            CategoricalDomain::new(ContextField::Site, ["Fab-1"]).unwrap(),
            CategoricalDomain::new(ContextField::ToolGroup, ["CMP-1"]).unwrap(),
            CategoricalDomain::new(ContextField::ProcessStep, ["polish"]).unwrap(),
        )
        .unwrap();
        let catalog = standard_catalog(&domains);
        let etch = &catalog.families()[1].constraints;
        assert_eq!(etch.entry(ContextField::ToolGroup), Some(&[][..]));
        assert!(etch.allowed(ContextField::ToolGroup).is_none());
    }

    #[test]
    fn titles_are_unique() {
        let catalog = standard_catalog(&ContextDomains::standard());
        let mut titles: Vec<&str> = catalog.families().iter().map(|f| f.title.as_str()).collect();
        titles.sort_unstable();
        titles.dedup();
        assert_eq!(titles.len(), catalog.len());
    }

    #[test]
    fn only_one_positive_family() {
        let catalog = standard_catalog(&ContextDomains::standard());
        let positive: Vec<&str> = catalog
            .families()
            .iter()
            .filter(|f| f.signals.change_dir == ChangeDirection::Pos)
            .map(|f| f.title.as_str())
            .collect();
        assert_eq!(positive, vec!["Positive yield shift causing false alarms"]);
    }
}
