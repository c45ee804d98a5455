//! Context resolver
//!
//! Picks one site, tool group and process step per record. Each field is
//! drawn independently and uniformly, from the family's allow-list when it
//! has a non-empty one, otherwise from the full domain.

use crate::domain::{ContextDomains, ContextField};
use crate::family::ConstraintSpec;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Resolved categorical context of one record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Context {
    pub site: String,
    pub tool_group: String,
    pub process_step: String,
}

impl Context {
    /// Value for a field
    #[must_use]
    pub fn get(&self, field: ContextField) -> &str {
        match field {
            ContextField::Site => &self.site,
            ContextField::ToolGroup => &self.tool_group,
            ContextField::ProcessStep => &self.process_step,
        }
    }
}

/// Draw a context under `constraints`
///
/// Fields are drawn in site, tool group, process step order.
pub fn resolve_context<R: Rng + ?Sized>(
    constraints: &ConstraintSpec,
    domains: &ContextDomains,
    rng: &mut R,
) -> Context {
    let mut pick = |field: ContextField| {
        let pool = constraints
            .allowed(field)
            .unwrap_or_else(|| domains.get(field).values());
        pool[rng.gen_range(0..pool.len())].clone()
    };
    Context {
        site: pick(ContextField::Site),
        tool_group: pick(ContextField::ToolGroup),
        process_step: pick(ContextField::ProcessStep),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn unconstrained_covers_full_domain() {
        let domains = ContextDomains::standard();
        let mut rng = StdRng::seed_from_u64(11);
        let mut sites = HashSet::new();
        for _ in 0..400 {
            let ctx = resolve_context(&ConstraintSpec::unconstrained(), &domains, &mut rng);
            assert!(domains.sites.contains(&ctx.site));
            assert!(domains.tool_groups.contains(&ctx.tool_group));
            assert!(domains.process_steps.contains(&ctx.process_step));
            sites.insert(ctx.site);
        }
        assert_eq!(sites.len(), domains.sites.len());
    }

    #[test]
    fn allow_list_restricts_field() {
        let domains = ContextDomains::standard();
        let constraints = ConstraintSpec::unconstrained()
            .with(ContextField::ToolGroup, domains.tool_groups.matching("ETCH"))
            .with(ContextField::ProcessStep, vec!["etch".into()]);
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..300 {
            let ctx = resolve_context(&constraints, &domains, &mut rng);
            assert!(ctx.tool_group.starts_with("ETCH-"));
            assert_eq!(ctx.process_step, "etch");
        }
    }

    #[test]
    fn empty_allow_list_falls_back_to_full_domain() {
        // "site: []" reads as "forbid all" but is treated as "no restriction"
        let domains = ContextDomains::standard();
        let constraints = ConstraintSpec::unconstrained().with(ContextField::Site, Vec::new());
        let mut rng = StdRng::seed_from_u64(13);
        let sites: HashSet<String> = (0..400)
            .map(|_| resolve_context(&constraints, &domains, &mut rng).site)
            .collect();
        assert_eq!(sites.len(), domains.sites.len());
    }

    #[test]
    fn accessor_matches_fields() {
        let ctx = Context {
            site: "Plant-A".into(),
            tool_group: "DEP-STACK-1".into(),
            process_step: "deposition".into(),
        };
        assert_eq!(ctx.get(ContextField::Site), "Plant-A");
        assert_eq!(ctx.get(ContextField::ToolGroup), "DEP-STACK-1");
        assert_eq!(ctx.get(ContextField::ProcessStep), "deposition");
    }
}
