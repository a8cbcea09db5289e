//! Continue/replace/renew state machine per (site, technology).
//!
//! Baseline year: the baseline technology continues and everything else is off.
//! Later years: at most one action per technology, exactly one active technology
//! while the site produces, actions only on lifespan boundaries, and any newly
//! activated technology is recorded as a replacement.

use crate::domain::LifecycleAction;

use super::builder::ModelContext;
use super::linear::{Constraint, ConstraintFamily as F, LinearExpr};
use super::sets::SiteTechYear;

pub fn site_constraints(ctx: &ModelContext<'_>, site: usize, out: &mut Vec<Constraint>) {
    let techs = 0..ctx.sets.technologies.len();
    let v = ctx.vars;

    for t in 0..ctx.sets.years.len() {
        for tech in techs.clone() {
            let key = SiteTechYear { site, tech, t };
            let tag = ctx.tag(site, Some(tech), t);
            let (c, r, n, a) = (
                v.continue_.at(key),
                v.replace.at(key),
                v.renew.at(key),
                v.active.at(key),
            );
            out.push(Constraint::le(
                F::Exclusivity,
                format!("exclusivity[{tag}]"),
                LinearExpr::from(c) + r + n,
                1.0,
            ));
            out.push(Constraint::eq(
                F::ActiveDefinition,
                format!("active_definition[{tag}]"),
                LinearExpr::from(a),
                LinearExpr::from(c) + r + n,
            ));
        }

        let active_sum: LinearExpr = techs
            .clone()
            .map(|tech| LinearExpr::from(v.active.at(SiteTechYear { site, tech, t })))
            .sum();
        let operating = if ctx.target(site, t) > 0.0 { 1.0 } else { 0.0 };
        out.push(Constraint::eq(
            F::SingleActive,
            format!("single_active[{}]", ctx.tag(site, None, t)),
            active_sum,
            operating,
        ));

        if t == 0 {
            baseline_year(ctx, site, out);
        } else {
            for tech in techs.clone() {
                transition_year(ctx, SiteTechYear { site, tech, t }, out);
            }
        }
    }

    if let Some(max_renew) = ctx.options.max_renew {
        for tech in techs {
            let renewals: LinearExpr = (1..ctx.sets.years.len())
                .map(|t| LinearExpr::from(v.renew.at(SiteTechYear { site, tech, t })))
                .sum();
            out.push(Constraint::le(
                F::RenewCap,
                format!("renew_cap[{},{}]", ctx.sets.sites[site], ctx.sets.technologies[tech]),
                renewals,
                f64::from(max_renew),
            ));
        }
    }
}

fn baseline_year(ctx: &ModelContext<'_>, site: usize, out: &mut Vec<Constraint>) {
    let v = ctx.vars;
    let producing = ctx.target(site, 0) > 0.0;
    let baseline_tech = ctx.params.baseline[site].technology;

    for tech in 0..ctx.sets.technologies.len() {
        let key = SiteTechYear { site, tech, t: 0 };
        let tag = ctx.tag(site, Some(tech), 0);
        let continuing = if producing && tech == baseline_tech { 1.0 } else { 0.0 };
        for (name, var, value) in [
            ("continue", v.continue_.at(key), continuing),
            ("replace", v.replace.at(key), 0.0),
            ("renew", v.renew.at(key), 0.0),
            ("activation_change", v.activation_change.at(key), 0.0),
        ] {
            out.push(Constraint::eq(
                F::BaselineFix,
                format!("baseline_{name}[{tag}]"),
                LinearExpr::from(var),
                value,
            ));
        }
    }
}

fn transition_year(ctx: &ModelContext<'_>, key: SiteTechYear, out: &mut Vec<Constraint>) {
    let v = ctx.vars;
    let SiteTechYear { site, tech, t } = key;
    let prev = SiteTechYear { t: t - 1, ..key };
    let tag = ctx.tag(site, Some(tech), t);
    let year = ctx.year(t);

    let (c, r, n, a, ac) = (
        v.continue_.at(key),
        v.replace.at(key),
        v.renew.at(key),
        v.active.at(key),
        v.activation_change.at(key),
    );
    let a_prev = v.active.at(prev);

    // ac == 1 exactly when the technology switches on this year
    out.push(Constraint::ge(
        F::ActivationChange,
        format!("activation_change_lower[{tag}]"),
        LinearExpr::from(ac),
        LinearExpr::from(a) - a_prev,
    ));
    out.push(Constraint::le(
        F::ActivationChange,
        format!("activation_change_active[{tag}]"),
        LinearExpr::from(ac),
        LinearExpr::from(a),
    ));
    out.push(Constraint::le(
        F::ActivationChange,
        format!("activation_change_previous[{tag}]"),
        LinearExpr::from(ac),
        LinearExpr::constant(1.0) - a_prev,
    ));
    out.push(Constraint::ge(
        F::ActivationChange,
        format!("activation_forces_replace[{tag}]"),
        LinearExpr::from(r),
        LinearExpr::from(ac),
    ));

    if ctx.is_late_restart(site, t) {
        let flags = if tech == ctx.params.baseline[site].technology {
            vec![("continue", c), ("renew", n)]
        } else {
            vec![("continue", c), ("replace", r), ("renew", n)]
        };
        for (name, var) in flags {
            out.push(Constraint::eq(
                F::LateRestart,
                format!("late_restart_{name}[{tag}]"),
                LinearExpr::from(var),
                0.0,
            ));
        }
        return;
    }

    if year < ctx.params.tech_introduction[tech] {
        out.push(Constraint::eq(
            F::IntroductionGating,
            format!("introduction[{tag}]"),
            LinearExpr::from(c) + r + n,
            0.0,
        ));
    }

    let age = i64::from(year) - i64::from(ctx.params.baseline[site].introduced_year);
    let lifespan = i64::from(ctx.params.lifespan[tech].max(1));
    if age >= 0 {
        if age % lifespan != 0 {
            out.push(Constraint::eq(
                F::LifespanGating,
                format!("mid_life[{tag}]"),
                LinearExpr::from(r) + n,
                0.0,
            ));
        } else {
            out.push(Constraint::eq(
                F::LifespanGating,
                format!("end_of_life[{tag}]"),
                LinearExpr::from(c),
                0.0,
            ));
        }
    }

    for (action, var) in [
        (LifecycleAction::Continue, c),
        (LifecycleAction::Replace, r),
        (LifecycleAction::Renew, n),
    ] {
        if !ctx.params.allows(tech, action) {
            out.push(Constraint::eq(
                F::AllowedActions,
                format!("disallowed_{action}[{tag}]"),
                LinearExpr::from(var),
                0.0,
            ));
        }
    }

    if !ctx.options.allow_replace_same_technology {
        out.push(Constraint::le(
            F::NoSelfReplace,
            format!("no_self_replace[{tag}]"),
            LinearExpr::from(r) + a_prev,
            1.0,
        ));
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{Commodity, PlanningData, Site, Technology};
    use crate::model::{ConstraintFamily, ModelOptions, PlanningModel};

    fn model(options: ModelOptions) -> PlanningModel {
        let data = PlanningData {
            years: (2025..=2031).collect(),
            sites: vec![Site::new("S1", "T1", 2020, 100.0)
                .with_production_in(2027, 0.0)
                .with_fuel("f", 1.0)
                .with_feedstock("m", 1.0)],
            technologies: vec![Technology::new("T1", 5, 2000), Technology::new("T2", 10, 2029)],
            fuels: vec![Commodity::new("f")],
            feedstocks: vec![Commodity::new("m")],
            ..Default::default()
        };
        PlanningModel::build(&data, &options).unwrap()
    }

    fn labels(model: &PlanningModel, family: ConstraintFamily) -> Vec<String> {
        model
            .constraints
            .iter()
            .filter(|c| c.family == family)
            .map(|c| c.label.clone())
            .collect()
    }

    #[test]
    fn test_lifespan_boundaries() {
        let m = model(ModelOptions::default());
        let gating = labels(&m, ConstraintFamily::LifespanGating);
        // introduced 2020, lifespan 5: 2030 is a boundary, 2028 restarts production
        assert!(gating.contains(&"end_of_life[S1,T1,2030]".to_string()));
        assert!(gating.contains(&"mid_life[S1,T1,2029]".to_string()));
        assert!(!gating.iter().any(|l| l.ends_with("2028]")));
    }

    #[test]
    fn test_late_restart_only_allows_baseline_replace() {
        let m = model(ModelOptions::default());
        let restart = labels(&m, ConstraintFamily::LateRestart);
        assert!(restart.contains(&"late_restart_continue[S1,T1,2028]".to_string()));
        assert!(restart.contains(&"late_restart_replace[S1,T2,2028]".to_string()));
        assert!(!restart.contains(&"late_restart_replace[S1,T1,2028]".to_string()));
    }

    #[test]
    fn test_introduction_gating() {
        let m = model(ModelOptions::default());
        let intro = labels(&m, ConstraintFamily::IntroductionGating);
        assert!(intro.contains(&"introduction[S1,T2,2026]".to_string()));
        assert!(!intro.iter().any(|l| l.contains("T1")));
        assert!(!intro.contains(&"introduction[S1,T2,2029]".to_string()));
    }

    #[test]
    fn test_optional_policies() {
        let relaxed = ModelOptions {
            allow_replace_same_technology: true,
            max_renew: None,
            ..Default::default()
        };
        let m = model(relaxed);
        assert!(labels(&m, ConstraintFamily::NoSelfReplace).is_empty());
        assert!(labels(&m, ConstraintFamily::RenewCap).is_empty());

        let m = model(ModelOptions::default());
        assert_eq!(labels(&m, ConstraintFamily::RenewCap).len(), 2);
    }
}
