use tracing::warn;

use crate::domain::{CommodityKind, SHARE_TOLERANCE};

use super::builder::ModelContext;
use super::linear::{Constraint, ConstraintFamily as F, LinearExpr};
use super::options::SelectionRule;
use super::sets::{SiteCommodityYear, SiteTechCommodityYear, SiteTechYear, SiteYear};

/// Production target, commodity balance, selection and share-limit constraints of one site
pub fn site_constraints(ctx: &ModelContext<'_>, site: usize, out: &mut Vec<Constraint>) {
    for t in 0..ctx.sets.years.len() {
        let production = ctx.vars.production.at(SiteYear { site, t });
        out.push(Constraint::eq(
            F::ProductionTarget,
            format!("production_target[{}]", ctx.tag(site, None, t)),
            LinearExpr::from(production),
            ctx.target(site, t),
        ));

        for kind in [CommodityKind::Fuel, CommodityKind::Feedstock] {
            commodity_mix(ctx, kind, SiteYear { site, t }, out);
        }
    }
}

fn commodity_mix(ctx: &ModelContext<'_>, kind: CommodityKind, at: SiteYear, out: &mut Vec<Constraint>) {
    let SiteYear { site, t } = at;
    let params = ctx.params.commodity(kind);
    let vars = ctx.vars.commodity(kind);
    let commodities = 0..ctx.sets.commodities(kind).len();
    let techs = 0..ctx.sets.technologies.len();
    let tag = ctx.tag(site, None, t);
    let year = ctx.year(t);
    let big_m = ctx.big_m;
    let key = |commodity| SiteCommodityYear { site, commodity, t };

    // production = Σ consumption / efficiency
    let converted: LinearExpr = commodities
        .clone()
        .map(|c| LinearExpr::term(vars.consumption.at(key(c)), 1.0 / params.efficiency[c][t]))
        .sum();
    out.push(Constraint::eq(
        F::ProductionBalance,
        format!("{kind}_balance[{tag}]"),
        LinearExpr::from(ctx.vars.production.at(at)),
        converted,
    ));

    for c in commodities.clone() {
        let ctag = ctx.commodity_tag(kind, site, c, t);
        out.push(Constraint::le(
            F::SelectionLink,
            format!("{kind}_selection_link[{ctag}]"),
            LinearExpr::from(vars.consumption.at(key(c))),
            big_m * vars.select.at(key(c)),
        ));

        // the selected commodity needs a compatible technology running
        let compatible: LinearExpr = techs
            .clone()
            .filter(|k| params.is_compatible(*k, c))
            .map(|tech| LinearExpr::from(ctx.vars.active.at(SiteTechYear { site, tech, t })))
            .sum();
        out.push(Constraint::le(
            F::Reachability,
            format!("{kind}_reachability[{ctag}]"),
            LinearExpr::from(vars.select.at(key(c))),
            compatible,
        ));

        for tech in techs.clone() {
            if !params.is_compatible(tech, c) {
                out.push(Constraint::eq(
                    F::Compatibility,
                    format!(
                        "{kind}_incompatible[{}]",
                        ctx.pair_tag(kind, site, tech, c, t)
                    ),
                    LinearExpr::from(
                        vars.active_consumption
                            .at(SiteTechCommodityYear { site, tech, commodity: c, t }),
                    ),
                    0.0,
                ));
            }
        }
    }

    if t == 0 {
        baseline_mix(ctx, kind, site, out);
        return;
    }

    for c in commodities.clone() {
        if !params.is_available(c, year) {
            out.push(Constraint::eq(
                F::CommodityIntroduction,
                format!("{kind}_introduction[{}]", ctx.commodity_tag(kind, site, c, t)),
                LinearExpr::from(vars.select.at(key(c))),
                0.0,
            ));
        }
    }

    if ctx.target(site, t) > 0.0 {
        let selected: LinearExpr = commodities
            .clone()
            .map(|c| LinearExpr::from(vars.select.at(key(c))))
            .sum();
        let label = format!("{kind}_selection_count[{tag}]");
        out.push(match ctx.selection_rule(kind) {
            SelectionRule::AtLeastOne => Constraint::ge(F::SelectionCount, label, selected, 1.0),
            SelectionRule::ExactlyOne => Constraint::eq(F::SelectionCount, label, selected, 1.0),
        });
    }

    let total: LinearExpr = commodities
        .clone()
        .map(|c| LinearExpr::from(vars.consumption.at(key(c))))
        .sum();
    for tech in techs {
        let active = ctx.vars.active.at(SiteTechYear { site, tech, t });
        for c in commodities.clone() {
            let Some(range) = params.share_range(tech, c) else {
                continue;
            };
            if range.is_unrestricted() {
                continue;
            }
            let consumption = vars.consumption.at(key(c));
            let ptag = ctx.pair_tag(kind, site, tech, c, t);
            // slack of big_m whenever `tech` is not the active technology
            let slack = LinearExpr::constant(big_m) - big_m * active;
            if range.max < 1.0 {
                out.push(Constraint::le(
                    F::ShareBounds,
                    format!("{kind}_max_share[{ptag}]"),
                    LinearExpr::from(consumption),
                    total.clone() * range.max + slack.clone(),
                ));
            }
            if range.min > 0.0 {
                out.push(Constraint::ge(
                    F::ShareBounds,
                    format!("{kind}_min_share[{ptag}]"),
                    LinearExpr::from(consumption),
                    total.clone() * range.min - slack,
                ));
            }
        }
    }
}

/// Selections fixed to the baseline mix, consumption pinned to `share × target × efficiency`
fn baseline_mix(ctx: &ModelContext<'_>, kind: CommodityKind, site: usize, out: &mut Vec<Constraint>) {
    let params = ctx.params.commodity(kind);
    let vars = ctx.vars.commodity(kind);
    let target = ctx.target(site, 0);
    let mix = ctx.params.baseline[site].mix(kind);
    let share_total: f64 = mix.iter().map(|(_, share)| share).sum();
    let exact = (share_total - 1.0).abs() <= SHARE_TOLERANCE;

    if target > 0.0 && !exact {
        warn!(
            site = %ctx.sets.sites[site],
            %kind,
            share_total,
            "baseline shares sum below 1, treating them as lower bounds"
        );
    }

    for c in 0..ctx.sets.commodities(kind).len() {
        let key = SiteCommodityYear { site, commodity: c, t: 0 };
        let ctag = ctx.commodity_tag(kind, site, c, 0);
        let share = mix.iter().find(|(ix, _)| *ix == c).map(|(_, s)| *s);
        let selected = match share {
            Some(_) if target > 0.0 => 1.0,
            _ => 0.0,
        };
        out.push(Constraint::eq(
            F::BaselineFix,
            format!("baseline_{kind}_select[{ctag}]"),
            LinearExpr::from(vars.select.at(key)),
            selected,
        ));

        let Some(share) = share.filter(|_| target > 0.0) else {
            continue;
        };
        let consumption = share * target * params.efficiency[c][0];
        let label = format!("baseline_{kind}_consumption[{ctag}]");
        let var = LinearExpr::from(vars.consumption.at(key));
        out.push(if exact {
            Constraint::eq(F::BaselineFix, label, var, consumption)
        } else {
            Constraint::ge(F::BaselineFix, label, var, consumption)
        });
    }
}
