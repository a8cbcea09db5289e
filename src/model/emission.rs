use crate::domain::CommodityKind;

use super::builder::ModelContext;
use super::linear::{Constraint, ConstraintFamily as F, LinearExpr, VarId};
use super::options::EmissionControl;
use super::sets::{SiteCommodityYear, SiteTechCommodityYear, SiteTechYear, SiteYear};

/// `z = b · x` for binary `b` and `0 <= x <= m`:
///
/// ```text
/// z <= x
/// z <= m·b
/// z >= x - m·(1 - b)
/// z >= 0
/// ```
pub fn linearize(label: &str, z: VarId, b: VarId, x: VarId, m: f64) -> [Constraint; 4] {
    [
        Constraint::le(F::Linearization, format!("{label}_le_x"), LinearExpr::from(z), LinearExpr::from(x)),
        Constraint::le(F::Linearization, format!("{label}_le_mb"), LinearExpr::from(z), m * b),
        Constraint::ge(
            F::Linearization,
            format!("{label}_ge_x"),
            LinearExpr::from(z),
            LinearExpr::from(x) - m + m * b,
        ),
        Constraint::ge(F::Linearization, format!("{label}_ge_0"), LinearExpr::from(z), 0.0),
    ]
}

/// Linearized products, per-technology emission accounting and site caps
pub fn site_constraints(ctx: &ModelContext<'_>, site: usize, out: &mut Vec<Constraint>) {
    let v = ctx.vars;
    let m = ctx.big_m;

    for t in 0..ctx.sets.years.len() {
        let production = v.production.at(SiteYear { site, t });

        for tech in 0..ctx.sets.technologies.len() {
            let key = SiteTechYear { site, tech, t };
            let tag = ctx.tag(site, Some(tech), t);

            for (name, z, b) in [
                ("prod_active", v.prod_active.at(key), v.active.at(key)),
                ("replace_prod_active", v.replace_prod_active.at(key), v.replace.at(key)),
                ("renew_prod_active", v.renew_prod_active.at(key), v.renew.at(key)),
            ] {
                out.extend(linearize(&format!("{name}[{tag}]"), z, b, production, m));
            }

            let mut attributed = LinearExpr::new();
            for kind in [CommodityKind::Fuel, CommodityKind::Feedstock] {
                let params = ctx.params.commodity(kind);
                let pool = v.commodity(kind);
                for commodity in 0..ctx.sets.commodities(kind).len() {
                    let z = pool
                        .active_consumption
                        .at(SiteTechCommodityYear { site, tech, commodity, t });
                    let x = pool.consumption.at(SiteCommodityYear { site, commodity, t });
                    out.extend(linearize(
                        &format!(
                            "active_{kind}_consumption[{}]",
                            ctx.pair_tag(kind, site, tech, commodity, t)
                        ),
                        z,
                        v.active.at(key),
                        x,
                        m,
                    ));
                    attributed.add_term(z, params.emission_factor[commodity][t]);
                }
            }

            out.push(Constraint::eq(
                F::EmissionAccounting,
                format!("emission_by_tech[{tag}]"),
                LinearExpr::from(v.emission_by_tech.at(key)),
                attributed * ctx.params.emission_intensity[tech][t],
            ));
        }

        if ctx.options.emission_control == EmissionControl::Cap {
            if let Some(limit) = ctx.params.site_emission_limit.get(&SiteYear { site, t }) {
                out.push(Constraint::le(
                    F::SiteEmissionCap,
                    format!("site_emission_cap[{}]", ctx.tag(site, None, t)),
                    site_emissions(ctx, site, t),
                    *limit,
                ));
            }
        }
    }
}

/// Cross-site annual caps, generated only in cap mode and only for listed years
pub fn global_caps(ctx: &ModelContext<'_>, out: &mut Vec<Constraint>) {
    if ctx.options.emission_control != EmissionControl::Cap {
        return;
    }
    for (&t, &limit) in &ctx.params.emission_limit {
        let total: LinearExpr = (0..ctx.sets.sites.len())
            .map(|site| site_emissions(ctx, site, t))
            .sum();
        out.push(Constraint::le(
            F::EmissionCap,
            format!("emission_cap[{}]", ctx.year(t)),
            total,
            limit,
        ));
    }
}

fn site_emissions(ctx: &ModelContext<'_>, site: usize, t: usize) -> LinearExpr {
    (0..ctx.sets.technologies.len())
        .map(|tech| LinearExpr::from(ctx.vars.emission_by_tech.at(SiteTechYear { site, tech, t })))
        .sum()
}
