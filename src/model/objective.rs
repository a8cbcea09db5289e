use crate::domain::CommodityKind;

use super::builder::ModelContext;
use super::linear::LinearExpr;
use super::options::{EmissionControl, ModelOptions};
use super::parameters::Parameters;
use super::sets::{IndexSets, SiteCommodityYear, SiteTechYear};

/// `(1 + r)^-(year - baseline)`, or 1 without a discount rate
pub fn discount_weight(options: &ModelOptions, sets: &IndexSets, t: usize) -> f64 {
    match options.discount_rate {
        Some(rate) => {
            let elapsed = sets.years[t].saturating_sub(sets.baseline_year());
            (1.0 + rate).powi(-(elapsed as i32))
        }
        None => 1.0,
    }
}

/// Remaining-life share of the baseline asset's CAPEX, charged in the baseline year
pub fn baseline_capex_adjustment(params: &Parameters, sets: &IndexSets, site: usize) -> f64 {
    let target = params.target[site][0];
    if target <= 0.0 {
        return 0.0;
    }
    let baseline = &params.baseline[site];
    let lifespan = params.lifespan[baseline.technology].max(1);
    let age = sets.baseline_year().saturating_sub(baseline.introduced_year);
    // an asset at the end of a cycle in the baseline year has nothing left to write off
    let remaining = match age % lifespan {
        0 if age > 0 => 0,
        elapsed => lifespan - elapsed,
    };
    params.capex[baseline.technology][0] * f64::from(remaining) / f64::from(lifespan) * target
}

/// Total system cost over the horizon
pub fn build(ctx: &ModelContext<'_>) -> LinearExpr {
    let v = ctx.vars;
    let p = ctx.params;
    let mut objective = LinearExpr::new();

    for site in 0..ctx.sets.sites.len() {
        objective.add_constant(baseline_capex_adjustment(p, ctx.sets, site));

        for t in 0..ctx.sets.years.len() {
            let w = discount_weight(ctx.options, ctx.sets, t);

            for tech in 0..ctx.sets.technologies.len() {
                let key = SiteTechYear { site, tech, t };
                objective.add_term(v.replace_prod_active.at(key), w * p.capex[tech][t]);
                objective.add_term(v.renew_prod_active.at(key), w * p.renewal[tech][t]);
                objective.add_term(v.prod_active.at(key), w * p.opex[tech][t]);
                if ctx.options.emission_control == EmissionControl::CarbonPrice {
                    objective.add_term(v.emission_by_tech.at(key), w * p.carbon_price[t]);
                }
            }

            for kind in [CommodityKind::Fuel, CommodityKind::Feedstock] {
                let costs = &p.commodity(kind).cost;
                let pool = v.commodity(kind);
                for (commodity, cost) in costs.iter().enumerate() {
                    objective.add_term(
                        pool.consumption.at(SiteCommodityYear { site, commodity, t }),
                        w * cost[t],
                    );
                }
            }
        }
    }

    objective
}
