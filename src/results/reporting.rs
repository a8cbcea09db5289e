//! Read-only post-processing of a solved plan.

use serde::{Deserialize, Serialize};

use crate::domain::{CommodityKind, Year};
use crate::model::PlanningModel;

use super::PlanResult;

fn weight(rate: f64, year: Year, baseline_year: Year) -> f64 {
    (1.0 + rate).powi(-(year.saturating_sub(baseline_year) as i32))
}

/// Total cost discounted to the baseline year
pub fn present_value(result: &PlanResult, rate: f64) -> f64 {
    result
        .totals
        .iter()
        .map(|t| t.costs.total() * weight(rate, t.year, result.baseline_year))
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineYear {
    pub year: Year,
    pub emissions: f64,
    pub cost: f64,
}

/// Baseline configuration of every site held fixed over the horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineProjection {
    pub years: Vec<BaselineYear>,
}

impl BaselineProjection {
    pub fn from_model(model: &PlanningModel) -> Self {
        let p = &model.params;
        let years = model
            .sets
            .years
            .iter()
            .enumerate()
            .map(|(t, year)| {
                let (mut emissions, mut cost) = (0.0, 0.0);
                for (site, baseline) in p.baseline.iter().enumerate() {
                    let target = p.target[site][t];
                    if target <= 0.0 {
                        continue;
                    }
                    let tech = baseline.technology;
                    cost += p.opex[tech][t] * target;
                    let mut attributed = 0.0;
                    for kind in [CommodityKind::Fuel, CommodityKind::Feedstock] {
                        let params = p.commodity(kind);
                        let mix = baseline.mix(kind);
                        let share_total: f64 = mix.iter().map(|(_, s)| s).sum();
                        if share_total <= 0.0 {
                            continue;
                        }
                        for &(c, share) in mix {
                            let consumed = share / share_total * target * params.efficiency[c][t];
                            cost += params.cost[c][t] * consumed;
                            attributed += params.emission_factor[c][t] * consumed;
                        }
                    }
                    emissions += p.emission_intensity[tech][t] * attributed;
                }
                BaselineYear {
                    year: *year,
                    emissions,
                    cost,
                }
            })
            .collect();
        Self { years }
    }

    pub fn emissions_in(&self, year: Year) -> f64 {
        self.years
            .iter()
            .find(|y| y.year == year)
            .map_or(0.0, |y| y.emissions)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbatementPoint {
    pub year: Year,
    pub cumulative_discounted_cost: f64,
    pub cumulative_abatement: f64,
    /// Cost per unit of abated emission; `None` until something is abated
    pub cost_per_abatement: Option<f64>,
}

/// Cumulative discounted plan cost over cumulative emission reduction versus the frozen baseline
pub fn abatement_curve(
    result: &PlanResult,
    baseline: &BaselineProjection,
    rate: f64,
) -> Vec<AbatementPoint> {
    let (mut cost, mut abated) = (0.0, 0.0);
    result
        .totals
        .iter()
        .map(|t| {
            cost += t.costs.total() * weight(rate, t.year, result.baseline_year);
            abated += baseline.emissions_in(t.year) - t.emissions;
            AbatementPoint {
                year: t.year,
                cumulative_discounted_cost: cost,
                cumulative_abatement: abated,
                cost_per_abatement: (abated > 1e-9).then(|| cost / abated),
            }
        })
        .collect()
}

/// Reporting bundle written next to the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub discount_rate: f64,
    pub present_value: f64,
    pub baseline: BaselineProjection,
    pub abatement: Vec<AbatementPoint>,
}

impl PlanReport {
    pub fn new(model: &PlanningModel, result: &PlanResult, rate: f64) -> Self {
        let baseline = BaselineProjection::from_model(model);
        Self {
            discount_rate: rate,
            present_value: present_value(result, rate),
            abatement: abatement_curve(result, &baseline, rate),
            baseline,
        }
    }
}
