use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use uuid::Uuid;

use crate::domain::{CommodityId, CommodityKind, SiteId, TechnologyId, Year};
use crate::model::{
    objective::baseline_capex_adjustment, EmissionControl, PlanningModel, SiteCommodityYear,
    SiteTechYear, SiteYear,
};
use crate::solver::Assignment;

pub const SCHEMA_VERSION: u32 = 1;

/// Values below this are reported as zero
const VALUE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SiteAction {
    Continue,
    Replace,
    Renew,
    Inactive,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub capex: f64,
    pub renewal: f64,
    pub opex: f64,
    pub fuel: f64,
    pub feedstock: f64,
    pub carbon: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.capex + self.renewal + self.opex + self.fuel + self.feedstock + self.carbon
    }

    fn accumulate(&mut self, other: &CostBreakdown) {
        self.capex += other.capex;
        self.renewal += other.renewal;
        self.opex += other.opex;
        self.fuel += other.fuel;
        self.feedstock += other.feedstock;
        self.carbon += other.carbon;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteYearResult {
    pub site: SiteId,
    pub year: Year,
    pub technology: Option<TechnologyId>,
    pub action: SiteAction,
    pub production: f64,
    pub fuel_consumption: BTreeMap<CommodityId, f64>,
    pub feedstock_consumption: BTreeMap<CommodityId, f64>,
    pub costs: CostBreakdown,
    pub emissions: f64,
    pub emissions_by_technology: BTreeMap<TechnologyId, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearTotals {
    pub year: Year,
    pub production: f64,
    pub emissions: f64,
    pub emission_limit: Option<f64>,
    pub costs: CostBreakdown,
    /// Number of sites running each technology
    pub technology_counts: BTreeMap<TechnologyId, usize>,
}

/// Versioned result of one solved plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    pub schema_version: u32,
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub emission_control: EmissionControl,
    pub baseline_year: Year,
    /// Objective as solved, including any discount weighting
    pub objective: f64,
    pub sites: Vec<SiteYearResult>,
    pub totals: Vec<YearTotals>,
}

impl PlanResult {
    pub fn extract(model: &PlanningModel, assignment: &Assignment) -> Self {
        let sets = &model.sets;
        let mut sites = Vec::with_capacity(sets.sites.len() * sets.years.len());
        for at in sets.site_years() {
            sites.push(site_year(model, assignment, at));
        }

        let totals = sets
            .years
            .iter()
            .enumerate()
            .map(|(t, year)| {
                let rows = sites.iter().filter(|r| r.year == *year);
                let mut costs = CostBreakdown::default();
                let mut technology_counts = BTreeMap::new();
                let (mut production, mut emissions) = (0.0, 0.0);
                for row in rows {
                    costs.accumulate(&row.costs);
                    production += row.production;
                    emissions += row.emissions;
                    if let Some(tech) = &row.technology {
                        *technology_counts.entry(tech.clone()).or_insert(0) += 1;
                    }
                }
                let emission_limit = match model.options.emission_control {
                    EmissionControl::Cap => model.params.emission_limit.get(&t).copied(),
                    _ => None,
                };
                YearTotals {
                    year: *year,
                    production,
                    emissions,
                    emission_limit,
                    costs,
                    technology_counts,
                }
            })
            .collect();

        Self {
            schema_version: SCHEMA_VERSION,
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            emission_control: model.options.emission_control,
            baseline_year: model.baseline_year(),
            objective: assignment.objective,
            sites,
            totals,
        }
    }

    pub fn site_year(&self, site: &str, year: Year) -> Option<&SiteYearResult> {
        self.sites
            .iter()
            .find(|r| r.site.as_str() == site && r.year == year)
    }

    pub fn totals_for(&self, year: Year) -> Option<&YearTotals> {
        self.totals.iter().find(|t| t.year == year)
    }

    /// Undiscounted sum of every cost component
    pub fn total_cost(&self) -> f64 {
        self.totals.iter().map(|t| t.costs.total()).sum()
    }

    /// Plain-text table of the per-year totals
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>6} {:>14} {:>14} {:>14}  technologies",
            "year", "production", "emissions", "cost"
        );
        for t in &self.totals {
            let techs: Vec<String> = t
                .technology_counts
                .iter()
                .map(|(tech, n)| format!("{tech}:{n}"))
                .collect();
            let _ = writeln!(
                out,
                "{:>6} {:>14.2} {:>14.2} {:>14.2}  {}",
                t.year,
                t.production,
                t.emissions,
                t.costs.total(),
                techs.join(" ")
            );
        }
        let _ = write!(out, "objective: {:.2}", self.objective);
        out
    }
}

fn clean(value: f64) -> f64 {
    if value.abs() < VALUE_TOLERANCE {
        0.0
    } else {
        value
    }
}

fn site_year(model: &PlanningModel, a: &Assignment, at: SiteYear) -> SiteYearResult {
    let SiteYear { site, t } = at;
    let sets = &model.sets;
    let v = &model.vars;
    let p = &model.params;

    let mut costs = CostBreakdown::default();
    let mut emissions_by_technology = BTreeMap::new();
    let mut technology = None;
    let mut action = SiteAction::Inactive;

    for (tech, tech_id) in sets.technologies.iter().enumerate() {
        let key = SiteTechYear { site, tech, t };
        if a.is_set(v.active.at(key)) {
            technology = Some(tech_id.clone());
            action = if a.is_set(v.replace.at(key)) {
                SiteAction::Replace
            } else if a.is_set(v.renew.at(key)) {
                SiteAction::Renew
            } else {
                SiteAction::Continue
            };
        }
        costs.capex += p.capex[tech][t] * a.value(v.replace_prod_active.at(key));
        costs.renewal += p.renewal[tech][t] * a.value(v.renew_prod_active.at(key));
        costs.opex += p.opex[tech][t] * a.value(v.prod_active.at(key));

        let emission = clean(a.value(v.emission_by_tech.at(key)));
        if emission > 0.0 {
            emissions_by_technology.insert(tech_id.clone(), emission);
        }
    }
    if t == 0 {
        costs.capex += baseline_capex_adjustment(p, sets, site);
    }

    let emissions: f64 = emissions_by_technology.values().sum();
    if model.options.emission_control == EmissionControl::CarbonPrice {
        costs.carbon = p.carbon_price[t] * emissions;
    }

    let consumption = |kind: CommodityKind| {
        let params = p.commodity(kind);
        let pool = v.commodity(kind);
        let mut used = BTreeMap::new();
        let mut cost = 0.0;
        for (commodity, id) in sets.commodities(kind).iter().enumerate() {
            let amount = clean(a.value(pool.consumption.at(SiteCommodityYear { site, commodity, t })));
            cost += params.cost[commodity][t] * amount;
            if amount > 0.0 {
                used.insert(id.clone(), amount);
            }
        }
        (used, cost)
    };
    let (fuel_consumption, fuel_cost) = consumption(CommodityKind::Fuel);
    let (feedstock_consumption, feedstock_cost) = consumption(CommodityKind::Feedstock);
    costs.fuel = fuel_cost;
    costs.feedstock = feedstock_cost;

    SiteYearResult {
        site: sets.sites[site].clone(),
        year: sets.years[t],
        technology,
        action,
        production: clean(a.value(v.production.at(at))),
        fuel_consumption,
        feedstock_consumption,
        costs,
        emissions,
        emissions_by_technology,
    }
}
