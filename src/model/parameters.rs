use serde::Serialize;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use tracing::warn;

use crate::domain::{
    Commodity, CommodityKind, LifecycleAction, MixShare, PlanningData, Year, YearTable,
};
use crate::error::PlanningError;

use super::options::{EmissionControl, ModelOptions};
use super::sets::{IndexSets, SiteYear};

/// Default for costs and emission factors absent from a table
pub const DEFAULT_COST: f64 = 0.0;
/// Default for efficiencies and emission-intensity multipliers absent from a table
pub const DEFAULT_MULTIPLIER: f64 = 1.0;

/// A table lookup that fell back to its default
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultedLookup {
    pub table: &'static str,
    pub entity: String,
    pub year: Year,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShareRange {
    pub min: f64,
    pub max: f64,
}

impl ShareRange {
    pub fn is_unrestricted(&self) -> bool {
        self.min <= 0.0 && self.max >= 1.0
    }
}

/// Dense per-kind commodity parameters, `[commodity][t]`
#[derive(Debug, Clone, PartialEq)]
pub struct CommodityParams {
    pub cost: Vec<Vec<f64>>,
    pub efficiency: Vec<Vec<f64>>,
    pub emission_factor: Vec<Vec<f64>>,
    pub introduction_year: Vec<Option<Year>>,
    /// `[tech]`: `None` when the technology has no rows, else `[commodity]` share ranges
    pub compatibility: Vec<Option<Vec<Option<ShareRange>>>>,
}

impl CommodityParams {
    pub fn len(&self) -> usize {
        self.cost.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cost.is_empty()
    }

    pub fn is_compatible(&self, tech: usize, commodity: usize) -> bool {
        match &self.compatibility[tech] {
            None => true,
            Some(row) => row[commodity].is_some(),
        }
    }

    /// Declared share range of a tabled pair
    pub fn share_range(&self, tech: usize, commodity: usize) -> Option<ShareRange> {
        self.compatibility[tech]
            .as_ref()
            .and_then(|row| row[commodity])
    }

    pub fn is_available(&self, commodity: usize, year: Year) -> bool {
        self.introduction_year[commodity].map_or(true, |intro| year >= intro)
    }

    pub fn max_efficiency(&self) -> f64 {
        self.efficiency
            .iter()
            .flatten()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Baseline configuration of one site, by index
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineConfig {
    pub technology: usize,
    pub introduced_year: Year,
    pub fuels: Vec<(usize, f64)>,
    pub feedstocks: Vec<(usize, f64)>,
}

impl BaselineConfig {
    pub fn mix(&self, kind: CommodityKind) -> &[(usize, f64)] {
        match kind {
            CommodityKind::Fuel => &self.fuels,
            CommodityKind::Feedstock => &self.feedstocks,
        }
    }
}

/// Numeric parameters of the model, resolved against [`IndexSets`]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    /// `[site][t]`
    pub target: Vec<Vec<f64>>,
    pub baseline: Vec<BaselineConfig>,
    pub lifespan: Vec<u32>,
    pub tech_introduction: Vec<Year>,
    /// Actions each technology may take; an unrestricted technology lists all of them
    pub allowed_actions: Vec<Vec<LifecycleAction>>,
    /// `[tech][t]`
    pub emission_intensity: Vec<Vec<f64>>,
    pub capex: Vec<Vec<f64>>,
    pub opex: Vec<Vec<f64>>,
    pub renewal: Vec<Vec<f64>>,
    pub fuel: CommodityParams,
    pub feedstock: CommodityParams,
    /// Global cap by `t`; years without an entry are uncapped
    pub emission_limit: BTreeMap<usize, f64>,
    pub site_emission_limit: BTreeMap<SiteYear, f64>,
    /// `[t]`
    pub carbon_price: Vec<f64>,
    pub defaulted: Vec<DefaultedLookup>,
}

impl Parameters {
    pub fn from_data(
        data: &PlanningData,
        sets: &IndexSets,
        options: &ModelOptions,
    ) -> Result<Self, PlanningError> {
        let mut lookup = Lookup {
            years: &sets.years,
            defaulted: Vec::new(),
        };

        let target = data
            .sites
            .iter()
            .map(|site| sets.years.iter().map(|y| site.target(*y)).collect())
            .collect();

        let mut baseline = Vec::with_capacity(data.sites.len());
        for site in &data.sites {
            let technology = sets.technology_index(&site.technology).ok_or_else(|| {
                PlanningError::InvalidData(vec![format!(
                    "site {}: unknown baseline technology {}",
                    site.id, site.technology
                )])
            })?;
            baseline.push(BaselineConfig {
                technology,
                introduced_year: site.introduced_year,
                fuels: resolve_mix(sets, CommodityKind::Fuel, site.mix(CommodityKind::Fuel))?,
                feedstocks: resolve_mix(sets, CommodityKind::Feedstock, site.mix(CommodityKind::Feedstock))?,
            });
        }

        let techs = &data.technologies;
        let emission_intensity = techs
            .iter()
            .map(|t| lookup.series("emission_intensity", t.id.as_str(), &t.emission_intensity, DEFAULT_MULTIPLIER))
            .collect();
        let capex = techs
            .iter()
            .map(|t| lookup.series("capex", t.id.as_str(), &t.capex, DEFAULT_COST))
            .collect();
        let opex = techs
            .iter()
            .map(|t| lookup.series("opex", t.id.as_str(), &t.opex, DEFAULT_COST))
            .collect();
        let renewal = techs
            .iter()
            .map(|t| lookup.series("renewal", t.id.as_str(), &t.renewal, DEFAULT_COST))
            .collect();

        let fuel = commodity_params(&mut lookup, data, sets, CommodityKind::Fuel);
        let feedstock = commodity_params(&mut lookup, data, sets, CommodityKind::Feedstock);

        let emission_limit = sets
            .years
            .iter()
            .enumerate()
            .filter_map(|(t, y)| data.emission_limits.get(*y).map(|limit| (t, limit)))
            .collect();

        let mut site_emission_limit = BTreeMap::new();
        for (site_id, table) in &data.site_emission_limits {
            let Some(site) = sets.site_index(site_id) else {
                continue;
            };
            for (t, year) in sets.years.iter().enumerate() {
                if let Some(limit) = table.get(*year) {
                    site_emission_limit.insert(SiteYear { site, t }, limit);
                }
            }
        }

        let carbon_price = if options.emission_control == EmissionControl::CarbonPrice {
            lookup.series("carbon_price", "global", &data.carbon_price, DEFAULT_COST)
        } else {
            sets.years
                .iter()
                .map(|y| data.carbon_price.get(*y).unwrap_or(DEFAULT_COST))
                .collect()
        };

        let params = Self {
            target,
            baseline,
            lifespan: techs.iter().map(|t| t.lifespan).collect(),
            tech_introduction: techs.iter().map(|t| t.introduction_year).collect(),
            allowed_actions: techs
                .iter()
                .map(|t| LifecycleAction::iter().filter(|a| t.allows(*a)).collect())
                .collect(),
            emission_intensity,
            capex,
            opex,
            renewal,
            fuel,
            feedstock,
            emission_limit,
            site_emission_limit,
            carbon_price,
            defaulted: lookup.defaulted,
        };
        params.warn_defaults();
        Ok(params)
    }

    pub fn commodity(&self, kind: CommodityKind) -> &CommodityParams {
        match kind {
            CommodityKind::Fuel => &self.fuel,
            CommodityKind::Feedstock => &self.feedstock,
        }
    }

    pub fn allows(&self, tech: usize, action: LifecycleAction) -> bool {
        self.allowed_actions[tech].contains(&action)
    }

    pub fn max_target(&self) -> f64 {
        self.target
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }

    /// `max(target) × max(1, max efficiency)`, floored at 1
    pub fn big_m(&self, options: &ModelOptions) -> f64 {
        if let Some(m) = options.big_m {
            return m;
        }
        let max_eff = self
            .fuel
            .max_efficiency()
            .max(self.feedstock.max_efficiency())
            .max(1.0);
        (self.max_target() * max_eff).max(1.0)
    }

    fn warn_defaults(&self) {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for d in &self.defaulted {
            *counts.entry(d.table).or_default() += 1;
        }
        for (table, count) in counts {
            let fallback = self
                .defaulted
                .iter()
                .find(|d| d.table == table)
                .map(|d| d.value)
                .unwrap_or_default();
            warn!(table, count, fallback, "missing table entries replaced by default");
        }
    }
}

struct Lookup<'a> {
    years: &'a [Year],
    defaulted: Vec<DefaultedLookup>,
}

impl Lookup<'_> {
    fn series(&mut self, table: &'static str, entity: &str, values: &YearTable, default: f64) -> Vec<f64> {
        self.years
            .iter()
            .map(|year| match values.get(*year) {
                Some(v) => v,
                None => {
                    self.defaulted.push(DefaultedLookup {
                        table,
                        entity: entity.to_string(),
                        year: *year,
                        value: default,
                    });
                    default
                }
            })
            .collect()
    }
}

fn commodity_params(
    lookup: &mut Lookup<'_>,
    data: &PlanningData,
    sets: &IndexSets,
    kind: CommodityKind,
) -> CommodityParams {
    let (cost_table, eff_table, ef_table) = match kind {
        CommodityKind::Fuel => ("fuel_cost", "fuel_efficiency", "fuel_emission_factor"),
        CommodityKind::Feedstock => (
            "feedstock_cost",
            "feedstock_efficiency",
            "feedstock_emission_factor",
        ),
    };
    let commodities: &[Commodity] = data.commodities(kind);

    let mut compatibility = Vec::with_capacity(sets.technologies.len());
    for tech in &sets.technologies {
        let rows: Vec<_> = data
            .compatibility(kind)
            .iter()
            .filter(|p| &p.technology == tech)
            .collect();
        if rows.is_empty() {
            if !commodities.is_empty() {
                warn!(technology = %tech, %kind, "no compatibility rows, every {kind} allowed");
            }
            compatibility.push(None);
            continue;
        }
        let row = sets
            .commodities(kind)
            .iter()
            .map(|c| {
                rows.iter().find(|p| &p.commodity == c).map(|p| ShareRange {
                    min: p.min_share,
                    max: p.max_share,
                })
            })
            .collect();
        compatibility.push(Some(row));
    }

    CommodityParams {
        cost: commodities
            .iter()
            .map(|c| lookup.series(cost_table, c.id.as_str(), &c.cost, DEFAULT_COST))
            .collect(),
        efficiency: commodities
            .iter()
            .map(|c| lookup.series(eff_table, c.id.as_str(), &c.efficiency, DEFAULT_MULTIPLIER))
            .collect(),
        emission_factor: commodities
            .iter()
            .map(|c| lookup.series(ef_table, c.id.as_str(), &c.emission_factor, DEFAULT_COST))
            .collect(),
        introduction_year: commodities.iter().map(|c| c.introduction_year).collect(),
        compatibility,
    }
}

fn resolve_mix(
    sets: &IndexSets,
    kind: CommodityKind,
    mix: &[MixShare],
) -> Result<Vec<(usize, f64)>, PlanningError> {
    mix.iter()
        .map(|m| {
            sets.commodity_index(kind, &m.commodity)
                .map(|ix| (ix, m.share))
                .ok_or_else(|| {
                    PlanningError::InvalidData(vec![format!(
                        "unknown baseline {kind} {}",
                        m.commodity
                    )])
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Compatibility, Site, Technology};
    use proptest::prelude::*;

    fn data() -> PlanningData {
        PlanningData {
            years: vec![2025, 2026],
            sites: vec![Site::new("S1", "BF", 2010, 500.0)
                .with_fuel("coal", 1.0)
                .with_feedstock("ore", 1.0)],
            technologies: vec![
                Technology::new("BF", 20, 1990).with_opex(YearTable::new().with(2025, 12.0)),
                Technology::new("EAF", 25, 2020),
            ],
            fuels: vec![
                Commodity::new("coal").with_efficiency(YearTable::flat(2025..=2026, 0.9)),
                Commodity::new("power"),
            ],
            feedstocks: vec![Commodity::new("ore")],
            technology_fuels: vec![
                Compatibility::any("BF", "coal"),
                Compatibility::any("EAF", "coal"),
                Compatibility::new("EAF", "power", 0.2, 0.6),
            ],
            ..Default::default()
        }
    }

    fn params() -> Parameters {
        let data = data();
        let sets = IndexSets::from_data(&data);
        Parameters::from_data(&data, &sets, &ModelOptions::default()).unwrap()
    }

    #[test]
    fn test_missing_lookups_use_documented_defaults() {
        let p = params();
        assert_eq!(p.opex[0], vec![12.0, DEFAULT_COST]);
        assert_eq!(p.emission_intensity[1], vec![DEFAULT_MULTIPLIER; 2]);
        assert_eq!(p.fuel.efficiency[1], vec![DEFAULT_MULTIPLIER; 2]);
        assert_eq!(p.fuel.emission_factor[0], vec![DEFAULT_COST; 2]);
        assert!(p
            .defaulted
            .iter()
            .any(|d| d.table == "opex" && d.entity == "BF" && d.year == 2026));
        assert!(!p.defaulted.iter().any(|d| d.table == "carbon_price"));
    }

    #[test]
    fn test_compatibility_resolution() {
        let p = params();
        // BF is tabled for coal only
        assert!(p.fuel.is_compatible(0, 0));
        assert!(!p.fuel.is_compatible(0, 1));
        assert_eq!(p.fuel.share_range(1, 1), Some(ShareRange { min: 0.2, max: 0.6 }));
        // no feedstock rows at all
        assert!(p.feedstock.is_compatible(1, 0));
    }

    #[test]
    fn test_allowed_actions_resolve_per_technology() {
        let mut data = data();
        data.technologies[1] = Technology::new("EAF", 25, 2020)
            .with_allowed_actions(vec![LifecycleAction::Continue, LifecycleAction::Replace]);
        let sets = IndexSets::from_data(&data);
        let p = Parameters::from_data(&data, &sets, &ModelOptions::default()).unwrap();

        assert_eq!(p.allowed_actions[0].len(), LifecycleAction::iter().count());
        assert!(p.allows(0, LifecycleAction::Renew));
        assert!(p.allows(1, LifecycleAction::Replace));
        assert!(!p.allows(1, LifecycleAction::Renew));
    }

    #[test]
    fn test_big_m_covers_production_and_consumption() {
        let p = params();
        assert_eq!(p.big_m(&ModelOptions::default()), 500.0);
        let overridden = ModelOptions {
            big_m: Some(1e4),
            ..Default::default()
        };
        assert_eq!(p.big_m(&overridden), 1e4);
    }

    proptest! {
        #[test]
        fn prop_lookup_never_fails(year in 2000u32..2100, value in 0.0f64..1e6) {
            let table = YearTable::new().with(2050, value);
            let years = [year];
            let mut lookup = Lookup { years: &years, defaulted: Vec::new() };
            let series = lookup.series("capex", "T", &table, DEFAULT_COST);
            if year == 2050 {
                prop_assert_eq!(series[0], value);
                prop_assert!(lookup.defaulted.is_empty());
            } else {
                prop_assert_eq!(series[0], DEFAULT_COST);
                prop_assert_eq!(lookup.defaulted.len(), 1);
            }
        }
    }
}
