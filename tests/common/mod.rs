#![allow(dead_code)]
//! Small planning datasets shared by the integration tests.

use pathway_planner::domain::{Commodity, Compatibility, PlanningData, Site, Technology, YearTable};
use pathway_planner::model::ModelOptions;
use pathway_planner::solver::GoodLpSolver;
use pathway_planner::Planner;

pub const TOLERANCE: f64 = 1e-6;

pub fn planner(options: ModelOptions) -> Planner {
    Planner::new(Box::new(GoodLpSolver::default()), options)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "expected {expected}, got {actual}"
    );
}

/// T1 installed 2020 with a 10 year life, T2 (cheaper to run) with a 15 year life.
/// Over 2025..=2035 T1 renews in 2030 and T2 can only take over in 2035.
pub fn lifecycle() -> PlanningData {
    let years = 2025..=2035;
    PlanningData {
        years: years.clone().collect(),
        sites: vec![Site::new("S1", "T1", 2020, 1000.0)
            .with_fuel("f", 1.0)
            .with_feedstock("m", 1.0)],
        technologies: vec![
            Technology::new("T1", 10, 2000)
                .with_opex(YearTable::flat(years.clone(), 10.0))
                .with_renewal(YearTable::flat(years.clone(), 2.0)),
            Technology::new("T2", 15, 2025)
                .with_opex(YearTable::flat(years.clone(), 5.0))
                .with_capex(YearTable::flat(years, 1.0)),
        ],
        fuels: vec![Commodity::new("f")],
        feedstocks: vec![Commodity::new("m")],
        ..Default::default()
    }
}

/// One site burning coal and gas, coal capped at 60 % of the fuel mix
pub fn share_bounds() -> PlanningData {
    let years = [2025, 2026];
    PlanningData {
        years: years.to_vec(),
        sites: vec![Site::new("S1", "T1", 2020, 100.0)
            .with_fuel("coal", 0.6)
            .with_fuel("gas", 0.4)
            .with_feedstock("ore", 1.0)],
        technologies: vec![Technology::new("T1", 20, 2000)],
        fuels: vec![
            Commodity::new("coal").with_cost(YearTable::flat(years, 1.0)),
            Commodity::new("gas").with_cost(YearTable::flat(years, 5.0)),
        ],
        feedstocks: vec![Commodity::new("ore")],
        technology_fuels: vec![
            Compatibility::new("T1", "coal", 0.0, 0.6),
            Compatibility::new("T1", "gas", 0.0, 1.0),
        ],
        ..Default::default()
    }
}

/// Same fuels, but the limits belong to T1 (coal <= 0.6, gas <= 0.4) while the site
/// keeps running the unrestricted T2 on coal only
pub fn share_bounds_inactive() -> PlanningData {
    let mut data = share_bounds();
    data.sites = vec![Site::new("S1", "T2", 2020, 100.0)
        .with_fuel("coal", 1.0)
        .with_feedstock("ore", 1.0)];
    data.technologies.push(Technology::new("T2", 20, 2000));
    data.technology_fuels = vec![
        Compatibility::new("T1", "coal", 0.0, 0.6),
        Compatibility::new("T1", "gas", 0.0, 0.4),
    ];
    data
}

/// Coal (cheap, dirty) against gas (dearer, half the emission factor).
/// The baseline runs on coal only and the 2026 emission limit is `limit`.
pub fn fuel_switch(limit: f64) -> PlanningData {
    let years = [2025, 2026];
    PlanningData {
        years: years.to_vec(),
        sites: vec![Site::new("S1", "T1", 2020, 100.0)
            .with_fuel("coal", 1.0)
            .with_feedstock("ore", 1.0)],
        technologies: vec![Technology::new("T1", 20, 2000)],
        fuels: vec![
            Commodity::new("coal")
                .with_cost(YearTable::flat(years, 1.0))
                .with_emission_factor(YearTable::flat(years, 1.0)),
            Commodity::new("gas")
                .with_cost(YearTable::flat(years, 3.0))
                .with_emission_factor(YearTable::flat(years, 0.5)),
        ],
        feedstocks: vec![Commodity::new("ore")],
        emission_limits: YearTable::new().with(2026, limit),
        carbon_price: YearTable::flat(years, 10.0),
        ..Default::default()
    }
}

/// Production pauses in 2026 and resumes in 2027
pub fn restart() -> PlanningData {
    PlanningData {
        years: (2025..=2028).collect(),
        sites: vec![Site::new("S1", "T1", 2020, 50.0)
            .with_production_in(2026, 0.0)
            .with_fuel("f", 1.0)
            .with_feedstock("m", 1.0)],
        technologies: vec![Technology::new("T1", 10, 2000), Technology::new("T2", 10, 2000)],
        fuels: vec![Commodity::new("f")],
        feedstocks: vec![Commodity::new("m")],
        ..Default::default()
    }
}

/// Two sites with a non-trivial fuel efficiency
pub fn two_sites() -> PlanningData {
    let years = [2025, 2026, 2027];
    PlanningData {
        years: years.to_vec(),
        sites: vec![
            Site::new("north", "T1", 2018, 80.0)
                .with_fuel("gas", 1.0)
                .with_feedstock("ore", 0.5)
                .with_feedstock("scrap", 0.5),
            Site::new("south", "T1", 2022, 40.0)
                .with_fuel("gas", 1.0)
                .with_feedstock("ore", 1.0),
        ],
        technologies: vec![Technology::new("T1", 25, 2000)
            .with_opex(YearTable::flat(years, 2.0))],
        fuels: vec![Commodity::new("gas")
            .with_cost(YearTable::flat(years, 1.5))
            .with_efficiency(YearTable::flat(years, 2.5))],
        feedstocks: vec![
            Commodity::new("ore")
                .with_cost(YearTable::flat(years, 1.0))
                .with_efficiency(YearTable::flat(years, 1.6)),
            Commodity::new("scrap")
                .with_cost(YearTable::flat(years, 2.0))
                .with_efficiency(YearTable::flat(years, 1.1)),
        ],
        ..Default::default()
    }
}
