//! End-to-end plans solved with the bundled microlp backend.

mod common;

use common::{assert_close, planner};
use pathway_planner::model::{ConstraintFamily, EmissionControl, ModelOptions, PlanningModel};
use pathway_planner::results::{present_value, SiteAction};
use pathway_planner::PlanningError;

#[test]
fn test_technology_changes_only_on_lifespan_boundaries() {
    let result = planner(ModelOptions::default())
        .plan(&common::lifecycle())
        .unwrap();

    for year in 2026..=2029 {
        let row = result.site_year("S1", year).unwrap();
        assert_eq!(row.technology.as_ref().map(|t| t.as_str()), Some("T1"));
        assert_eq!(row.action, SiteAction::Continue, "{year}");
    }
    // end of T1's first life, T2 still mid-life
    let renewal = result.site_year("S1", 2030).unwrap();
    assert_eq!(renewal.action, SiteAction::Renew);
    assert_eq!(renewal.technology.as_ref().map(|t| t.as_str()), Some("T1"));
    assert_close(renewal.costs.renewal, 2.0 * 1000.0);

    for year in 2031..=2034 {
        assert_eq!(result.site_year("S1", year).unwrap().action, SiteAction::Continue);
    }
    let switch = result.site_year("S1", 2035).unwrap();
    assert_eq!(switch.action, SiteAction::Replace);
    assert_eq!(switch.technology.as_ref().map(|t| t.as_str()), Some("T2"));
    assert_close(switch.costs.capex, 1000.0);
    assert_close(switch.costs.opex, 5.0 * 1000.0);
}

#[test]
fn test_share_limits_bind_the_cheap_fuel() {
    let result = planner(ModelOptions::default())
        .plan(&common::share_bounds())
        .unwrap();

    let row = result.site_year("S1", 2026).unwrap();
    assert_close(row.fuel_consumption["coal"], 60.0);
    assert_close(row.fuel_consumption["gas"], 40.0);
    // 60 × 1 + 40 × 5 in both years
    assert_close(result.objective, 520.0);
}

#[test]
fn test_share_limits_of_inactive_technology_are_slack() {
    let data = common::share_bounds_inactive();
    let model = PlanningModel::build(&data, &ModelOptions::default()).unwrap();
    assert!(model
        .constraints
        .iter()
        .any(|c| c.label == "fuel_max_share[S1,T1,coal,2026]"));

    let result = planner(ModelOptions::default()).plan(&data).unwrap();
    let row = result.site_year("S1", 2026).unwrap();
    assert_eq!(row.technology.as_ref().map(|t| t.as_str()), Some("T2"));
    assert_close(row.fuel_consumption["coal"], 100.0);
    assert!(row.fuel_consumption.get("gas").copied().unwrap_or(0.0) < common::TOLERANCE);
    assert_close(result.objective, 200.0);
}

#[test]
fn test_emission_cap_forces_fuel_switch() {
    let result = planner(ModelOptions::default())
        .plan(&common::fuel_switch(70.0))
        .unwrap();

    let totals = result.totals_for(2026).unwrap();
    assert_eq!(totals.emission_limit, Some(70.0));
    assert!(totals.emissions <= 70.0 + common::TOLERANCE);

    let row = result.site_year("S1", 2026).unwrap();
    assert_close(row.fuel_consumption["coal"], 40.0);
    assert_close(row.fuel_consumption["gas"], 60.0);
    assert_close(row.emissions, 70.0);
    // baseline 100 on coal, then 40 + 3 × 60
    assert_close(result.objective, 320.0);
}

#[test]
fn test_unreachable_cap_is_diagnosed() {
    let err = planner(ModelOptions::default())
        .plan(&common::fuel_switch(10.0))
        .unwrap_err();

    assert!(err.is_infeasible());
    match err {
        PlanningError::Infeasible(report) => {
            assert!(report.diagnosed);
            assert!(report.contains(ConstraintFamily::EmissionCap));
            assert!(report.solves > 0);
        }
        other => panic!("expected infeasible, got {other:?}"),
    }
}

#[test]
fn test_carbon_price_replaces_the_cap() {
    let options = ModelOptions::default().with_emission_control(EmissionControl::CarbonPrice);
    // the limit of 10 would be infeasible under a cap
    let result = planner(options).plan(&common::fuel_switch(10.0)).unwrap();

    let row = result.site_year("S1", 2026).unwrap();
    assert!(row.fuel_consumption.get("coal").copied().unwrap_or(0.0) < common::TOLERANCE);
    assert_close(row.fuel_consumption["gas"], 100.0);
    assert_close(row.costs.carbon, 10.0 * 50.0);
    assert_eq!(result.totals_for(2026).unwrap().emission_limit, None);
    // 2025: 100 + 10 × 100, 2026: 300 + 10 × 50
    assert_close(result.objective, 1900.0);
    assert_close(result.total_cost(), 1900.0);
}

#[test]
fn test_unconstrained_stays_on_the_cheapest_fuel() {
    let options = ModelOptions::default().with_emission_control(EmissionControl::Unconstrained);
    let result = planner(options).plan(&common::fuel_switch(10.0)).unwrap();

    let row = result.site_year("S1", 2026).unwrap();
    assert_close(row.fuel_consumption["coal"], 100.0);
    assert_close(row.emissions, 100.0);
    assert_eq!(row.costs.carbon, 0.0);
}

#[test]
fn test_restart_after_idle_year_is_a_replacement() {
    let result = planner(ModelOptions::default())
        .plan(&common::restart())
        .unwrap();

    let idle = result.site_year("S1", 2026).unwrap();
    assert_eq!(idle.action, SiteAction::Inactive);
    assert_eq!(idle.technology, None);
    assert_eq!(idle.production, 0.0);
    assert!(idle.fuel_consumption.is_empty());

    let restart = result.site_year("S1", 2027).unwrap();
    assert_eq!(restart.action, SiteAction::Replace);
    assert_eq!(restart.technology.as_ref().map(|t| t.as_str()), Some("T1"));
    assert_eq!(result.site_year("S1", 2028).unwrap().action, SiteAction::Continue);
}

#[test]
fn test_production_balances_through_efficiency() {
    let data = common::two_sites();
    let result = planner(ModelOptions::default()).plan(&data).unwrap();

    for row in &result.sites {
        let fuel: f64 = row.fuel_consumption.values().sum();
        assert_close(fuel / 2.5, row.production);

        let feedstock: f64 = row
            .feedstock_consumption
            .iter()
            .map(|(id, amount)| match id.as_str() {
                "ore" => amount / 1.6,
                _ => amount / 1.1,
            })
            .sum();
        assert_close(feedstock, row.production);
    }

    // baseline pinned to share × target × efficiency
    let north = result.site_year("north", 2025).unwrap();
    assert_close(north.feedstock_consumption["ore"], 0.5 * 80.0 * 1.6);
    assert_close(north.feedstock_consumption["scrap"], 0.5 * 80.0 * 1.1);
    // afterwards the cheaper feedstock per unit of steel wins
    let later = result.site_year("north", 2026).unwrap();
    assert!(later.feedstock_consumption.get("scrap").copied().unwrap_or(0.0) < common::TOLERANCE);
    assert_close(later.feedstock_consumption["ore"], 80.0 * 1.6);
}

#[test]
fn test_totals_add_up_per_year() {
    let result = planner(ModelOptions::default())
        .plan(&common::two_sites())
        .unwrap();

    for totals in &result.totals {
        let rows: Vec<_> = result.sites.iter().filter(|r| r.year == totals.year).collect();
        assert_eq!(rows.len(), 2);
        assert_close(totals.production, rows.iter().map(|r| r.production).sum());
        assert_close(
            totals.costs.total(),
            rows.iter().map(|r| r.costs.total()).sum(),
        );
        assert_eq!(totals.technology_counts["T1"], 2);
    }
    assert_close(result.objective, result.total_cost());
}

#[test]
fn test_replanning_is_deterministic() {
    let data = common::two_sites();
    let planner = planner(ModelOptions::default());
    let first = planner.plan(&data).unwrap();
    let second = planner.plan(&data).unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.sites, second.sites);
    assert_eq!(first.totals, second.totals);
    assert_eq!(first.objective, second.objective);
}

#[test]
fn test_report_discounts_plan_cost() {
    let (result, report) = planner(ModelOptions::default())
        .plan_with_report(&common::two_sites())
        .unwrap();
    assert_close(present_value(&result, 0.0), result.total_cost());
    assert_close(report.present_value, present_value(&result, report.discount_rate));
    assert!(report.present_value < result.total_cost());
    assert_eq!(report.abatement.len(), result.totals.len());
    // nothing here emits, so nothing is abated
    assert!(report.abatement.iter().all(|p| p.cost_per_abatement.is_none()));
}
