use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::domain::PlanningData;
use crate::error::PlanningError;
use crate::model::{ModelOptions, PlanningModel};
use crate::results::{PlanReport, PlanResult};
use crate::solver::{diagnose, GoodLpSolver, InfeasibilityReport, SolveOutcome, SolverAdapter};

/// Availability check, validation, build, solve, extraction
pub struct Planner {
    solver: Box<dyn SolverAdapter>,
    options: ModelOptions,
    diagnose_infeasibility: bool,
    discount_rate: f64,
}

impl Planner {
    pub fn new(solver: Box<dyn SolverAdapter>, options: ModelOptions) -> Self {
        Self {
            solver,
            options,
            diagnose_infeasibility: true,
            discount_rate: 0.05,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            solver: Box::new(GoodLpSolver::from_config(&config.solver)),
            options: config.model.clone(),
            diagnose_infeasibility: config.diagnostics.diagnose_infeasibility,
            discount_rate: config.reporting.discount_rate,
        }
    }

    pub fn with_diagnosis(mut self, enabled: bool) -> Self {
        self.diagnose_infeasibility = enabled;
        self
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    pub fn plan(&self, data: &PlanningData) -> Result<PlanResult, PlanningError> {
        self.solve(data).map(|(_, result)| result)
    }

    pub fn plan_with_report(
        &self,
        data: &PlanningData,
    ) -> Result<(PlanResult, PlanReport), PlanningError> {
        let (model, result) = self.solve(data)?;
        let report = PlanReport::new(&model, &result, self.discount_rate);
        info!(
            present_value = report.present_value,
            discount_rate = self.discount_rate,
            "reporting computed"
        );
        Ok((result, report))
    }

    #[instrument(name = "plan", skip_all, fields(solver = %self.solver.name()))]
    fn solve(&self, data: &PlanningData) -> Result<(PlanningModel, PlanResult), PlanningError> {
        self.solver
            .check_available()
            .map_err(|reason| PlanningError::SolverUnavailable {
                solver: self.solver.name(),
                reason,
            })?;

        let model = PlanningModel::build(data, &self.options)?;
        if !model.defaulted_lookups().is_empty() {
            info!(
                defaulted = model.defaulted_lookups().len(),
                "some table lookups used defaults"
            );
        }

        match self.solver.solve(&model) {
            SolveOutcome::Optimal(assignment) => {
                let result = PlanResult::extract(&model, &assignment);
                info!(objective = result.objective, "plan extracted");
                Ok((model, result))
            }
            SolveOutcome::Infeasible => {
                warn!("model is infeasible");
                let report = if self.diagnose_infeasibility {
                    diagnose(&model, &*self.solver)
                } else {
                    InfeasibilityReport::undiagnosed()
                };
                Err(PlanningError::Infeasible(report))
            }
            SolveOutcome::Unavailable(reason) => Err(PlanningError::SolverUnavailable {
                solver: self.solver.name(),
                reason,
            }),
            SolveOutcome::NonOptimal(status) => Err(PlanningError::NoOptimalSolution(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Commodity, Site, Technology};
    use crate::solver::{Assignment, MockSolverAdapter};

    fn data() -> PlanningData {
        PlanningData {
            years: vec![2025, 2026],
            sites: vec![Site::new("S1", "T1", 2020, 1.0).with_fuel("f", 1.0).with_feedstock("m", 1.0)],
            technologies: vec![Technology::new("T1", 10, 2000)],
            fuels: vec![Commodity::new("f")],
            feedstocks: vec![Commodity::new("m")],
            ..Default::default()
        }
    }

    fn mock() -> MockSolverAdapter {
        let mut solver = MockSolverAdapter::new();
        solver.expect_name().return_const("mock".to_string());
        solver
    }

    #[test]
    fn test_unavailable_solver_fails_before_build() {
        let mut solver = mock();
        solver
            .expect_check_available()
            .returning(|| Err("no license".into()));
        solver.expect_solve().never();

        let mut invalid = data();
        invalid.sites.clear();
        let planner = Planner::new(Box::new(solver), ModelOptions::default());
        let err = planner.plan(&invalid).unwrap_err();
        assert!(matches!(
            err,
            PlanningError::SolverUnavailable { ref solver, ref reason } if solver == "mock" && reason == "no license"
        ));
    }

    #[test]
    fn test_invalid_data_never_reaches_solver() {
        let mut solver = mock();
        solver.expect_check_available().returning(|| Ok(()));
        solver.expect_solve().never();

        let mut invalid = data();
        invalid.technologies[0].lifespan = 0;
        let planner = Planner::new(Box::new(solver), ModelOptions::default());
        assert!(matches!(planner.plan(&invalid), Err(PlanningError::InvalidData(_))));
    }

    #[test]
    fn test_non_optimal_status_is_distinct_from_infeasible() {
        let mut solver = mock();
        solver.expect_check_available().returning(|| Ok(()));
        solver
            .expect_solve()
            .times(1)
            .returning(|_| SolveOutcome::NonOptimal("time limit".into()));
        let planner = Planner::new(Box::new(solver), ModelOptions::default());
        let err = planner.plan(&data()).unwrap_err();
        assert!(matches!(err, PlanningError::NoOptimalSolution(ref s) if s == "time limit"));
        assert!(!err.is_infeasible());
    }

    #[test]
    fn test_infeasible_without_diagnosis_solves_once() {
        let mut solver = mock();
        solver.expect_check_available().returning(|| Ok(()));
        solver
            .expect_solve()
            .times(1)
            .returning(|_| SolveOutcome::Infeasible);
        let planner =
            Planner::new(Box::new(solver), ModelOptions::default()).with_diagnosis(false);
        match planner.plan(&data()) {
            Err(PlanningError::Infeasible(report)) => assert!(!report.diagnosed),
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_optimal_assignment_is_extracted() {
        let mut solver = mock();
        solver.expect_check_available().returning(|| Ok(()));
        solver.expect_solve().returning(|m| {
            SolveOutcome::Optimal(Assignment {
                values: vec![0.0; m.registry.len()],
                objective: 0.0,
            })
        });
        let planner = Planner::new(Box::new(solver), ModelOptions::default());
        let result = planner.plan(&data()).unwrap();
        assert_eq!(result.sites.len(), 2);
        assert_eq!(result.schema_version, crate::results::SCHEMA_VERSION);
    }
}
