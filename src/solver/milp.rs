//! `good_lp` backend.
//!
//! microlp (pure Rust) is always compiled in; HiGHS needs the `highs` feature.

use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::config::SolverConfig;
use crate::model::{LinearExpr, PlanningModel, Sense, VarKind};

use super::{Assignment, SolveOutcome, SolverAdapter, SolverBackend};

#[derive(Debug, Clone)]
pub struct GoodLpSolver {
    backend: SolverBackend,
    #[cfg_attr(not(feature = "highs"), allow(dead_code))]
    time_limit_seconds: Option<f64>,
    #[cfg_attr(not(feature = "highs"), allow(dead_code))]
    verbose: bool,
}

impl Default for GoodLpSolver {
    fn default() -> Self {
        Self::new(SolverBackend::Microlp)
    }
}

impl GoodLpSolver {
    pub fn new(backend: SolverBackend) -> Self {
        Self {
            backend,
            time_limit_seconds: None,
            verbose: false,
        }
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            backend: config.backend,
            time_limit_seconds: config.time_limit_seconds,
            verbose: config.verbose,
        }
    }

    pub fn backend(&self) -> SolverBackend {
        self.backend
    }
}

/// Problem translated into `good_lp` terms
struct Translated {
    problem: ProblemVariables,
    columns: Vec<Variable>,
    objective: Expression,
    rows: Vec<good_lp::Constraint>,
}

fn translate(model: &PlanningModel) -> Result<Translated, String> {
    let mut problem = ProblemVariables::new();
    let columns: Vec<Variable> = model
        .registry
        .iter()
        .map(|(_, def)| match def.kind {
            VarKind::Binary => problem.add(variable().binary().name(def.name.clone())),
            VarKind::NonNegative => problem.add(variable().min(0.0).name(def.name.clone())),
        })
        .collect();

    let expression = |expr: &LinearExpr| -> Result<Expression, String> {
        let mut out = Expression::from(expr.constant_part());
        for (var, coeff) in expr.terms() {
            let column = columns
                .get(var.0)
                .ok_or_else(|| format!("undeclared variable {}", var.0))?;
            out += coeff * *column;
        }
        Ok(out)
    };

    let objective = expression(&model.objective)?;
    let mut rows = Vec::with_capacity(model.constraints.len());
    for c in &model.constraints {
        let lhs = expression(&c.lhs)?;
        rows.push(match c.sense {
            Sense::Le => constraint::leq(lhs, c.rhs),
            Sense::Ge => constraint::geq(lhs, c.rhs),
            Sense::Eq => constraint::eq(lhs, c.rhs),
        });
    }

    Ok(Translated {
        problem,
        columns,
        objective,
        rows,
    })
}

fn run<M>(mut solver: M, rows: Vec<good_lp::Constraint>, columns: &[Variable], model: &PlanningModel) -> SolveOutcome
where
    M: SolverModel<Error = ResolutionError>,
{
    for row in rows {
        solver.add_constraint(row);
    }
    match solver.solve() {
        Ok(solution) => {
            let values: Vec<f64> = columns.iter().map(|c| solution.value(*c)).collect();
            let objective = model.objective.evaluate(&values);
            SolveOutcome::Optimal(Assignment { values, objective })
        }
        Err(ResolutionError::Infeasible) => SolveOutcome::Infeasible,
        Err(e) => SolveOutcome::NonOptimal(e.to_string()),
    }
}

impl SolverAdapter for GoodLpSolver {
    fn name(&self) -> String {
        self.backend.to_string()
    }

    fn check_available(&self) -> Result<(), String> {
        match self.backend {
            SolverBackend::Microlp => Ok(()),
            SolverBackend::Highs if cfg!(feature = "highs") => Ok(()),
            SolverBackend::Highs => Err("built without the `highs` feature".to_string()),
        }
    }

    #[instrument(name = "solve", skip_all, fields(backend = %self.backend))]
    fn solve(&self, model: &PlanningModel) -> SolveOutcome {
        if let Err(reason) = self.check_available() {
            return SolveOutcome::Unavailable(reason);
        }
        let Translated {
            problem,
            columns,
            objective,
            rows,
        } = match translate(model) {
            Ok(t) => t,
            Err(reason) => return SolveOutcome::NonOptimal(reason),
        };

        let started = Instant::now();
        let outcome = match self.backend {
            SolverBackend::Microlp => {
                let solver = problem
                    .minimise(objective)
                    .using(good_lp::solvers::microlp::microlp);
                run(solver, rows, &columns, model)
            }
            #[cfg(feature = "highs")]
            SolverBackend::Highs => {
                let mut solver = problem
                    .minimise(objective)
                    .using(good_lp::solvers::highs::highs);
                if let Some(limit) = self.time_limit_seconds {
                    solver = solver.set_time_limit(limit);
                }
                solver = solver.set_verbose(self.verbose);
                run(solver, rows, &columns, model)
            }
            #[cfg(not(feature = "highs"))]
            SolverBackend::Highs => {
                SolveOutcome::Unavailable("built without the `highs` feature".to_string())
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            SolveOutcome::Optimal(a) => info!(elapsed_ms, objective = a.objective, "solved to optimality"),
            SolveOutcome::Infeasible => debug!(elapsed_ms, "solver reports infeasible"),
            SolveOutcome::Unavailable(reason) | SolveOutcome::NonOptimal(reason) => {
                debug!(elapsed_ms, reason = %reason, "solve ended without a solution")
            }
        }
        outcome
    }
}
