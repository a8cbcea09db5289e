pub mod diagnose;
pub mod milp;

pub use diagnose::*;
pub use milp::*;

use serde::{Deserialize, Serialize};

use crate::model::{PlanningModel, VarId};

/// Solved variable values, indexed by `VarId`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub values: Vec<f64>,
    pub objective: f64,
}

impl Assignment {
    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.0).copied().unwrap_or(0.0)
    }

    /// Binary read with a 0.5 threshold
    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var) > 0.5
    }
}

/// Every way a solve can end
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Optimal(Assignment),
    Infeasible,
    Unavailable(String),
    NonOptimal(String),
}

/// The MILP backends the crate can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SolverBackend {
    #[default]
    Microlp,
    Highs,
}

/// Pluggable MILP solver
#[cfg_attr(test, mockall::automock)]
pub trait SolverAdapter: Send + Sync {
    fn name(&self) -> String;

    /// Checked before any model is built
    fn check_available(&self) -> Result<(), String>;

    fn solve(&self, model: &PlanningModel) -> SolveOutcome;
}
