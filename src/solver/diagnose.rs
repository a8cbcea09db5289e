use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, instrument};

use crate::model::{ConstraintFamily, PlanningModel};

use super::{SolveOutcome, SolverAdapter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyConflict {
    pub family: ConstraintFamily,
    pub constraints: usize,
}

/// Constraint families that cannot all hold together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfeasibilityReport {
    /// Irreducible: dropping any one of these makes the rest feasible
    pub conflicting: Vec<FamilyConflict>,
    pub diagnosed: bool,
    pub solves: usize,
}

impl InfeasibilityReport {
    /// Report for a run where diagnosis was switched off
    pub fn undiagnosed() -> Self {
        Self::default()
    }

    pub fn contains(&self, family: ConstraintFamily) -> bool {
        self.conflicting.iter().any(|c| c.family == family)
    }
}

impl fmt::Display for InfeasibilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.diagnosed {
            return f.write_str("no diagnosis run");
        }
        if self.conflicting.is_empty() {
            return f.write_str("no conflicting constraint families isolated");
        }
        let families: Vec<String> = self
            .conflicting
            .iter()
            .map(|c| format!("{} ({} constraints)", c.family, c.constraints))
            .collect();
        write!(f, "conflicting constraint families: {}", families.join(", "))
    }
}

/// Deletion filter over constraint families.
///
/// Each family is dropped in turn; if the model stays infeasible without it the
/// family is discarded for good, otherwise it is part of the conflict.
#[instrument(skip_all, fields(solver = %solver.name()))]
pub fn diagnose(model: &PlanningModel, solver: &dyn SolverAdapter) -> InfeasibilityReport {
    let counts = model.family_counts();
    let mut removed = BTreeSet::new();
    let mut needed = Vec::new();
    let mut solves = 0;

    for family in model.families() {
        removed.insert(family);
        solves += 1;
        match solver.solve(&model.without_families(&removed)) {
            SolveOutcome::Infeasible => {
                debug!(%family, "still infeasible without family, discarding");
            }
            _ => {
                removed.remove(&family);
                needed.push(FamilyConflict {
                    family,
                    constraints: counts.get(&family).copied().unwrap_or_default(),
                });
            }
        }
    }

    let report = InfeasibilityReport {
        conflicting: needed,
        diagnosed: true,
        solves,
    };
    info!(%report, solves, "infeasibility diagnosed");
    report
}
