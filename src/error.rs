use thiserror::Error;

use crate::solver::InfeasibilityReport;

/// Errors surfaced by loading, building and solving a plan
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("invalid planning data:\n  - {}", .0.join("\n  - "))]
    InvalidData(Vec<String>),

    #[error("solver {solver} unavailable: {reason}")]
    SolverUnavailable { solver: String, reason: String },

    #[error("model is infeasible: {0}")]
    Infeasible(InfeasibilityReport),

    #[error("solver finished without an optimal solution: {0}")]
    NoOptimalSolution(String),

    #[error("unsupported data format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PlanningError {
    pub fn is_infeasible(&self) -> bool {
        matches!(self, PlanningError::Infeasible(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_data_lists_every_issue() {
        let err = PlanningError::InvalidData(vec!["first".into(), "second".into()]);
        let text = err.to_string();
        assert!(text.contains("- first"));
        assert!(text.contains("- second"));
    }
}
