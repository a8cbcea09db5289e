pub mod config;
pub mod domain;
pub mod error;
pub mod model;
pub mod planner;
pub mod results;
pub mod solver;
pub mod telemetry;

pub use error::PlanningError;
pub use planner::Planner;
