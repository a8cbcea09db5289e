pub mod extract;
pub mod reporting;

pub use extract::*;
pub use reporting::*;
