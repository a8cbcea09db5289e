pub mod builder;
pub mod emission;
pub mod lifecycle;
pub mod linear;
pub mod objective;
pub mod options;
pub mod parameters;
pub mod production;
pub mod sets;
pub mod variables;

pub use builder::*;
pub use linear::*;
pub use options::*;
pub use parameters::*;
pub use sets::*;
pub use variables::*;
