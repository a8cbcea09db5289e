pub mod commodity;
pub mod dataset;
pub mod site;
pub mod technology;
pub mod types;

pub use commodity::*;
pub use dataset::*;
pub use site::*;
pub use technology::*;
pub use types::*;
