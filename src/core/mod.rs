pub mod constraints;
pub mod space;
pub mod types;

pub use constraints::{constraint_cost, evaluate_cost, fom_cost, penalty_terms};
pub use space::ParameterSpace;
pub use types::*;
