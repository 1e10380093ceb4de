pub mod history;
pub mod problem;
pub mod traits;

pub use history::{TrialHistory, TrialRecord};
pub use problem::Evaluator;
pub use traits::Problem;
