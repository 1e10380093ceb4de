mod config;
mod core;
mod error;
mod optimization;
mod simulation;

#[cfg(feature = "python")]
mod python;

pub use crate::core::*;
pub use config::EvaluatorConfig;
pub use error::{EvalError, Result};
pub use optimization::{Evaluator, Problem, TrialHistory, TrialRecord};
pub use simulation::log::{decode_latin1, MetricLog};
pub use simulation::params::{format_param_line, render_params, write_params};
pub use simulation::runner::run_simulator;
pub use simulation::workspace::{check_template, trial_dir_name, TrialWorkspace};
