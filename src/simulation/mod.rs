pub mod log;
pub mod params;
pub mod runner;
pub mod workspace;

pub use log::MetricLog;
pub use params::write_params;
pub use runner::run_simulator;
pub use workspace::TrialWorkspace;
