use crate::core::{
    DesignVariable, ExitPolicy, FigureOfMeritSpec, ParamFormat, ParameterSpace, PerformanceSpec,
    PerformanceTable,
};
use crate::error::{EvalError, Result};
use crate::simulation::workspace::check_template;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_name() -> String {
    "PLLVCO".to_string()
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("circuit")
}

fn default_work_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_run_file() -> PathBuf {
    PathBuf::from("run_sim.sh")
}

fn default_result_file() -> PathBuf {
    PathBuf::from("pll_vco.log")
}

fn default_true() -> bool {
    true
}

/// Construction-time configuration of an evaluator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
    #[serde(default = "default_work_root")]
    pub work_root: PathBuf,
    #[serde(default)]
    pub mode: ParamFormat,
    /// Relative to the trial workspace.
    #[serde(default = "default_run_file")]
    pub run_file: PathBuf,
    /// Relative to the trial workspace.
    #[serde(default = "default_result_file")]
    pub result_file: PathBuf,
    #[serde(default = "default_true")]
    pub delete_trials: bool,
    #[serde(default)]
    pub start_index: u64,
    #[serde(default)]
    pub exit_policy: ExitPolicy,
    #[serde(default)]
    pub history_file: Option<PathBuf>,
    pub design_variables: Vec<DesignVariable>,
    pub performance: PerformanceTable,
    pub figure_of_merit: FigureOfMeritSpec,
}

impl EvaluatorConfig {
    /// Load a JSON config. Relative paths inside it are taken relative to
    /// the file's own directory.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            EvalError::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let mut config: Self = serde_json::from_str(&text).map_err(|e| {
            EvalError::config(format!("Invalid config {}: {}", path.display(), e))
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.template_dir = base.join(&config.template_dir);
        config.work_root = base.join(&config.work_root);
        config.history_file = config.history_file.map(|h| base.join(h));

        tracing::debug!("Loaded evaluator config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check everything that can be checked before the first trial.
    pub fn validate(&self) -> Result<ParameterSpace> {
        let space = ParameterSpace::new(self.design_variables.clone())?;

        if self.figure_of_merit.target == 0.0 {
            return Err(EvalError::config(
                "Figure-of-merit target must be non-zero",
            ));
        }
        if !self.performance.contains_key(&self.figure_of_merit.metric) {
            return Err(EvalError::config(format!(
                "Figure-of-merit metric '{}' is not in the performance table",
                self.figure_of_merit.metric
            )));
        }
        check_template(&self.template_dir)?;

        Ok(space)
    }

    /// PLL voltage-controlled oscillator testbench.
    pub fn pll_vco(template_dir: impl Into<PathBuf>) -> Self {
        let dv = |name: &str, lower, upper, step, default| {
            DesignVariable::new(name, lower, upper, step, default)
        };
        let design_variables = vec![
            dv("c_cbank_half_cell", 8.33e-07, 9.996e-06, 5e-09, 4.165e-06),
            dv("c_cvar", 9.26e-07, 1.1112e-05, 5e-09, 4.63e-06),
            dv("c_load", 9.26e-07, 1.1112e-05, 5e-09, 4.63e-06),
            dv("l_bias1", 5e-08, 2.4e-07, 5e-09, 1e-07),
            dv("l_bias2", 5e-08, 2.4e-07, 5e-09, 1e-07),
            dv("l_cbank_half_cell", 5e-08, 2.4e-07, 5e-09, 1e-07),
            dv("l_cvar", 8e-08, 9.6e-07, 5e-09, 4e-07),
            dv("l_load", 5e-08, 2.4e-07, 5e-09, 1e-07),
            dv("r_cvar", 1000.0, 12000.0, 1.0, 5000.0),
            dv("w_bias1", 2e-06, 1e-05, 5e-09, 1e-05),
            dv("w_bias2", 2e-06, 1e-05, 5e-09, 1e-05),
            dv("w_cbank_half_cell", 2e-07, 2.4e-06, 5e-09, 1e-06),
            dv("w_cvar", 9e-07, 1e-05, 5e-09, 4.5e-06),
            dv("w_load", 2e-07, 2.4e-06, 5e-09, 1e-06),
        ];

        let spec = |key: &str| PerformanceSpec::new(key).weight(10.0);
        let mut performance = PerformanceTable::new();
        let mut add = |name: &str, s: PerformanceSpec| {
            performance.insert(name.to_string(), s);
        };
        add("F_Max", spec("F_Max").greater_than(5e9));
        add("F_Min", spec("F_Min").less_than(4.8e9));
        add("PN_1K", spec("PN_1K").less_than(-25.0));
        add("PN_10K", spec("PN_10K").less_than(-50.0));
        add("PN_100K", spec("PN_100K").less_than(-80.0));
        add("PN_1M", spec("PN_1M").less_than(-100.0));
        add("PN_10M", spec("PN_10M").less_than(-120.0));
        add("Kvco_11", spec("Kvco_11").less_than(1e8).greater_than(2.5e7));
        add("Kvco_02", spec("Kvco_02").less_than(1e8).greater_than(2.5e7));
        add("IDC", spec("IDC").default_on_missing(10.0));

        Self {
            name: default_name(),
            suffix: String::new(),
            template_dir: template_dir.into(),
            work_root: default_work_root(),
            mode: ParamFormat::ScriptedSweep,
            run_file: default_run_file(),
            result_file: default_result_file(),
            delete_trials: true,
            start_index: 0,
            exit_policy: ExitPolicy::Absorb,
            history_file: None,
            design_variables,
            performance,
            figure_of_merit: FigureOfMeritSpec::new("IDC", 0.015),
        }
    }
}
