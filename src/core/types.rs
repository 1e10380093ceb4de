use crate::error::{EvalError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ===== ENUMS =====

/// Which parameter file the simulator testbench reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamFormat {
    /// `.param <name> = <value>` lines for a SPICE deck.
    #[serde(alias = "spice")]
    SimulatorNative,
    /// `ocnxlSweepVar("<name>" "<value>")` lines for an Ocean script.
    #[default]
    #[serde(alias = "ocean")]
    ScriptedSweep,
}

impl ParamFormat {
    /// Fixed filename the simulator expects for this format.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::SimulatorNative => "param",
            Self::ScriptedSweep => "param.ocn",
        }
    }
}

impl fmt::Display for ParamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SimulatorNative => "spice",
            Self::ScriptedSweep => "ocean",
        })
    }
}

impl FromStr for ParamFormat {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "spice" | "simulator_native" => Ok(Self::SimulatorNative),
            "ocean" | "scripted_sweep" => Ok(Self::ScriptedSweep),
            other => Err(EvalError::config(format!(
                "Unknown parameter write mode '{}'",
                other
            ))),
        }
    }
}

/// What to do when the simulator process exits unsuccessfully.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPolicy {
    /// Log and carry on; missing metrics fall back to their defaults.
    #[default]
    Absorb,
    /// Abort the evaluation with `SimulatorFailed`.
    Fail,
}

// ===== CORE DATA TYPES =====

/// One tunable circuit parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DesignVariable {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub step: f64,
    pub default: f64,
    /// Declared for completeness; quantization never snaps to these.
    #[serde(default)]
    pub discrete_values: Option<Vec<f64>>,
}

impl DesignVariable {
    pub fn new(name: impl Into<String>, lower: f64, upper: f64, step: f64, default: f64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            step,
            default,
            discrete_values: None,
        }
    }

    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    /// Default position inside the unit box.
    pub fn normalized_default(&self) -> f64 {
        let span = self.span();
        if span == 0.0 {
            0.0
        } else {
            (self.default - self.lower) / span
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }

    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.step > 0.0) {
            return Err(EvalError::config(format!(
                "Design variable '{}' has non-positive step {}",
                self.name, self.step
            )));
        }
        if self.lower > self.upper {
            return Err(EvalError::config(format!(
                "Design variable '{}' has lower bound {} above upper bound {}",
                self.name, self.lower, self.upper
            )));
        }
        if !self.is_within_bounds(self.default) {
            return Err(EvalError::config(format!(
                "Design variable '{}' default {} outside [{}, {}]",
                self.name, self.default, self.lower, self.upper
            )));
        }
        Ok(())
    }
}

fn unit_weight() -> f64 {
    1.0
}

/// Bounds and scoring for one measured quantity.
///
/// An entry with neither bound is informational: it is read from the log
/// but contributes no constraint term.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSpec {
    #[serde(default)]
    pub less_than: Option<f64>,
    #[serde(default)]
    pub greater_than: Option<f64>,
    pub log_key: String,
    #[serde(default)]
    pub default_on_missing: f64,
    #[serde(default = "unit_weight")]
    pub weight: f64,
}

impl PerformanceSpec {
    pub fn new(log_key: impl Into<String>) -> Self {
        Self {
            less_than: None,
            greater_than: None,
            log_key: log_key.into(),
            default_on_missing: 0.0,
            weight: 1.0,
        }
    }

    pub fn less_than(mut self, bound: f64) -> Self {
        self.less_than = Some(bound);
        self
    }

    pub fn greater_than(mut self, bound: f64) -> Self {
        self.greater_than = Some(bound);
        self
    }

    pub fn default_on_missing(mut self, value: f64) -> Self {
        self.default_on_missing = value;
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn is_informational(&self) -> bool {
        self.less_than.is_none() && self.greater_than.is_none()
    }
}

/// Ordered metric name -> spec table.
pub type PerformanceTable = IndexMap<String, PerformanceSpec>;

/// Primary objective: a designated metric pushed toward a target value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FigureOfMeritSpec {
    pub metric: String,
    pub target: f64,
    #[serde(default)]
    pub weight: Option<f64>,
}

impl FigureOfMeritSpec {
    pub fn new(metric: impl Into<String>, target: f64) -> Self {
        Self {
            metric: metric.into(),
            target,
            weight: None,
        }
    }

    pub fn effective_weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }

    /// Project the figure of merit out of the measured metrics.
    pub fn project(&self, metrics: &IndexMap<String, f64>) -> Option<f64> {
        metrics.get(&self.metric).copied()
    }
}

/// Everything produced by one evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub index: u64,
    pub real_parameters: IndexMap<String, f64>,
    pub measured_metrics: IndexMap<String, f64>,
    pub figure_of_merit: f64,
    pub cost: f64,
}
