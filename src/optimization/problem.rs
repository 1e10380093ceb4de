use crate::config::EvaluatorConfig;
use crate::core::{evaluate_cost, ParameterSpace, TrialResult};
use crate::error::{EvalError, Result};
use crate::optimization::history::{TrialHistory, TrialRecord};
use crate::optimization::traits::Problem;
use crate::simulation::{log, run_simulator, write_params, TrialWorkspace};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Maps a candidate design vector to a scalar cost by running one simulator
/// trial in its own copy of the circuit template.
///
/// Evaluations share no state except the trial counter, so callers may run
/// several at once as long as they pass distinct explicit indices (or let the
/// counter hand them out). Finished trials are only kept when a history file
/// is configured.
#[derive(Debug)]
pub struct Evaluator {
    config: EvaluatorConfig,
    space: ParameterSpace,
    template_dir: PathBuf,
    work_root: PathBuf,
    counter: AtomicU64,
    history: Option<TrialHistory>,
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> Result<Self> {
        let space = config.validate()?;
        let template_dir = std::path::absolute(&config.template_dir)?;
        let work_root = std::path::absolute(&config.work_root)?;

        let history = config
            .history_file
            .as_ref()
            .map(TrialHistory::with_file)
            .transpose()?;

        tracing::debug!(
            "Evaluator '{}' ready: {} design variables, {} metrics, template {}",
            config.name,
            space.dim(),
            config.performance.len(),
            template_dir.display()
        );

        Ok(Self {
            counter: AtomicU64::new(config.start_index),
            config,
            space,
            template_dir,
            work_root,
            history,
        })
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.set_name_suffix(suffix);
        self
    }

    pub fn set_name_suffix(&mut self, suffix: impl Into<String>) -> &mut Self {
        self.config.suffix = suffix.into();
        self
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn dim(&self) -> usize {
        self.space.dim()
    }

    pub fn normalized_init(&self) -> Vec<f64> {
        self.space.normalized_init()
    }

    pub fn real_init(&self) -> Vec<f64> {
        self.space.real_init()
    }

    pub fn real_lower(&self) -> Vec<f64> {
        self.space.real_lower()
    }

    pub fn real_upper(&self) -> Vec<f64> {
        self.space.real_upper()
    }

    /// Trial history, present only when `history_file` is configured.
    pub fn history(&self) -> Option<&TrialHistory> {
        self.history.as_ref()
    }

    /// Index the next automatically numbered trial will get.
    pub fn next_index(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Trial directory path for a given index.
    pub fn trial_dir(&self, index: u64) -> PathBuf {
        self.work_root.join(crate::simulation::workspace::trial_dir_name(
            &self.config.name,
            &self.config.suffix,
            index,
        ))
    }

    /// Cost of one candidate. `x` is normalized to the unit box unless
    /// `is_real_valued` is set, in which case it is used verbatim.
    pub fn evaluate(&self, x: &[f64], is_real_valued: bool, index: Option<u64>) -> Result<f64> {
        self.evaluate_trial(x, is_real_valued, index)
            .map(|trial| trial.cost)
    }

    /// Same as `evaluate`, returning everything measured along the way.
    pub fn evaluate_trial(
        &self,
        x: &[f64],
        is_real_valued: bool,
        index: Option<u64>,
    ) -> Result<TrialResult> {
        let real_parameters = if is_real_valued {
            self.space.pass_through(x)?
        } else {
            self.space.map_to_real(x)?
        };
        let index = self.claim_index(index);

        let workspace = TrialWorkspace::acquire(
            &self.template_dir,
            &self.work_root,
            &self.config.name,
            &self.config.suffix,
            index,
            self.config.delete_trials,
        )?;
        let name = workspace.name();
        tracing::info!("{} is created, waiting for simulation", name);

        let measured = self.simulate(workspace.path(), &real_parameters);
        let released = workspace.release();
        let measured_metrics = measured?;
        released?;
        tracing::info!("{} simulation done", name);

        let fom_spec = &self.config.figure_of_merit;
        let figure_of_merit = fom_spec.project(&measured_metrics).ok_or_else(|| {
            EvalError::config(format!(
                "Figure-of-merit metric '{}' was not measured",
                fom_spec.metric
            ))
        })?;
        let cost = evaluate_cost(
            &measured_metrics,
            figure_of_merit,
            &self.config.performance,
            fom_spec,
        );
        tracing::info!("{} get cost {}", name, cost);

        let result = TrialResult {
            index,
            real_parameters,
            measured_metrics,
            figure_of_merit,
            cost,
        };
        if let Some(history) = &self.history {
            if let Err(e) = history.append(TrialRecord::from(&result)) {
                tracing::warn!("Failed to record trial {}: {}", index, e);
            }
        }

        Ok(result)
    }

    fn claim_index(&self, explicit: Option<u64>) -> u64 {
        match explicit {
            Some(index) => index,
            None => self.counter.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Write parameters, run the simulator and read its log, all inside `dir`.
    fn simulate(
        &self,
        dir: &Path,
        real_parameters: &IndexMap<String, f64>,
    ) -> Result<IndexMap<String, f64>> {
        write_params(dir, self.config.mode, real_parameters)?;
        run_simulator(dir, &self.config.run_file, self.config.exit_policy)?;
        Ok(log::read_all(
            &dir.join(&self.config.result_file),
            &self.config.performance,
        ))
    }
}

impl Problem for Evaluator {
    fn cost(&self, x01: &[f64]) -> Result<f64> {
        self.evaluate(x01, false, None)
    }

    fn num_params(&self) -> usize {
        self.dim()
    }

    fn initial_params(&self) -> Vec<f64> {
        self.normalized_init()
    }
}
