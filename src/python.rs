use crate::config::EvaluatorConfig;
use crate::error::EvalError;
use crate::optimization::Evaluator;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::path::PathBuf;

fn to_py_err(e: EvalError) -> PyErr {
    match e {
        EvalError::Configuration(_) | EvalError::DimensionMismatch { .. } => {
            PyValueError::new_err(e.to_string())
        }
        _ => PyRuntimeError::new_err(e.to_string()),
    }
}

/// Callable evaluator: `cost = Evaluator()(x, realx=False, index=None)`.
#[pyclass(name = "Evaluator")]
pub struct PyEvaluator {
    inner: Evaluator,
}

#[pymethods]
impl PyEvaluator {
    #[new]
    #[pyo3(signature = (config_path=None, template_dir="circuit".to_string()))]
    fn new(config_path: Option<PathBuf>, template_dir: String) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => EvaluatorConfig::from_json_file(path).map_err(to_py_err)?,
            None => EvaluatorConfig::pll_vco(template_dir),
        };
        let inner = Evaluator::new(config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    #[pyo3(signature = (x, realx=false, index=None))]
    fn __call__(&self, py: Python<'_>, x: Vec<f64>, realx: bool, index: Option<u64>) -> PyResult<f64> {
        let inner = &self.inner;
        py.allow_threads(|| inner.evaluate(&x, realx, index))
            .map_err(to_py_err)
    }

    fn set_name_suffix(mut slf: PyRefMut<'_, Self>, suffix: String) -> PyRefMut<'_, Self> {
        slf.inner.set_name_suffix(suffix);
        slf
    }

    #[getter]
    fn in_dim(&self) -> usize {
        self.inner.dim()
    }

    #[getter]
    fn init(&self) -> Vec<f64> {
        self.inner.normalized_init()
    }

    #[getter]
    fn real_init(&self) -> Vec<f64> {
        self.inner.real_init()
    }

    #[getter]
    fn real_lb(&self) -> Vec<f64> {
        self.inner.real_lower()
    }

    #[getter]
    fn real_ub(&self) -> Vec<f64> {
        self.inner.real_upper()
    }

    #[getter]
    fn next_index(&self) -> u64 {
        self.inner.next_index()
    }

    fn __repr__(&self) -> String {
        let config = self.inner.config();
        format!(
            "Evaluator(name={:?}, suffix={:?}, in_dim={}, mode={})",
            config.name,
            config.suffix,
            self.inner.dim(),
            config.mode
        )
    }
}

#[pymodule]
fn pllvco(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyEvaluator>()?;
    Ok(())
}
