use crate::error::Result;

/// What an outer optimizer needs from a black-box objective.
///
/// Candidates live in the unit box; each call to `cost` is one full trial.
pub trait Problem {
    /// Evaluate the cost of a normalized candidate (runs the simulator).
    fn cost(&self, x01: &[f64]) -> Result<f64>;

    /// Number of design variables.
    fn num_params(&self) -> usize;

    /// Normalized starting point.
    fn initial_params(&self) -> Vec<f64>;

    /// Per-dimension (min, max) of the search box.
    fn bounds(&self) -> Vec<(f64, f64)> {
        vec![(0.0, 1.0); self.num_params()]
    }
}

// ============================================================================
// DRIVING AN EVALUATOR FROM AN OPTIMIZER
// ============================================================================
//
// A sequential optimizer just calls `cost` in a loop; trial directories get
// numbered automatically:
//
//    let evaluator = Evaluator::new(EvaluatorConfig::pll_vco("circuit"))?;
//    let mut x = evaluator.initial_params();
//    let mut best = evaluator.cost(&x)?;
//    for _ in 0..iterations {
//        let candidate = propose(&x);
//        let c = evaluator.cost(&candidate)?;
//        if c < best { best = c; x = candidate; }
//    }
//
// To run trials in parallel, launch one process per trial (see the
// `pllvco-eval` binary) and hand each a distinct `--index`. Trial
// directories are then named uniquely and never collide.
