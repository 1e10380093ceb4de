use super::types::{FigureOfMeritSpec, PerformanceSpec, PerformanceTable};
use indexmap::IndexMap;

/// Bounded stand-in for a relative error when the bound itself is zero.
fn sigmoid_span(value: f64) -> f64 {
    2.0 / (1.0 + (-value).exp())
}

/// Signed penalty terms for one performance entry, in (less, greater) order.
///
/// Positive means violated. An informational entry yields no terms.
pub fn penalty_terms(spec: &PerformanceSpec, value: f64) -> Vec<f64> {
    let mut terms = Vec::with_capacity(2);

    if let Some(bound) = spec.less_than {
        terms.push(if bound != 0.0 {
            (value - bound) / bound.abs() * spec.weight
        } else {
            (sigmoid_span(value) - 1.0) * spec.weight
        });
    }

    if let Some(bound) = spec.greater_than {
        terms.push(if bound != 0.0 {
            -(value - bound) / bound.abs() * spec.weight
        } else {
            -(sigmoid_span(value) + 1.0) * spec.weight
        });
    }

    terms
}

/// Sum of violated constraint terms. Satisfied constraints add exactly zero.
///
/// Metrics without a spec entry are ignored.
pub fn constraint_cost(metrics: &IndexMap<String, f64>, specs: &PerformanceTable) -> f64 {
    metrics
        .iter()
        .filter_map(|(name, &value)| specs.get(name).map(|spec| penalty_terms(spec, value)))
        .flatten()
        .filter(|&term| term > 0.0)
        .sum()
}

/// Signed relative distance of the figure of merit from its target.
///
/// Not clamped: overshooting the target in either direction moves the cost.
pub fn fom_cost(fom: f64, spec: &FigureOfMeritSpec) -> f64 {
    (fom - spec.target) / spec.target.abs() * spec.effective_weight()
}

/// Total cost: constraint penalties plus the figure-of-merit term. Lower is better.
pub fn evaluate_cost(
    metrics: &IndexMap<String, f64>,
    fom: f64,
    specs: &PerformanceTable,
    fom_spec: &FigureOfMeritSpec,
) -> f64 {
    constraint_cost(metrics, specs) + fom_cost(fom, fom_spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn metrics(pairs: &[(&str, f64)]) -> IndexMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn single(name: &str, spec: PerformanceSpec) -> PerformanceTable {
        let mut table = PerformanceTable::new();
        table.insert(name.to_string(), spec);
        table
    }

    #[test]
    fn value_at_bound_is_not_a_violation() {
        let lt = PerformanceSpec::new("X").less_than(10.0);
        assert_eq!(penalty_terms(&lt, 10.0), vec![0.0]);
        let gt = PerformanceSpec::new("X").greater_than(-50.0);
        assert_eq!(penalty_terms(&gt, -50.0), vec![0.0]);
    }

    #[test]
    fn zero_bound_uses_sigmoid() {
        let lt = PerformanceSpec::new("X").less_than(0.0);
        assert_eq!(penalty_terms(&lt, 0.0), vec![0.0]);
        assert!(penalty_terms(&lt, 3.0)[0] > 0.0);
        assert!(penalty_terms(&lt, 1e6)[0] <= 1.0);

        // The greater-than zero-bound branch is always non-positive.
        let gt = PerformanceSpec::new("X").greater_than(0.0);
        assert_abs_diff_eq!(penalty_terms(&gt, 0.0)[0], -2.0);
        assert!(penalty_terms(&gt, -1e6)[0] <= -1.0);
    }

    #[test]
    fn negative_bounds_use_magnitude() {
        let pn = PerformanceSpec::new("PN_1M").less_than(-100.0).weight(10.0);
        assert_relative_eq!(penalty_terms(&pn, -90.0)[0], 1.0, max_relative = 1e-9);
        assert_relative_eq!(penalty_terms(&pn, -110.0)[0], -1.0, max_relative = 1e-9);
    }

    #[test]
    fn two_sided_spec_contributes_both_terms() {
        let kvco = PerformanceSpec::new("Kvco_11")
            .less_than(1e8)
            .greater_than(2.5e7)
            .weight(10.0);
        let terms = penalty_terms(&kvco, 1e7);
        assert_eq!(terms.len(), 2);
        assert!(terms[0] < 0.0);
        assert_relative_eq!(terms[1], 6.0, max_relative = 1e-9);

        let table = single("Kvco_11", kvco);
        assert_relative_eq!(constraint_cost(&metrics(&[("Kvco_11", 5e7)]), &table), 0.0);
        assert_relative_eq!(constraint_cost(&metrics(&[("Kvco_11", 1e7)]), &table), 6.0, max_relative = 1e-9);
    }

    #[test]
    fn informational_entry_is_excluded() {
        let table = single("IDC", PerformanceSpec::new("IDC").default_on_missing(10.0));
        assert!(penalty_terms(&table["IDC"], 123.0).is_empty());
        assert_eq!(constraint_cost(&metrics(&[("IDC", 123.0)]), &table), 0.0);
    }

    #[test]
    fn end_to_end_scalar_cost() {
        let mut table = single("X", PerformanceSpec::new("X").less_than(10.0));
        table.insert("IDC".to_string(), PerformanceSpec::new("IDC"));
        let fom = FigureOfMeritSpec::new("IDC", 0.015);

        assert_relative_eq!(penalty_terms(&table["X"], 12.0)[0], 0.2, max_relative = 1e-9);
        assert_relative_eq!(penalty_terms(&table["X"], 8.0)[0], -0.2, max_relative = 1e-9);

        let satisfied = evaluate_cost(&metrics(&[("X", 8.0), ("IDC", 0.02)]), 0.02, &table, &fom);
        assert_relative_eq!(satisfied, 1.0 / 3.0, max_relative = 1e-12);

        let violated = evaluate_cost(&metrics(&[("X", 12.0), ("IDC", 0.02)]), 0.02, &table, &fom);
        assert_relative_eq!(violated, 0.2 + 1.0 / 3.0, max_relative = 1e-12);
    }

    #[test]
    fn fom_cost_is_signed() {
        let mut fom = FigureOfMeritSpec::new("IDC", 0.015);
        assert!(fom_cost(0.01, &fom) < 0.0);
        assert!(fom_cost(0.02, &fom) > 0.0);
        fom.weight = Some(2.0);
        assert_relative_eq!(fom_cost(0.03, &fom), 2.0, max_relative = 1e-9);
    }
}
