use super::types::DesignVariable;
use crate::error::{EvalError, Result};
use indexmap::IndexMap;

/// Ordered set of design variables and the normalized <-> real mapping.
#[derive(Clone, Debug)]
pub struct ParameterSpace {
    variables: Vec<DesignVariable>,
}

impl ParameterSpace {
    pub fn new(variables: Vec<DesignVariable>) -> Result<Self> {
        if variables.is_empty() {
            return Err(EvalError::config("Parameter space has no design variables"));
        }
        for (i, dv) in variables.iter().enumerate() {
            dv.validate()?;
            if variables[..i].iter().any(|other| other.name == dv.name) {
                return Err(EvalError::config(format!(
                    "Duplicate design variable '{}'",
                    dv.name
                )));
            }
        }
        Ok(Self { variables })
    }

    pub fn dim(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[DesignVariable] {
        &self.variables
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|dv| dv.name.as_str())
    }

    pub fn normalized_init(&self) -> Vec<f64> {
        self.variables.iter().map(|dv| dv.normalized_default()).collect()
    }

    pub fn real_init(&self) -> Vec<f64> {
        self.variables.iter().map(|dv| dv.default).collect()
    }

    pub fn real_lower(&self) -> Vec<f64> {
        self.variables.iter().map(|dv| dv.lower).collect()
    }

    pub fn real_upper(&self) -> Vec<f64> {
        self.variables.iter().map(|dv| dv.upper).collect()
    }

    /// Map a point of the unit box to quantized real values.
    ///
    /// Each coordinate is scaled onto its variable's span, rounded half-up to
    /// the nearest step, offset by the lower bound and clamped. Values
    /// outside [0, 1] are tolerated and end up clamped.
    pub fn map_to_real(&self, x01: &[f64]) -> Result<IndexMap<String, f64>> {
        self.check_dim(x01)?;
        Ok(self
            .variables
            .iter()
            .zip(x01)
            .map(|(dv, &x)| (dv.name.clone(), quantize(dv, x)))
            .collect())
    }

    /// Zip already-real values onto variable names, untouched.
    pub fn pass_through(&self, x_real: &[f64]) -> Result<IndexMap<String, f64>> {
        self.check_dim(x_real)?;
        Ok(self
            .variables
            .iter()
            .zip(x_real)
            .map(|(dv, &x)| (dv.name.clone(), x))
            .collect())
    }

    fn check_dim(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.dim() {
            return Err(EvalError::DimensionMismatch {
                expected: self.dim(),
                actual: x.len(),
            });
        }
        Ok(())
    }
}

fn quantize(dv: &DesignVariable, x01: f64) -> f64 {
    let span = x01 * dv.span();
    // Floor division and modulo, so negative spans round the same way.
    let quotient = (span / dv.step).floor();
    let remainder = span - quotient * dv.step;
    let plus = if remainder / dv.step >= 0.5 { 1.0 } else { 0.0 };
    let real = (quotient + plus) * dv.step + dv.lower;
    dv.clamp(real)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sample_space() -> ParameterSpace {
        ParameterSpace::new(vec![
            DesignVariable::new("l_cvar", 8e-08, 9.6e-07, 5e-09, 4e-07),
            DesignVariable::new("r_cvar", 1000.0, 12000.0, 1.0, 5000.0),
            DesignVariable::new("w_bias1", 2e-06, 1e-05, 5e-09, 1e-05),
        ])
        .unwrap()
    }

    #[test]
    fn zeros_map_to_lower_and_ones_to_upper() {
        let space = sample_space();
        let low = space.map_to_real(&[0.0, 0.0, 0.0]).unwrap();
        let high = space.map_to_real(&[1.0, 1.0, 1.0]).unwrap();
        for dv in space.variables() {
            assert_eq!(low[&dv.name], dv.lower);
            assert_relative_eq!(high[&dv.name], dv.upper, max_relative = 1e-12);
            assert!(high[&dv.name] <= dv.upper);
        }
    }

    #[test]
    fn rounds_half_up_to_step() {
        let space =
            ParameterSpace::new(vec![DesignVariable::new("r", 0.0, 10.0, 1.0, 5.0)]).unwrap();
        assert_eq!(space.map_to_real(&[0.25]).unwrap()["r"], 3.0);
        assert_eq!(space.map_to_real(&[0.24]).unwrap()["r"], 2.0);
        assert_eq!(space.map_to_real(&[0.26]).unwrap()["r"], 3.0);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let space =
            ParameterSpace::new(vec![DesignVariable::new("r", 0.0, 10.0, 1.0, 5.0)]).unwrap();
        assert_eq!(space.map_to_real(&[-0.3]).unwrap()["r"], 0.0);
        assert_eq!(space.map_to_real(&[1.7]).unwrap()["r"], 10.0);
    }

    #[test]
    fn mapped_values_stay_in_bounds_and_on_grid() {
        let space = sample_space();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let x: Vec<f64> = (0..space.dim()).map(|_| rng.gen_range(0.0..=1.0)).collect();
            let real = space.map_to_real(&x).unwrap();
            for dv in space.variables() {
                let v = real[&dv.name];
                assert!(dv.is_within_bounds(v), "{} = {} out of bounds", dv.name, v);
                let steps = (v - dv.lower) / dv.step;
                assert!(
                    (steps - steps.round()).abs() < 1e-6 || v == dv.upper,
                    "{} = {} is off-grid",
                    dv.name,
                    v
                );
            }
        }
    }

    #[test]
    fn pass_through_keeps_literal_defaults() {
        let space = sample_space();
        let real = space.pass_through(&space.real_init()).unwrap();
        let names: Vec<&str> = real.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["l_cvar", "r_cvar", "w_bias1"]);
        assert_eq!(real["l_cvar"], 4e-07);
        assert_eq!(real["r_cvar"], 5000.0);
        assert_eq!(real["w_bias1"], 1e-05);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let space = sample_space();
        let err = space.map_to_real(&[0.5]).unwrap_err();
        assert!(matches!(
            err,
            EvalError::DimensionMismatch {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let dv = DesignVariable::new("a", 0.0, 1.0, 0.1, 0.5);
        assert!(ParameterSpace::new(vec![dv.clone(), dv]).is_err());
        assert!(ParameterSpace::new(Vec::new()).is_err());
    }
}
