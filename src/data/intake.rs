use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::data::DAYS_PER_YEAR;
use crate::error::GrowthError;

/// Generalized logistic (Richards) intake curve
///
/// `I(t) = A + (K - A) / (C + Q·exp(-B·t))^(1/ν)` with `t` in years.
/// Setting `B = 0` gives a constant intake of `A + (K - A) / (C + Q)^(1/ν)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticIntake {
    /// Upper asymptote
    pub k: f64,
    pub q: f64,
    /// Lower asymptote
    pub a: f64,
    /// Growth rate
    pub b: f64,
    pub nu: f64,
    pub c: f64,
}

impl LogisticIntake {
    pub fn new(k: f64, q: f64, a: f64, b: f64, nu: f64, c: f64) -> Self {
        LogisticIntake { k, q, a, b, nu, c }
    }

    /// Flat intake of `kcal` per day
    pub fn constant(kcal: f64) -> Self {
        LogisticIntake::new(kcal, 1.0, kcal, 0.0, 1.0, 1.0)
    }

    #[inline]
    pub fn evaluate(&self, t: f64) -> f64 {
        self.a + (self.k - self.a) / (self.c + self.q * (-self.b * t).exp()).powf(1.0 / self.nu)
    }
}

/// Tabulated daily intake, one row per individual and one column per step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeTable {
    values: Array2<f64>,
}

/// Tolerance applied before flooring the step index, so that an age advanced
/// by whole steps maps back to that step despite rounding
const INDEX_TOLERANCE: f64 = 1e-8;
/// Number of ulps of the age allowed to accumulate in the index computation
const ROUNDING_STEPS: f64 = 16.0;

impl IntakeTable {
    pub fn new(values: Array2<f64>) -> Self {
        IntakeTable { values }
    }

    pub fn n_individuals(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_steps(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn row(&self, individual: usize) -> ArrayView1<'_, f64> {
        self.values.row(individual)
    }

    /// Step index matching age `t` for an individual who started at `age0`.
    ///
    /// `t` is expected to be `age0 + (step + fraction)·dt/365` computed in one
    /// go, so its only error is the rounding of `t` itself. The tolerance
    /// grows with that rounding error once it exceeds [INDEX_TOLERANCE].
    pub fn step_index(t: f64, age0: f64, dt: f64) -> i64 {
        let rounding = ROUNDING_STEPS * f64::EPSILON * t.abs().max(age0.abs()) * DAYS_PER_YEAR / dt;
        let tolerance = INDEX_TOLERANCE.max(rounding);
        (DAYS_PER_YEAR * (t - age0) / dt + tolerance).floor() as i64
    }

    /// Intake of `individual` at age `t`
    pub fn lookup(&self, individual: usize, t: f64, age0: f64, dt: f64) -> Result<f64, GrowthError> {
        let index = Self::step_index(t, age0, dt);
        let out_of_range = GrowthError::IntakeOutOfRange {
            individual,
            index,
            available: self.n_steps(),
        };
        if index < 0 {
            return Err(out_of_range);
        }
        self.values
            .get((individual, index as usize))
            .copied()
            .ok_or(out_of_range)
    }
}

/// Where the caloric intake of a cohort comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IntakeSource {
    Table(IntakeTable),
    Logistic(LogisticIntake),
}

impl IntakeSource {
    /// Intake (kcal/day) of `individual` at age `t`
    #[inline]
    pub fn intake(&self, individual: usize, t: f64, age0: f64, dt: f64) -> Result<f64, GrowthError> {
        match self {
            IntakeSource::Table(table) => table.lookup(individual, t, age0, dt),
            IntakeSource::Logistic(curve) => Ok(curve.evaluate(t)),
        }
    }

    /// Number of simulation steps the source can serve, `None` if unbounded
    pub fn available_steps(&self) -> Option<usize> {
        match self {
            IntakeSource::Table(table) => Some(table.n_steps()),
            IntakeSource::Logistic(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn flat_logistic_is_constant() {
        let curve = LogisticIntake::new(2000.0, 1.0, 2000.0, 0.0, 1.0, 1.0);
        for t in [0.0, 5.0, 10.0, 17.5] {
            assert_relative_eq!(curve.evaluate(t), 2000.0);
        }
        assert_eq!(LogisticIntake::constant(2000.0), curve);
    }

    #[test]
    fn zero_rate_uses_denominator() {
        let curve = LogisticIntake::new(2400.0, 1.0, 1600.0, 0.0, 1.0, 1.0);
        assert_relative_eq!(curve.evaluate(12.0), 1600.0 + 800.0 / 2.0);
    }

    #[test]
    fn logistic_approaches_upper_asymptote() {
        let curve = LogisticIntake::new(2400.0, 1.0, 1600.0, 1.0, 1.0, 1.0);
        assert!(curve.evaluate(0.0) < curve.evaluate(5.0));
        assert_relative_eq!(curve.evaluate(50.0), 2400.0, epsilon = 1e-6);
    }

    #[test]
    fn table_lookup_by_elapsed_steps() {
        let table = IntakeTable::new(array![[1.0, 2.0, 3.0], [10.0, 20.0, 30.0]]);
        assert_eq!(table.lookup(0, 6.0, 6.0, 1.0).unwrap(), 1.0);
        assert_eq!(table.lookup(1, 6.0 + 1.0 / 365.0, 6.0, 1.0).unwrap(), 20.0);
        assert_eq!(table.lookup(1, 6.0 + 2.5 / 365.0, 6.0, 1.0).unwrap(), 30.0);
    }

    #[test]
    fn step_ages_map_back_to_their_index() {
        for (age0, dt) in [(10.0, 0.01), (5.7, 0.1), (3.1, 0.05), (17.9, 1.0)] {
            for step in 0..40_000i64 {
                let at = age0 + step as f64 * dt / DAYS_PER_YEAR;
                let half = age0 + (step as f64 + 0.5) * dt / DAYS_PER_YEAR;
                assert_eq!(IntakeTable::step_index(at, age0, dt), step, "age0 {} dt {}", age0, dt);
                assert_eq!(IntakeTable::step_index(half, age0, dt), step, "age0 {} dt {}", age0, dt);
            }
        }
    }

    #[test]
    fn fine_steps_keep_their_index() {
        let (age0, dt) = (12.0, 1e-4);
        for step in [0i64, 1, 999, 123_456, 3_650_000] {
            let at = age0 + step as f64 * dt / DAYS_PER_YEAR;
            assert_eq!(IntakeTable::step_index(at, age0, dt), step);
        }
    }

    #[test]
    fn table_lookup_out_of_range() {
        let table = IntakeTable::new(array![[1.0, 2.0]]);
        match table.lookup(0, 6.0 + 2.0 / 365.0, 6.0, 1.0) {
            Err(GrowthError::IntakeOutOfRange {
                individual,
                index,
                available,
            }) => {
                assert_eq!(individual, 0);
                assert_eq!(index, 2);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(table.lookup(0, 5.0, 6.0, 1.0).is_err());
    }
}
