use ndarray::Array1;
use rayon::prelude::*;

use crate::data::{Cohort, RHO_FM};
use crate::error::GrowthError;
use crate::simulator::kernel::{partition_coefficient, rho_ffm, Individual};

/// Cohorts smaller than this are evaluated on the calling thread
const PARALLEL_THRESHOLD: usize = 64;

/// Instantaneous rates of change of fat-free and fat mass (kg/day)
#[derive(Debug, Clone, PartialEq)]
pub struct MassRates {
    pub ffm: Array1<f64>,
    pub fm: Array1<f64>,
}

/// Right-hand side of the body composition ODE for a whole cohort.
///
/// `age` is in years, masses in kg. Implementations must be pure functions of
/// their arguments so that the integrator can evaluate them in any order.
pub trait MassDerivative: Sync {
    fn rates(
        &self,
        age: &Array1<f64>,
        ffm: &Array1<f64>,
        fm: &Array1<f64>,
    ) -> Result<MassRates, GrowthError>;
}

/// Energy balance model of childhood growth
///
/// `dFFM = (p·(I - E) + G) / ρFFM` and `dFM = ((1 - p)·(I - E) - G) / ρFM`.
#[derive(Debug, Clone)]
pub struct EnergyBalance<'a> {
    individuals: Vec<Individual<'a>>,
}

impl<'a> EnergyBalance<'a> {
    pub fn new(cohort: &'a Cohort) -> Self {
        EnergyBalance {
            individuals: cohort.individuals(),
        }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Rates for a single individual
    pub fn individual_rates(
        individual: &Individual<'_>,
        t: f64,
        ffm: f64,
        fm: f64,
    ) -> Result<(f64, f64), GrowthError> {
        let intake = individual.intake(t)?;
        let expenditure = individual.expenditure_at_intake(t, ffm, fm, intake);
        let p = partition_coefficient(ffm, fm);
        let growth = individual.growth(t);
        let balance = intake - expenditure;

        let d_ffm = (p * balance + growth) / rho_ffm(ffm);
        let d_fm = ((1.0 - p) * balance - growth) / RHO_FM;
        Ok((d_ffm, d_fm))
    }
}

impl MassDerivative for EnergyBalance<'_> {
    fn rates(
        &self,
        age: &Array1<f64>,
        ffm: &Array1<f64>,
        fm: &Array1<f64>,
    ) -> Result<MassRates, GrowthError> {
        let n = self.individuals.len();
        if age.len() != n {
            return Err(GrowthError::ShapeMismatch {
                field: "age",
                expected: n,
                found: age.len(),
            });
        }
        if ffm.len() != n || fm.len() != n {
            return Err(GrowthError::ShapeMismatch {
                field: "mass",
                expected: n,
                found: ffm.len().min(fm.len()),
            });
        }

        let evaluate = |i: usize| {
            EnergyBalance::individual_rates(&self.individuals[i], age[i], ffm[i], fm[i])
        };
        let pairs: Vec<(f64, f64)> = if n >= PARALLEL_THRESHOLD {
            (0..n).into_par_iter().map(evaluate).collect::<Result<_, _>>()?
        } else {
            (0..n).map(evaluate).collect::<Result<_, _>>()?
        };

        let (d_ffm, d_fm): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        Ok(MassRates {
            ffm: Array1::from(d_ffm),
            fm: Array1::from(d_fm),
        })
    }
}
