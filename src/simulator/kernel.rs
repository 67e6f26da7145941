//! Closed-form energy balance and growth functions of the child model.
//!
//! Pure functions of mass live at module level; everything that depends on
//! an individual's sex-blended constants, reference curves or intake is a
//! method of [Individual].

use crate::data::*;
use crate::error::GrowthError;

/// Share of the intake change that feeds back into expenditure
const INTAKE_ADAPTATION: f64 = 0.24;
/// Expenditure per kg of fat-free mass, before the age adjustment (kcal/kg/day)
const FFM_COST: f64 = 22.4;
/// Expenditure per kg of fat mass, before the age adjustment (kcal/kg/day)
const FM_COST: f64 = 4.5;
/// Efficiency cost of depositing fat-free mass (kcal/kg)
const FFM_SYNTHESIS: f64 = 230.0;
/// Efficiency cost of depositing fat mass (kcal/kg)
const FM_SYNTHESIS: f64 = 180.0;

/// `A·exp(-(t-tA)/τA) + B·exp(-½((t-tB)/τB)²) + D·exp(-½((t-tD)/τD)²)`
#[inline]
pub fn general_curve(t: f64, c: &CurveCoefficients) -> f64 {
    c.a * (-(t - c.t_a) / c.tau_a).exp()
        + c.b * (-0.5 * ((t - c.t_b) / c.tau_b).powi(2)).exp()
        + c.d * (-0.5 * ((t - c.t_d) / c.tau_d).powi(2)).exp()
}

/// Energy density of fat-free mass (kcal/kg)
#[inline]
pub fn rho_ffm(ffm: f64) -> f64 {
    4.3 * ffm + 837.0
}

/// Fraction of an energy imbalance that goes to fat-free mass (Forbes)
#[inline]
pub fn partition_coefficient(ffm: f64, fm: f64) -> f64 {
    let c = 10.4 * rho_ffm(ffm) / RHO_FM;
    c / (c + fm)
}

/// One member of a cohort, with everything the kernel needs to evaluate it
#[derive(Debug, Clone, Copy)]
pub struct Individual<'a> {
    index: usize,
    age0: f64,
    sex: f64,
    category: BmiCategory,
    parameters: &'a IndividualParameters,
    reference: ReferenceVariant,
    intake: &'a IntakeSource,
    dt: f64,
}

impl Cohort {
    /// View of the `index`-th individual, `None` if out of bounds
    pub fn individual(&self, index: usize) -> Option<Individual<'_>> {
        if index >= self.len() {
            return None;
        }
        Some(Individual {
            index,
            age0: self.age()[index],
            sex: self.sex()[index],
            category: self.bmi_category()[index],
            parameters: &self.parameters()[index],
            reference: self.reference(),
            intake: self.intake(),
            dt: self.dt(),
        })
    }

    /// All individuals in cohort order
    pub fn individuals(&self) -> Vec<Individual<'_>> {
        (0..self.len()).filter_map(|i| self.individual(i)).collect()
    }
}

impl<'a> Individual<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn parameters(&self) -> &'a IndividualParameters {
        self.parameters
    }

    /// Growth contribution to mass accretion (kcal/day)
    pub fn growth(&self, t: f64) -> f64 {
        general_curve(t, self.parameters.curve(CurveKind::Growth))
    }

    pub fn growth_impact(&self, t: f64) -> f64 {
        general_curve(t, self.parameters.curve(CurveKind::GrowthImpact))
    }

    pub fn energy_balance_impact(&self, t: f64) -> f64 {
        general_curve(t, self.parameters.curve(CurveKind::EnergyBalance))
    }

    /// Age-decaying adjustment of the per-kg expenditure
    pub fn delta(&self, t: f64) -> f64 {
        let min = self.parameters.delta_min();
        let max = self.parameters.delta_max();
        min + (max - min) / (1.0 + (t / DELTA_P).powf(DELTA_H))
    }

    pub fn ffm_reference(&self, t: f64) -> f64 {
        reference::reference_value(
            t,
            self.sex,
            self.category,
            self.reference,
            Compartment::FatFreeMass,
        )
    }

    pub fn fm_reference(&self, t: f64) -> f64 {
        reference::reference_value(
            t,
            self.sex,
            self.category,
            self.reference,
            Compartment::FatMass,
        )
    }

    /// Intake that keeps the individual on the reference curves (kcal/day)
    pub fn reference_intake(&self, t: f64) -> f64 {
        let eb = self.energy_balance_impact(t);
        let ffm = self.ffm_reference(t);
        let fm = self.fm_reference(t);
        let delta = self.delta(t);
        let growth = self.growth(t);
        let p = partition_coefficient(ffm, fm);

        eb + self.parameters.k()
            + (FFM_COST + delta) * ffm
            + (FM_COST + delta) * fm
            + FFM_SYNTHESIS / rho_ffm(ffm) * (p * eb + growth)
            + FM_SYNTHESIS / RHO_FM * ((1.0 - p) * eb - growth)
    }

    /// Caloric intake at age `t` (kcal/day)
    pub fn intake(&self, t: f64) -> Result<f64, GrowthError> {
        self.intake.intake(self.index, t, self.age0, self.dt)
    }

    /// Total energy expenditure (kcal/day)
    pub fn expenditure(&self, t: f64, ffm: f64, fm: f64) -> Result<f64, GrowthError> {
        let intake = self.intake(t)?;
        Ok(self.expenditure_at_intake(t, ffm, fm, intake))
    }

    /// Total energy expenditure for an already known intake
    pub fn expenditure_at_intake(&self, t: f64, ffm: f64, fm: f64, intake: f64) -> f64 {
        let delta = self.delta(t);
        let delta_intake = intake - self.reference_intake(t);
        let p = partition_coefficient(ffm, fm);
        let rho = rho_ffm(ffm);
        let growth = self.growth(t);
        let synthesis = FFM_SYNTHESIS / rho * p + FM_SYNTHESIS / RHO_FM * (1.0 - p);

        let expenditure = self.parameters.k()
            + (FFM_COST + delta) * ffm
            + (FM_COST + delta) * fm
            + INTAKE_ADAPTATION * delta_intake
            + synthesis * intake
            + growth * (FFM_SYNTHESIS / rho - FM_SYNTHESIS / RHO_FM);
        expenditure / (1.0 + synthesis)
    }
}
