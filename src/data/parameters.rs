use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Energy density of fat mass (kcal/kg)
pub const RHO_FM: f64 = 9.4 * 1000.0;
/// Lower bound of the age-dependent expenditure adjustment
pub const DELTA_MIN: f64 = 10.0;
/// Half-saturation age (years) of the expenditure adjustment
pub const DELTA_P: f64 = 12.0;
/// Hill exponent of the expenditure adjustment
pub const DELTA_H: f64 = 10.0;
/// Days in a model year
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Blend a male and a female value using `sex` as weight (0 = male, 1 = female)
#[inline]
pub fn sex_blend(male: f64, female: f64, sex: f64) -> f64 {
    male * (1.0 - sex) + female * sex
}

/// Named instances of the growth curve family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CurveKind {
    /// Mass accretion driven by growth
    Growth,
    /// Secondary growth curve, kept for completeness of the model
    GrowthImpact,
    /// Age-dependent shift of the energy balance
    EnergyBalance,
}

/// Coefficients of `A·exp(-(t-tA)/τA) + B·exp(-½((t-tB)/τB)²) + D·exp(-½((t-tD)/τD)²)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveCoefficients {
    pub a: f64,
    pub b: f64,
    pub d: f64,
    pub t_a: f64,
    pub t_b: f64,
    pub t_d: f64,
    pub tau_a: f64,
    pub tau_b: f64,
    pub tau_d: f64,
}

impl CurveCoefficients {
    fn blend(male: &CurveCoefficients, female: &CurveCoefficients, sex: f64) -> Self {
        CurveCoefficients {
            a: sex_blend(male.a, female.a, sex),
            b: sex_blend(male.b, female.b, sex),
            d: sex_blend(male.d, female.d, sex),
            t_a: sex_blend(male.t_a, female.t_a, sex),
            t_b: sex_blend(male.t_b, female.t_b, sex),
            t_d: sex_blend(male.t_d, female.t_d, sex),
            tau_a: sex_blend(male.tau_a, female.tau_a, sex),
            tau_b: sex_blend(male.tau_b, female.tau_b, sex),
            tau_d: sex_blend(male.tau_d, female.tau_d, sex),
        }
    }

    /// Male and female coefficients of each curve
    fn reference(kind: CurveKind) -> (CurveCoefficients, CurveCoefficients) {
        match kind {
            CurveKind::Growth => (
                CurveCoefficients {
                    a: 3.2,
                    b: 9.6,
                    d: 10.1,
                    t_a: 4.7,
                    t_b: 12.5,
                    t_d: 15.0,
                    tau_a: 2.5,
                    tau_b: 1.0,
                    tau_d: 1.5,
                },
                CurveCoefficients {
                    a: 2.3,
                    b: 8.4,
                    d: 1.1,
                    t_a: 4.5,
                    t_b: 11.7,
                    t_d: 16.2,
                    tau_a: 1.0,
                    tau_b: 0.9,
                    tau_d: 0.7,
                },
            ),
            CurveKind::GrowthImpact => (
                CurveCoefficients {
                    a: 3.2,
                    b: 9.6,
                    d: 10.0,
                    t_a: 4.7,
                    t_b: 12.5,
                    t_d: 15.0,
                    tau_a: 1.0,
                    tau_b: 0.94,
                    tau_d: 0.69,
                },
                CurveCoefficients {
                    a: 2.3,
                    b: 8.4,
                    d: 1.1,
                    t_a: 4.5,
                    t_b: 11.7,
                    t_d: 16.0,
                    tau_a: 1.0,
                    tau_b: 0.94,
                    tau_d: 0.69,
                },
            ),
            CurveKind::EnergyBalance => (
                CurveCoefficients {
                    a: 7.2,
                    b: 30.0,
                    d: 21.0,
                    t_a: 5.6,
                    t_b: 9.8,
                    t_d: 15.0,
                    tau_a: 15.0,
                    tau_b: 1.5,
                    tau_d: 2.0,
                },
                CurveCoefficients {
                    a: 16.5,
                    b: 47.0,
                    d: 41.0,
                    t_a: 4.8,
                    t_b: 9.1,
                    t_d: 13.5,
                    tau_a: 7.0,
                    tau_b: 1.0,
                    tau_d: 1.5,
                },
            ),
        }
    }
}

/// Linear reference growth `beta0 + beta1·t` for fat-free and fat mass.
///
/// Earlier versions of the model used these straight lines instead of the
/// tabulated reference curves. They are not used during integration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearReference {
    pub ffm_beta0: f64,
    pub ffm_beta1: f64,
    pub fm_beta0: f64,
    pub fm_beta1: f64,
}

impl LinearReference {
    pub fn ffm(&self, t: f64) -> f64 {
        self.ffm_beta0 + self.ffm_beta1 * t
    }

    pub fn fm(&self, t: f64) -> f64 {
        self.fm_beta0 + self.fm_beta1 * t
    }
}

/// Sex-blended constants of a single individual.
///
/// Computed once when a [crate::Cohort] is built and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualParameters {
    k: f64,
    delta_max: f64,
    curves: BTreeMap<CurveKind, CurveCoefficients>,
    linear_reference: LinearReference,
}

impl IndividualParameters {
    pub fn new(sex: f64) -> Self {
        let curves = [
            CurveKind::Growth,
            CurveKind::GrowthImpact,
            CurveKind::EnergyBalance,
        ]
        .into_iter()
        .map(|kind| {
            let (male, female) = CurveCoefficients::reference(kind);
            (kind, CurveCoefficients::blend(&male, &female, sex))
        })
        .collect();

        IndividualParameters {
            k: sex_blend(800.0, 700.0, sex),
            delta_max: sex_blend(19.0, 17.0, sex),
            curves,
            linear_reference: LinearReference {
                ffm_beta0: sex_blend(2.9, 3.8, sex),
                ffm_beta1: sex_blend(2.9, 2.3, sex),
                fm_beta0: sex_blend(1.2, 0.56, sex),
                fm_beta1: sex_blend(0.41, 0.74, sex),
            },
        }
    }

    /// Basal expenditure constant (kcal/day)
    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn delta_min(&self) -> f64 {
        DELTA_MIN
    }

    pub fn delta_max(&self) -> f64 {
        self.delta_max
    }

    pub fn curve(&self, kind: CurveKind) -> &CurveCoefficients {
        // Every kind is inserted by `new`
        &self.curves[&kind]
    }

    pub fn curves(&self) -> &BTreeMap<CurveKind, CurveCoefficients> {
        &self.curves
    }

    pub fn linear_reference(&self) -> &LinearReference {
        &self.linear_reference
    }
}
