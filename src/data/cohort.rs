use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::data::*;
use crate::error::GrowthError;

/// BMI category of an individual at the start of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight = 1,
    Normal = 2,
    Overweight = 3,
    Obese = 4,
}

impl TryFrom<i64> for BmiCategory {
    type Error = GrowthError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(BmiCategory::Underweight),
            2 => Ok(BmiCategory::Normal),
            3 => Ok(BmiCategory::Overweight),
            4 => Ok(BmiCategory::Obese),
            _ => Err(GrowthError::InvalidBmiCategory(code)),
        }
    }
}

impl BmiCategory {
    pub fn code(&self) -> i64 {
        *self as i64
    }
}

/// A batch of children simulated together.
///
/// Every per-individual quantity is stored as an array of the same length.
/// The sex-blended model constants are computed once at construction and the
/// cohort is immutable afterwards; each call to [Cohort::simulate] starts from
/// the same initial state.
///
/// # Examples
///
/// ```
/// use childweight::*;
///
/// let cohort = Cohort::with_logistic_intake(
///     vec![10.0],
///     vec![0.0],
///     vec![2],
///     vec![25.0],
///     vec![5.0],
///     LogisticIntake::constant(2000.0),
///     1.0,
///     ReferenceVariant::Mean,
/// )
/// .unwrap();
///
/// let trajectory = cohort.simulate(30.0).unwrap();
/// assert_eq!(trajectory.len(), 31);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "CohortInput")]
pub struct Cohort {
    age: Array1<f64>,
    sex: Array1<f64>,
    bmi_category: Vec<BmiCategory>,
    ffm: Array1<f64>,
    fm: Array1<f64>,
    intake: IntakeSource,
    dt: f64,
    reference: ReferenceVariant,
    #[serde(skip_serializing)]
    parameters: Vec<IndividualParameters>,
}

/// Serialized form of a [Cohort], validated by [Cohort::new] on the way in
#[derive(Deserialize)]
struct CohortInput {
    age: Array1<f64>,
    sex: Array1<f64>,
    bmi_category: Vec<BmiCategory>,
    ffm: Array1<f64>,
    fm: Array1<f64>,
    intake: IntakeSource,
    dt: f64,
    reference: ReferenceVariant,
}

impl TryFrom<CohortInput> for Cohort {
    type Error = GrowthError;

    fn try_from(input: CohortInput) -> Result<Self, Self::Error> {
        Cohort::new(
            input.age.to_vec(),
            input.sex.to_vec(),
            input.bmi_category,
            input.ffm.to_vec(),
            input.fm.to_vec(),
            input.intake,
            input.dt,
            input.reference,
        )
    }
}

impl Cohort {
    /// Cohort whose intake is read from a dense `(individuals, steps)` table
    #[allow(clippy::too_many_arguments)]
    pub fn with_intake_table(
        age: Vec<f64>,
        sex: Vec<f64>,
        bmi_category: Vec<i64>,
        ffm: Vec<f64>,
        fm: Vec<f64>,
        intake: Array2<f64>,
        dt: f64,
        reference: ReferenceVariant,
    ) -> Result<Self, GrowthError> {
        let bmi_category = parse_categories(bmi_category)?;
        Cohort::new(
            age,
            sex,
            bmi_category,
            ffm,
            fm,
            IntakeSource::Table(IntakeTable::new(intake)),
            dt,
            reference,
        )
    }

    /// Cohort whose intake follows a shared generalized logistic curve
    #[allow(clippy::too_many_arguments)]
    pub fn with_logistic_intake(
        age: Vec<f64>,
        sex: Vec<f64>,
        bmi_category: Vec<i64>,
        ffm: Vec<f64>,
        fm: Vec<f64>,
        intake: LogisticIntake,
        dt: f64,
        reference: ReferenceVariant,
    ) -> Result<Self, GrowthError> {
        let bmi_category = parse_categories(bmi_category)?;
        Cohort::new(
            age,
            sex,
            bmi_category,
            ffm,
            fm,
            IntakeSource::Logistic(intake),
            dt,
            reference,
        )
    }

    /// Validate the inputs and compute the per-individual constants
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        age: Vec<f64>,
        sex: Vec<f64>,
        bmi_category: Vec<BmiCategory>,
        ffm: Vec<f64>,
        fm: Vec<f64>,
        intake: IntakeSource,
        dt: f64,
        reference: ReferenceVariant,
    ) -> Result<Self, GrowthError> {
        let n = age.len();
        if n == 0 {
            return Err(GrowthError::EmptyCohort);
        }
        check_len("sex", n, sex.len())?;
        check_len("bmi_category", n, bmi_category.len())?;
        check_len("ffm", n, ffm.len())?;
        check_len("fm", n, fm.len())?;
        if let IntakeSource::Table(table) = &intake {
            check_len("intake", n, table.n_individuals())?;
        }

        if !dt.is_finite() || dt <= 0.0 {
            return Err(GrowthError::InvalidTimeStep(dt));
        }

        for (individual, &value) in age.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(GrowthError::InvalidAge { individual, value });
            }
        }
        for (individual, &value) in sex.iter().enumerate() {
            if !(0.0..=1.0).contains(&value) {
                return Err(GrowthError::InvalidSex { individual, value });
            }
        }
        for (compartment, masses) in [(Compartment::FatFreeMass, &ffm), (Compartment::FatMass, &fm)] {
            for (individual, &value) in masses.iter().enumerate() {
                if !value.is_finite() || value <= 0.0 {
                    return Err(GrowthError::NonPositiveMass {
                        individual,
                        compartment,
                        value,
                    });
                }
            }
        }

        let parameters = sex.iter().map(|&s| IndividualParameters::new(s)).collect();

        Ok(Cohort {
            age: Array1::from(age),
            sex: Array1::from(sex),
            bmi_category,
            ffm: Array1::from(ffm),
            fm: Array1::from(fm),
            intake,
            dt,
            reference,
            parameters,
        })
    }

    /// Number of individuals
    pub fn len(&self) -> usize {
        self.age.len()
    }

    pub fn is_empty(&self) -> bool {
        self.age.is_empty()
    }

    /// Age (years) at the start of the simulation
    pub fn age(&self) -> &Array1<f64> {
        &self.age
    }

    pub fn sex(&self) -> &Array1<f64> {
        &self.sex
    }

    pub fn bmi_category(&self) -> &[BmiCategory] {
        &self.bmi_category
    }

    /// Initial fat-free mass (kg)
    pub fn ffm(&self) -> &Array1<f64> {
        &self.ffm
    }

    /// Initial fat mass (kg)
    pub fn fm(&self) -> &Array1<f64> {
        &self.fm
    }

    pub fn intake(&self) -> &IntakeSource {
        &self.intake
    }

    /// Integration step (days)
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn reference(&self) -> ReferenceVariant {
        self.reference
    }

    pub fn parameters(&self) -> &[IndividualParameters] {
        &self.parameters
    }
}

fn parse_categories(codes: Vec<i64>) -> Result<Vec<BmiCategory>, GrowthError> {
    codes.into_iter().map(BmiCategory::try_from).collect()
}

fn check_len(field: &'static str, expected: usize, found: usize) -> Result<(), GrowthError> {
    if expected != found {
        return Err(GrowthError::ShapeMismatch {
            field,
            expected,
            found,
        });
    }
    Ok(())
}
