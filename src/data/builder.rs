use ndarray::Array2;

use crate::data::*;
use crate::error::GrowthError;

pub trait CohortBuilderExt {
    fn builder() -> CohortBuilder;
}

impl CohortBuilderExt for Cohort {
    fn builder() -> CohortBuilder {
        CohortBuilder::default()
    }
}

/// Incremental construction of a [Cohort], one individual at a time.
///
/// Defaults to a one-day step, mean reference tables and no intake; an
/// intake source must be provided before calling [CohortBuilder::build].
#[derive(Debug, Clone)]
pub struct CohortBuilder {
    age: Vec<f64>,
    sex: Vec<f64>,
    bmi_category: Vec<BmiCategory>,
    ffm: Vec<f64>,
    fm: Vec<f64>,
    intake: Option<IntakeSource>,
    dt: f64,
    reference: ReferenceVariant,
}

impl Default for CohortBuilder {
    fn default() -> Self {
        CohortBuilder {
            age: Vec::new(),
            sex: Vec::new(),
            bmi_category: Vec::new(),
            ffm: Vec::new(),
            fm: Vec::new(),
            intake: None,
            dt: 1.0,
            reference: ReferenceVariant::Mean,
        }
    }
}

impl CohortBuilder {
    pub fn individual(
        mut self,
        age: f64,
        sex: f64,
        bmi_category: BmiCategory,
        ffm: f64,
        fm: f64,
    ) -> Self {
        self.age.push(age);
        self.sex.push(sex);
        self.bmi_category.push(bmi_category);
        self.ffm.push(ffm);
        self.fm.push(fm);
        self
    }

    /// Add `n` copies of the last individual
    pub fn repeat(mut self, n: usize) -> Self {
        let last = self.age.len().checked_sub(1).map(|i| {
            (
                self.age[i],
                self.sex[i],
                self.bmi_category[i],
                self.ffm[i],
                self.fm[i],
            )
        });
        if let Some((age, sex, bmi_category, ffm, fm)) = last {
            for _ in 0..n {
                self = self.individual(age, sex, bmi_category, ffm, fm);
            }
        }
        self
    }

    pub fn dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn reference(mut self, reference: ReferenceVariant) -> Self {
        self.reference = reference;
        self
    }

    pub fn logistic_intake(mut self, curve: LogisticIntake) -> Self {
        self.intake = Some(IntakeSource::Logistic(curve));
        self
    }

    pub fn constant_intake(self, kcal: f64) -> Self {
        self.logistic_intake(LogisticIntake::constant(kcal))
    }

    pub fn intake_table(mut self, values: Array2<f64>) -> Self {
        self.intake = Some(IntakeSource::Table(IntakeTable::new(values)));
        self
    }

    pub fn build(self) -> Result<Cohort, GrowthError> {
        let intake = self.intake.ok_or(GrowthError::MissingIntake)?;
        Cohort::new(
            self.age,
            self.sex,
            self.bmi_category,
            self.ffm,
            self.fm,
            intake,
            self.dt,
            self.reference,
        )
    }
}
