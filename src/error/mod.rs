use thiserror::Error;

use crate::data::Compartment;

#[derive(Error, Debug)]
pub enum GrowthError {
    #[error("Cohort must contain at least one individual")]
    EmptyCohort,
    #[error("No intake source was provided")]
    MissingIntake,
    #[error("Length mismatch for {field}: expected {expected}, found {found}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Invalid BMI category code {0}, expected one of 1, 2, 3, 4")]
    InvalidBmiCategory(i64),
    #[error("Invalid sex value {value} for individual {individual}, expected a weight in [0, 1]")]
    InvalidSex { individual: usize, value: f64 },
    #[error("Invalid starting age {value} for individual {individual}")]
    InvalidAge { individual: usize, value: f64 },
    #[error("Initial {compartment} of individual {individual} must be positive, found {value}")]
    NonPositiveMass {
        individual: usize,
        compartment: Compartment,
        value: f64,
    },
    #[error("Time step must be finite and positive, found {0}")]
    InvalidTimeStep(f64),
    #[error("Simulation length must be finite and non-negative, found {0}")]
    InvalidDuration(f64),
    #[error("Intake index {index} for individual {individual} is outside the table ({available} steps available)")]
    IntakeOutOfRange {
        individual: usize,
        index: i64,
        available: usize,
    },
    #[error("Invalid mass at step {step} for individual {individual} (FFM = {ffm}, FM = {fm})")]
    InvalidState {
        step: usize,
        individual: usize,
        ffm: f64,
        fm: f64,
    },
    #[error("Error writing trajectory: {0}")]
    Csv(#[from] csv::Error),
    #[error("Error reading options: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
