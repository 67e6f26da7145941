//! Population reference curves for fat-free mass and fat mass.
//!
//! The tables hold one row per integer age from 2 to 18 years. Rows for ages
//! 2 to 5 are shared by all BMI categories; from age 6 onwards each
//! [BmiCategory] has its own pair of male/female values. Values between two
//! integer ages are linearly interpolated, and every age at or above 18 maps
//! to the 18-year row.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::data::{BmiCategory, Cohort};
use crate::error::GrowthError;

/// Youngest age (years) with a table row
pub const FIRST_AGE: usize = 2;
/// Oldest age (years) with a table row; older ages are clamped to it
pub const LAST_AGE: usize = 18;
const ROWS: usize = LAST_AGE - FIRST_AGE + 1;

/// Body compartment described by a reference curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compartment {
    FatFreeMass,
    FatMass,
}

impl std::fmt::Display for Compartment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compartment::FatFreeMass => write!(f, "fat-free mass"),
            Compartment::FatMass => write!(f, "fat mass"),
        }
    }
}

/// Statistic used to summarise the reference population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReferenceVariant {
    #[default]
    Mean,
    Median,
}

impl ReferenceVariant {
    /// Map the numeric selector used by the R interface (0 = mean, 1 = median)
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ReferenceVariant::Mean),
            1 => Some(ReferenceVariant::Median),
            _ => None,
        }
    }
}

/// A (male, female) pair of reference values
type SexPair = (f64, f64);

/// One row of a reference table
#[derive(Debug, Clone, Copy)]
enum Row {
    /// Same value for every BMI category
    Shared(SexPair),
    /// Indexed as underweight, normal, overweight, obese
    ByCategory([SexPair; 4]),
}

impl Row {
    fn value(&self, sex: f64, category: BmiCategory) -> f64 {
        let (male, female) = match self {
            Row::Shared(pair) => *pair,
            Row::ByCategory(pairs) => match category {
                BmiCategory::Underweight => pairs[0],
                BmiCategory::Normal => pairs[1],
                BmiCategory::Overweight => pairs[2],
                BmiCategory::Obese => pairs[3],
            },
        };
        male * (1.0 - sex) + female * sex
    }
}

const fn shared(male: f64, female: f64) -> Row {
    Row::Shared((male, female))
}

const fn by_category(under: SexPair, normal: SexPair, over: SexPair, obese: SexPair) -> Row {
    Row::ByCategory([under, normal, over, obese])
}

const FFM_MEAN: [Row; ROWS] = [
    shared(10.134, 9.477),
    shared(12.099, 11.494),
    shared(14.0, 13.2),
    shared(15.72, 14.86),
    by_category((13.78, 15.97), (17.59, 15.81), (19.43, 18.59), (21.87, 21.12)),
    by_category((17.59, 16.89), (18.97, 17.96), (21.84, 21.07), (24.88, 25.64)),
    by_category((17.84, 18.11), (20.72, 19.99), (25.18, 22.99), (28.81, 28.21)),
    by_category((19.88, 16.14), (23.46, 22.13), (27.45, 27.50), (32.39, 31.09)),
    by_category((23.36, 23.89), (25.35, 25.22), (30.94, 31.30), (35.98, 35.88)),
    by_category((23.89, 21.65), (28.65, 29.40), (33.65, 35.30), (39.31, 39.46)),
    by_category((27.80, 26.46), (33.08, 32.61), (39.48, 37.21), (44.78, 42.21)),
    by_category((31.85, 28.45), (38.71, 35.03), (42.83, 39.29), (47.03, 45.01)),
    by_category((34.02, 34.24), (42.24, 36.52), (48.24, 41.28), (54.66, 46.63)),
    by_category((34.97, 33.17), (45.14, 38.67), (50.03, 43.47), (55.64, 47.78)),
    by_category((39.77, 31.70), (47.04, 39.64), (53.71, 45.74), (58.05, 50.88)),
    by_category((42.10, 33.63), (48.25, 39.85), (55.36, 45.26), (60.13, 50.52)),
    by_category((44.56, 35.98), (49.11, 40.92), (56.32, 46.59), (61.05, 50.02)),
];

const FFM_MEDIAN: [Row; ROWS] = [
    shared(10.134, 9.477),
    shared(12.099, 11.494),
    shared(14.0, 13.2),
    shared(15.72, 14.86),
    by_category((14.58, 14.61), (17.28, 15.67), (19.14, 19.07), (21.68, 20.68)),
    by_category((18.82, 16.14), (18.78, 17.94), (22.30, 20.92), (24.91, 25.33)),
    by_category((17.26, 18.20), (20.44, 20.16), (24.75, 22.76), (28.54, 27.93)),
    by_category((19.30, 16.31), (23.42, 21.85), (26.94, 27.04), (31.99, 30.77)),
    by_category((23.89, 23.89), (24.99, 25.32), (31.37, 31.09), (35.81, 35.76)),
    by_category((23.74, 21.20), (28.19, 29.95), (33.20, 35.68), (38.81, 39.30)),
    by_category((28.13, 25.50), (32.71, 33.00), (38.84, 36.92), (46.35, 42.30)),
    by_category((32.61, 28.45), (38.70, 35.08), (43.40, 38.67), (47.86, 44.98)),
    by_category((35.03, 37.22), (42.27, 36.28), (47.71, 41.50), (54.53, 46.94)),
    by_category((30.64, 32.87), (44.69, 38.99), (50.18, 43.76), (54.58, 47.37)),
    by_category((41.86, 31.44), (46.71, 39.61), (53.18, 46.38), (57.93, 50.98)),
    by_category((42.27, 34.11), (48.75, 39.49), (55.31, 45.69), (60.26, 50.13)),
    by_category((43.32, 35.98), (48.78, 41.66), (57.29, 46.94), (59.68, 49.72)),
];

const FM_MEAN: [Row; ROWS] = [
    shared(2.456, 2.433),
    shared(2.576, 2.606),
    shared(2.7, 2.8),
    shared(3.66, 4.47),
    by_category((2.02, 2.77), (3.52, 3.99), (4.87, 6.01), (7.34, 9.10)),
    by_category((2.43, 2.92), (3.70, 4.51), (5.43, 6.79), (8.73, 11.60)),
    by_category((2.19, 3.02), (3.99, 4.89), (6.30, 7.40), (10.49, 12.71)),
    by_category((2.54, 2.37), (4.41, 5.23), (6.92, 9.09), (12.56, 14.88)),
    by_category((2.96, 4.00), (4.63, 6.07), (8.25, 10.95), (13.87, 17.80)),
    by_category((2.83, 3.62), (5.32, 7.33), (9.06, 12.84), (16.32, 22.61)),
    by_category((3.20, 4.35), (6.33, 8.59), (11.39, 14.45), (19.77, 24.10)),
    by_category((3.44, 4.38), (7.79, 9.73), (12.66, 15.46), (21.56, 29.22)),
    by_category((3.81, 5.44), (8.71, 9.89), (14.96, 16.18), (26.44, 27.85)),
    by_category((3.98, 5.17), (9.44, 10.85), (16.07, 17.81), (28.15, 29.34)),
    by_category((4.45, 4.95), (10.04, 11.16), (18.43, 19.81), (30.06, 32.58)),
    by_category((4.66, 5.19), (10.25, 10.94), (18.50, 19.14), (30.60, 30.37)),
    by_category((5.07, 5.04), (10.78, 11.02), (19.24, 19.53), (37.55, 31.50)),
];

const FM_MEDIAN: [Row; ROWS] = [
    shared(2.456, 2.433),
    shared(2.576, 2.606),
    shared(2.7, 2.8),
    shared(3.66, 4.47),
    by_category((2.22, 2.57), (3.44, 3.97), (4.74, 6.00), (6.56, 8.57)),
    by_category((2.73, 2.93), (3.70, 4.52), (5.52, 6.73), (8.11, 10.80)),
    by_category((2.02, 3.06), (4.00, 4.99), (6.23, 7.22), (9.35, 11.84)),
    by_category((2.57, 2.79), (4.46, 4.98), (6.74, 8.82), (11.91, 13.08)),
    by_category((3.01, 4.01), (4.67, 5.86), (8.33, 10.68), (14.07, 16.46)),
    by_category((2.76, 3.57), (4.92, 7.33), (8.96, 12.53), (14.80, 20.96)),
    by_category((3.17, 4.18), (6.25, 8.59), (11.46, 14.09), (19.12, 22.63)),
    by_category((3.64, 4.38), (7.67, 9.94), (12.15, 14.67), (22.42, 28.20)),
    by_category((3.77, 5.88), (8.51, 9.54), (14.70, 15.84), (24.80, 25.32)),
    by_category((3.66, 5.30), (9.04, 10.93), (15.74, 17.67), (25.71, 28.37)),
    by_category((4.43, 4.99), (9.87, 11.09), (18.88, 19.74), (27.81, 31.11)),
    by_category((4.40, 5.36), (10.35, 10.43), (17.69, 18.50), (27.69, 29.70)),
    by_category((5.18, 5.05), (10.44, 11.10), (19.39, 18.70), (31.82, 28.55)),
];

fn table(compartment: Compartment, variant: ReferenceVariant) -> &'static [Row; ROWS] {
    match (compartment, variant) {
        (Compartment::FatFreeMass, ReferenceVariant::Mean) => &FFM_MEAN,
        (Compartment::FatFreeMass, ReferenceVariant::Median) => &FFM_MEDIAN,
        (Compartment::FatMass, ReferenceVariant::Mean) => &FM_MEAN,
        (Compartment::FatMass, ReferenceVariant::Median) => &FM_MEDIAN,
    }
}

/// Interpolate the reference value of `compartment` at age `t` (years).
///
/// Ages below 2 years use the 2-3 year segment, ages at or above 18 years
/// return the 18-year row.
pub fn reference_value(
    t: f64,
    sex: f64,
    category: BmiCategory,
    variant: ReferenceVariant,
    compartment: Compartment,
) -> f64 {
    let rows = table(compartment, variant);
    if t >= LAST_AGE as f64 {
        return rows[ROWS - 1].value(sex, category);
    }

    let floor = t.floor();
    let lower = (floor.max(FIRST_AGE as f64) as usize).min(LAST_AGE - 1) - FIRST_AGE;
    let upper = (lower + 1).min(ROWS - 1);
    let diff = t - floor;

    let low = rows[lower].value(sex, category);
    let high = rows[upper].value(sex, category);
    low + diff * (high - low)
}

/// Reference fat-free mass for every individual in `cohort` at the given ages
pub fn ffm_reference(cohort: &Cohort, ages: &Array1<f64>) -> Result<Array1<f64>, GrowthError> {
    cohort_reference(cohort, ages, Compartment::FatFreeMass)
}

/// Reference fat mass for every individual in `cohort` at the given ages
pub fn fm_reference(cohort: &Cohort, ages: &Array1<f64>) -> Result<Array1<f64>, GrowthError> {
    cohort_reference(cohort, ages, Compartment::FatMass)
}

fn cohort_reference(
    cohort: &Cohort,
    ages: &Array1<f64>,
    compartment: Compartment,
) -> Result<Array1<f64>, GrowthError> {
    if ages.len() != cohort.len() {
        return Err(GrowthError::ShapeMismatch {
            field: "ages",
            expected: cohort.len(),
            found: ages.len(),
        });
    }
    let variant = cohort.reference();
    Ok(ages
        .iter()
        .zip(cohort.sex().iter())
        .zip(cohort.bmi_category().iter())
        .map(|((&t, &sex), &category)| reference_value(t, sex, category, variant, compartment))
        .collect())
}
