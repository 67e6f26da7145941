use std::io::Write;

use ndarray::{s, Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::GrowthError;

/// Label identifying the model that produced a trajectory
pub const MODEL_TYPE: &str = "Children";

/// Simulated body composition of a cohort, one row per recorded step.
///
/// Row 0 is the initial state. Every matrix has shape `(len, n_individuals)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    time: Vec<f64>,
    age: Array2<f64>,
    ffm: Array2<f64>,
    fm: Array2<f64>,
    body_weight: Array2<f64>,
    valid: Vec<bool>,
}

/// Cohort-wide state at one recorded step
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// Days since the start of the simulation
    pub time: f64,
    pub age: ArrayView1<'a, f64>,
    pub ffm: ArrayView1<'a, f64>,
    pub fm: ArrayView1<'a, f64>,
    pub body_weight: ArrayView1<'a, f64>,
    pub valid: bool,
}

/// Whether every mass is finite and strictly positive
pub fn is_physical(ffm: &Array1<f64>, fm: &Array1<f64>) -> bool {
    ffm.iter()
        .chain(fm.iter())
        .all(|&mass| mass.is_finite() && mass > 0.0)
}

impl Trajectory {
    /// Empty trajectory with room for `len` rows of `n` individuals
    pub(crate) fn with_capacity(len: usize, n: usize) -> Self {
        Trajectory {
            time: Vec::with_capacity(len),
            age: Array2::zeros((len, n)),
            ffm: Array2::zeros((len, n)),
            fm: Array2::zeros((len, n)),
            body_weight: Array2::zeros((len, n)),
            valid: Vec::with_capacity(len),
        }
    }

    /// Store the state of the next row, returns whether the state is physical
    pub(crate) fn record(
        &mut self,
        time: f64,
        age: &Array1<f64>,
        ffm: &Array1<f64>,
        fm: &Array1<f64>,
    ) -> bool {
        let row = self.time.len();
        let valid = is_physical(ffm, fm);
        self.age.row_mut(row).assign(age);
        self.ffm.row_mut(row).assign(ffm);
        self.fm.row_mut(row).assign(fm);
        self.body_weight.row_mut(row).assign(&(ffm + fm));
        self.time.push(time);
        self.valid.push(valid);
        valid
    }

    /// Drop preallocated rows that were never recorded
    pub(crate) fn truncate(mut self) -> Self {
        let len = self.time.len();
        if len < self.age.nrows() {
            self.age = self.age.slice(s![..len, ..]).to_owned();
            self.ffm = self.ffm.slice(s![..len, ..]).to_owned();
            self.fm = self.fm.slice(s![..len, ..]).to_owned();
            self.body_weight = self.body_weight.slice(s![..len, ..]).to_owned();
        }
        self
    }

    /// Number of recorded rows, including the initial state
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn n_individuals(&self) -> usize {
        self.ffm.ncols()
    }

    /// Elapsed days at each row
    pub fn times(&self) -> &[f64] {
        &self.time
    }

    /// Age in years
    pub fn age(&self) -> &Array2<f64> {
        &self.age
    }

    /// Fat-free mass in kg
    pub fn ffm(&self) -> &Array2<f64> {
        &self.ffm
    }

    /// Fat mass in kg
    pub fn fm(&self) -> &Array2<f64> {
        &self.fm
    }

    /// Body weight (fat-free mass plus fat mass) in kg
    pub fn body_weight(&self) -> &Array2<f64> {
        &self.body_weight
    }

    /// Physical validity of each row
    pub fn valid(&self) -> &[bool] {
        &self.valid
    }

    /// Whether every row of the trajectory is physically valid
    pub fn is_valid(&self) -> bool {
        self.valid.iter().all(|&v| v)
    }

    /// First row holding a non-physical state, if any
    pub fn first_invalid_step(&self) -> Option<usize> {
        self.valid.iter().position(|&v| !v)
    }

    pub fn model_type(&self) -> &'static str {
        MODEL_TYPE
    }

    pub fn step(&self, index: usize) -> Option<Snapshot<'_>> {
        let time = *self.time.get(index)?;
        Some(Snapshot {
            time,
            age: self.age.row(index),
            ffm: self.ffm.row(index),
            fm: self.fm.row(index),
            body_weight: self.body_weight.row(index),
            valid: self.valid[index],
        })
    }

    /// Last recorded row
    pub fn final_state(&self) -> Option<Snapshot<'_>> {
        self.len().checked_sub(1).and_then(|last| self.step(last))
    }

    /// Write the trajectory in long format, one line per step and individual
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), GrowthError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(writer);
        writer.write_record([
            "time",
            "individual",
            "age",
            "fat_free_mass",
            "fat_mass",
            "body_weight",
            "valid",
        ])?;
        for (row, time) in self.time.iter().enumerate() {
            for individual in 0..self.n_individuals() {
                writer.write_record(&[
                    time.to_string(),
                    individual.to_string(),
                    self.age[[row, individual]].to_string(),
                    self.ffm[[row, individual]].to_string(),
                    self.fm[[row, individual]].to_string(),
                    self.body_weight[[row, individual]].to_string(),
                    self.valid[row].to_string(),
                ])?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}
