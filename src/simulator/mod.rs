pub mod derivative;
pub mod kernel;
pub mod rk4;
pub mod trajectory;

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::Cohort;
use crate::error::GrowthError;
use derivative::EnergyBalance;
use rk4::Rk4;
use trajectory::Trajectory;

/// Options controlling a simulation run.
///
/// Can be built in code or read from JSON:
///
/// ```
/// use childweight::SimulationOptions;
///
/// let options: SimulationOptions = serde_json::from_str(r#"{ "strict": true }"#).unwrap();
/// assert!(options.strict);
/// assert!(!options.show_progress);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOptions {
    /// Fail as soon as any fat-free or fat mass becomes non-positive or non-finite.
    /// When disabled the run continues and the problem is only recorded in
    /// [Trajectory::valid].
    pub strict: bool,
    /// Show a progress bar on STDERR while simulating a batch of cohorts
    pub show_progress: bool,
}

impl SimulationOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort on non-physical body composition
    pub fn with_strict_checks(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Only flag non-physical body composition in the trajectory
    pub fn without_strict_checks(mut self) -> Self {
        self.strict = false;
        self
    }

    /// Enable progress bar display
    pub fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }

    /// Disable progress bar display
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Read options from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GrowthError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

impl Cohort {
    /// Simulate `total_days` days with default options.
    ///
    /// Returns one row per step, starting with the initial state; a duration
    /// shorter than one step yields the initial state only.
    pub fn simulate(&self, total_days: f64) -> Result<Trajectory, GrowthError> {
        self.simulate_with(total_days, &SimulationOptions::default())
    }

    pub fn simulate_with(
        &self,
        total_days: f64,
        options: &SimulationOptions,
    ) -> Result<Trajectory, GrowthError> {
        let n_steps = rk4::step_count(total_days, self.dt())?;
        // The last step evaluates the intake one full step ahead
        if let Some(available) = self.intake().available_steps() {
            if n_steps > 0 && n_steps + 1 > available {
                return Err(GrowthError::IntakeOutOfRange {
                    individual: 0,
                    index: n_steps as i64,
                    available,
                });
            }
        }

        tracing::debug!(
            individuals = self.len(),
            steps = n_steps,
            dt = self.dt(),
            reference = ?self.reference(),
            "Starting simulation"
        );

        let model = EnergyBalance::new(self);
        let trajectory = Rk4::new(
            &model,
            self.dt(),
            total_days,
            self.age().clone(),
            self.ffm().clone(),
            self.fm().clone(),
        )?
        .strict(options.strict)
        .run()?;

        tracing::debug!(
            rows = trajectory.len(),
            valid = trajectory.is_valid(),
            "Simulation finished"
        );
        Ok(trajectory)
    }
}

/// Simulate independent cohorts in parallel.
///
/// Results are returned in the order of `cohorts`; a failure in one cohort
/// does not affect the others.
pub fn simulate_batch(
    cohorts: &[Cohort],
    total_days: f64,
    options: &SimulationOptions,
) -> Vec<Result<Trajectory, GrowthError>> {
    let progress = if options.show_progress {
        let bar = ProgressBar::new(cohorts.len() as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:40} {pos}/{len} cohorts ({eta} remaining)")
        {
            bar.set_style(style);
        }
        Some(bar)
    } else {
        None
    };

    let results = cohorts
        .par_iter()
        .map(|cohort| {
            let result = cohort.simulate_with(total_days, options);
            if let Err(e) = &result {
                tracing::warn!("Cohort simulation failed: {}", e);
            }
            if let Some(bar) = &progress {
                bar.inc(1);
            }
            result
        })
        .collect();

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    results
}
