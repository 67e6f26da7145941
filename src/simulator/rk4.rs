//! Fixed-step classical Runge-Kutta integration of a cohort.
//!
//! Time is tracked twice: elapsed days since the start of the run, which is
//! the unit of the step `dt`, and age in years, which is what the derivative
//! receives. Each step advances age by `dt / 365`. Both are computed from the
//! step counter rather than accumulated, so that table intake lookups land on
//! the right column however long the run.

use ndarray::Array1;

use crate::data::DAYS_PER_YEAR;
use crate::error::GrowthError;
use crate::simulator::derivative::{MassDerivative, MassRates};
use crate::simulator::trajectory::Trajectory;

/// Lifecycle of an [Rk4] run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorState {
    /// Only the initial state has been recorded
    Initialized,
    /// At least one step taken, more remain
    Stepping,
    /// All steps taken
    Completed,
}

/// Number of whole steps of `dt` days that fit in `total_days`
pub fn step_count(total_days: f64, dt: f64) -> Result<usize, GrowthError> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(GrowthError::InvalidTimeStep(dt));
    }
    if !total_days.is_finite() || total_days < 0.0 {
        return Err(GrowthError::InvalidDuration(total_days));
    }
    Ok((total_days / dt).floor() as usize)
}

/// Classical four stage Runge-Kutta integrator over a cohort.
///
/// All individuals advance in lockstep: each stage is evaluated for the whole
/// cohort before the next one starts, and step `i + 1` only sees the fully
/// updated state of step `i`.
pub struct Rk4<'d, D: MassDerivative> {
    derivative: &'d D,
    dt: f64,
    n_steps: usize,
    step: usize,
    time: f64,
    age0: Array1<f64>,
    age: Array1<f64>,
    ffm: Array1<f64>,
    fm: Array1<f64>,
    strict: bool,
    trajectory: Trajectory,
}

impl<'d, D: MassDerivative> Rk4<'d, D> {
    /// Set up a run of `floor(total_days / dt)` steps and record the initial state
    pub fn new(
        derivative: &'d D,
        dt: f64,
        total_days: f64,
        age: Array1<f64>,
        ffm: Array1<f64>,
        fm: Array1<f64>,
    ) -> Result<Self, GrowthError> {
        let n_steps = step_count(total_days, dt)?;
        let n = age.len();
        for (field, found) in [("ffm", ffm.len()), ("fm", fm.len())] {
            if found != n {
                return Err(GrowthError::ShapeMismatch {
                    field,
                    expected: n,
                    found,
                });
            }
        }

        let mut trajectory = Trajectory::with_capacity(n_steps + 1, n);
        trajectory.record(0.0, &age, &ffm, &fm);

        Ok(Rk4 {
            derivative,
            dt,
            n_steps,
            step: 0,
            time: 0.0,
            age0: age.clone(),
            age,
            ffm,
            fm,
            strict: false,
            trajectory,
        })
    }

    /// Abort with [GrowthError::InvalidState] as soon as a mass becomes non-physical
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn state(&self) -> IntegratorState {
        if self.step >= self.n_steps {
            IntegratorState::Completed
        } else if self.step == 0 {
            IntegratorState::Initialized
        } else {
            IntegratorState::Stepping
        }
    }

    /// Steps taken so far
    pub fn steps_taken(&self) -> usize {
        self.step
    }

    pub fn total_steps(&self) -> usize {
        self.n_steps
    }

    /// Elapsed days
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Advance one step. Returns `false` without doing anything once completed.
    pub fn step(&mut self) -> Result<bool, GrowthError> {
        if self.state() == IntegratorState::Completed {
            return Ok(false);
        }

        let dt = self.dt;
        let half_age = self.age_at(self.step as f64 + 0.5);
        let next_age = self.age_at((self.step + 1) as f64);

        let k1 = self.derivative.rates(&self.age, &self.ffm, &self.fm)?;
        let k2 = self.stage(&half_age, &k1, 0.5 * dt)?;
        let k3 = self.stage(&half_age, &k2, 0.5 * dt)?;
        let k4 = self.stage(&next_age, &k3, dt)?;

        let ffm_slope = &k1.ffm + &(2.0 * &k2.ffm) + &(2.0 * &k3.ffm) + &k4.ffm;
        let fm_slope = &k1.fm + &(2.0 * &k2.fm) + &(2.0 * &k3.fm) + &k4.fm;
        self.ffm = &self.ffm + &(ffm_slope * (dt / 6.0));
        self.fm = &self.fm + &(fm_slope * (dt / 6.0));
        self.age = next_age;
        self.step += 1;
        self.time = self.step as f64 * dt;

        let valid = self
            .trajectory
            .record(self.time, &self.age, &self.ffm, &self.fm);
        tracing::trace!(step = self.step, time = self.time, valid, "rk4 step");

        if !valid {
            if self.strict {
                return Err(self.invalid_state());
            }
            if self.trajectory.first_invalid_step() == Some(self.step) {
                tracing::warn!(
                    step = self.step,
                    "Non-physical body composition reached, continuing without checks"
                );
            }
        }
        Ok(true)
    }

    /// Age after `steps` (possibly fractional) steps from the start
    fn age_at(&self, steps: f64) -> Array1<f64> {
        &self.age0 + steps * self.dt / DAYS_PER_YEAR
    }

    /// Derivative at `age` and the current masses advanced by `h·k`
    fn stage(&self, age: &Array1<f64>, k: &MassRates, h: f64) -> Result<MassRates, GrowthError> {
        let ffm = &self.ffm + &(&k.ffm * h);
        let fm = &self.fm + &(&k.fm * h);
        self.derivative.rates(age, &ffm, &fm)
    }

    fn invalid_state(&self) -> GrowthError {
        let individual = self
            .ffm
            .iter()
            .zip(self.fm.iter())
            .position(|(&ffm, &fm)| !(ffm.is_finite() && ffm > 0.0 && fm.is_finite() && fm > 0.0))
            .unwrap_or(0);
        GrowthError::InvalidState {
            step: self.step,
            individual,
            ffm: self.ffm[individual],
            fm: self.fm[individual],
        }
    }

    /// Take every remaining step and return the full trajectory
    pub fn run(mut self) -> Result<Trajectory, GrowthError> {
        while self.step()? {}
        Ok(self.trajectory.truncate())
    }

    /// Trajectory recorded so far
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::IntakeTable;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    /// dFFM = a, dFM = b everywhere
    struct Constant {
        a: f64,
        b: f64,
    }

    impl MassDerivative for Constant {
        fn rates(
            &self,
            age: &Array1<f64>,
            _ffm: &Array1<f64>,
            _fm: &Array1<f64>,
        ) -> Result<MassRates, GrowthError> {
            Ok(MassRates {
                ffm: Array1::from_elem(age.len(), self.a),
                fm: Array1::from_elem(age.len(), self.b),
            })
        }
    }

    /// dFFM = -FFM, dFM = (age in days)
    struct Decay;

    impl MassDerivative for Decay {
        fn rates(
            &self,
            age: &Array1<f64>,
            ffm: &Array1<f64>,
            _fm: &Array1<f64>,
        ) -> Result<MassRates, GrowthError> {
            Ok(MassRates {
                ffm: -ffm,
                fm: age * DAYS_PER_YEAR,
            })
        }
    }

    /// dFFM = 0, dFM = tabulated intake, with column `j` holding `j`
    struct Ramp {
        table: IntakeTable,
        age0: f64,
        dt: f64,
    }

    impl MassDerivative for Ramp {
        fn rates(
            &self,
            age: &Array1<f64>,
            _ffm: &Array1<f64>,
            _fm: &Array1<f64>,
        ) -> Result<MassRates, GrowthError> {
            let fm = self.table.lookup(0, age[0], self.age0, self.dt)?;
            Ok(MassRates {
                ffm: Array1::zeros(1),
                fm: Array1::from_elem(1, fm),
            })
        }
    }

    #[test]
    fn long_fine_runs_read_the_current_table_column() {
        // k1, k2 and k3 read column i and k4 reads column i + 1, so each step
        // adds dt·(i + 1/6) to FM
        let (age0, dt) = (10.0, 0.01);
        let columns = 2600;
        let model = Ramp {
            table: IntakeTable::new(Array2::from_shape_fn((1, columns), |(_, j)| j as f64)),
            age0,
            dt,
        };
        let integrator = Rk4::new(&model, dt, 25.0, array![age0], array![25.0], array![5.0]).unwrap();
        assert!(integrator.total_steps() >= 2000);
        let trajectory = integrator.run().unwrap();

        for (row, &time) in trajectory.times().iter().enumerate() {
            let m = row as f64;
            let expected = 5.0 + dt * (m * (m - 1.0) / 2.0 + m / 6.0);
            assert_relative_eq!(trajectory.fm()[[row, 0]], expected, epsilon = 1e-6);
            assert_relative_eq!(time, m * dt, epsilon = 1e-12);
            assert_relative_eq!(trajectory.age()[[row, 0]], age0 + m * dt / 365.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn constant_rates_are_exact() {
        let model = Constant { a: 0.01, b: -0.002 };
        let trajectory = Rk4::new(
            &model,
            1.0,
            100.0,
            array![10.0, 12.0],
            array![25.0, 30.0],
            array![5.0, 8.0],
        )
        .unwrap()
        .run()
        .unwrap();

        assert_eq!(trajectory.len(), 101);
        for (row, &time) in trajectory.times().iter().enumerate() {
            assert_relative_eq!(time, row as f64);
            assert_relative_eq!(trajectory.ffm()[[row, 0]], 25.0 + 0.01 * time, epsilon = 1e-10);
            assert_relative_eq!(trajectory.fm()[[row, 1]], 8.0 - 0.002 * time, epsilon = 1e-10);
        }
    }

    #[test]
    fn exponential_decay_is_fourth_order_accurate() {
        let model = Decay;
        let trajectory = Rk4::new(&model, 0.1, 1.0, array![0.0], array![1.0], array![1.0])
            .unwrap()
            .run()
            .unwrap();
        let last = trajectory.final_state().unwrap();
        assert_relative_eq!(last.ffm[0], (-1.0f64).exp(), epsilon = 1e-5);
    }

    #[test]
    fn fractional_steps_use_the_step_size() {
        // dFM = age in days, so FM(t) = FM0 + t²/2 for a start at age 0
        let model = Decay;
        let trajectory = Rk4::new(&model, 0.5, 10.0, array![0.0], array![1.0], array![1.0])
            .unwrap()
            .run()
            .unwrap();
        let last = trajectory.final_state().unwrap();
        assert_relative_eq!(last.time, 10.0);
        assert_relative_eq!(last.fm[0], 1.0 + 50.0, epsilon = 1e-9);
        assert_relative_eq!(last.age[0], 10.0 / 365.0, epsilon = 1e-12);
    }

    #[test]
    fn shorter_than_one_step_keeps_initial_state() {
        let model = Constant { a: 1.0, b: 1.0 };
        let integrator =
            Rk4::new(&model, 1.0, 0.5, array![10.0], array![25.0], array![5.0]).unwrap();
        assert_eq!(integrator.state(), IntegratorState::Completed);
        let trajectory = integrator.run().unwrap();
        assert_eq!(trajectory.len(), 1);
        assert_eq!(trajectory.ffm()[[0, 0]], 25.0);
    }

    #[test]
    fn state_machine() {
        let model = Constant { a: 0.0, b: 0.0 };
        let mut integrator =
            Rk4::new(&model, 1.0, 2.0, array![10.0], array![25.0], array![5.0]).unwrap();
        assert_eq!(integrator.state(), IntegratorState::Initialized);
        assert!(integrator.step().unwrap());
        assert_eq!(integrator.state(), IntegratorState::Stepping);
        assert!(integrator.step().unwrap());
        assert_eq!(integrator.state(), IntegratorState::Completed);
        assert!(!integrator.step().unwrap());
        assert_eq!(integrator.steps_taken(), 2);
        assert_eq!(integrator.trajectory().len(), 3);
    }

    #[test]
    fn strict_mode_stops_on_negative_mass() {
        let model = Constant { a: 0.0, b: -1.0 };
        let result = Rk4::new(&model, 1.0, 10.0, array![10.0], array![25.0], array![2.5])
            .unwrap()
            .strict(true)
            .run();
        match result {
            Err(GrowthError::InvalidState { step, individual, .. }) => {
                assert_eq!(step, 3);
                assert_eq!(individual, 0);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn lenient_mode_flags_negative_mass() {
        let model = Constant { a: 0.0, b: -1.0 };
        let trajectory = Rk4::new(&model, 1.0, 10.0, array![10.0], array![25.0], array![2.5])
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(trajectory.len(), 11);
        assert_eq!(trajectory.first_invalid_step(), Some(3));
        assert!(trajectory.valid()[..3].iter().all(|&v| v));
    }

    #[test]
    fn rejects_bad_durations() {
        let model = Constant { a: 0.0, b: 0.0 };
        assert!(matches!(
            Rk4::new(&model, 1.0, -1.0, array![10.0], array![25.0], array![5.0]),
            Err(GrowthError::InvalidDuration(_))
        ));
        assert!(matches!(step_count(10.0, 0.0), Err(GrowthError::InvalidTimeStep(_))));
        assert_eq!(step_count(10.0, 3.0).unwrap(), 3);
    }
}
