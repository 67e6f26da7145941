//! Dynamic body-weight model for children and adolescents.
//!
//! Body mass is split into fat-free mass (FFM) and fat mass (FM). Their rates
//! of change follow from an energy balance between caloric intake and
//! expenditure, corrected by age-dependent growth curves and population
//! reference values, and are integrated with a fixed-step Runge-Kutta scheme
//! for a whole [Cohort] at once.
//!
//! ```
//! use childweight::*;
//!
//! let cohort = Cohort::builder()
//!     .individual(10.0, 0.0, BmiCategory::Normal, 25.0, 5.0)
//!     .individual(12.5, 1.0, BmiCategory::Overweight, 32.0, 14.0)
//!     .constant_intake(2100.0)
//!     .build()
//!     .unwrap();
//!
//! let trajectory = cohort.simulate(365.0).unwrap();
//! let last = trajectory.final_state().unwrap();
//! assert_eq!(last.time, 365.0);
//! assert!(trajectory.is_valid());
//! ```
//!
//! # References
//!
//! Hall, K. D., Butte, N. F., Swinburn, B. A., & Chow, C. C. (2013). Dynamics
//! of childhood growth and obesity: development and validation of a
//! quantitative mathematical model. The Lancet Diabetes & Endocrinology, 1(2), 97-105.

pub mod data;
pub mod error;
pub mod simulator;

//extension traits
pub use crate::data::builder::{CohortBuilder, CohortBuilderExt};
pub use crate::data::*;
pub use crate::simulator::derivative::{EnergyBalance, MassDerivative, MassRates};
pub use crate::simulator::kernel::Individual;
pub use crate::simulator::rk4::{IntegratorState, Rk4};
pub use crate::simulator::trajectory::{Snapshot, Trajectory};
pub use crate::simulator::{simulate_batch, SimulationOptions};
pub use error::GrowthError;

pub mod prelude {
    pub mod data {
        pub use crate::data::{
            BmiCategory, Cohort, IntakeSource, IntakeTable, LogisticIntake, ReferenceVariant,
        };
    }
    pub mod simulator {
        pub use crate::simulator::{
            derivative::{EnergyBalance, MassDerivative, MassRates},
            kernel,
            rk4::{IntegratorState, Rk4},
            simulate_batch,
            trajectory::{Snapshot, Trajectory},
            SimulationOptions,
        };
    }

    //extension traits
    pub use crate::data::builder::CohortBuilderExt;
    pub use crate::data::*;
    pub use crate::GrowthError;
}
