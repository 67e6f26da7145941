pub mod builder;
pub mod cohort;
pub mod intake;
pub mod parameters;
pub mod reference;
pub use cohort::*;
pub use intake::*;
pub use parameters::*;
pub use reference::{Compartment, ReferenceVariant};
