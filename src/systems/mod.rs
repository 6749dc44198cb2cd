pub mod disaster;
pub mod population;

pub use disaster::DisasterSystem;
pub use population::PopulationSystem;
