pub mod config;
pub mod disaster;
pub mod engine;
pub mod error;
pub mod organism;
pub mod rng;
pub mod runtime;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod verdict;
pub mod world;

pub use config::{GameMode, RunSettings, SimulationConfig};
pub use engine::{Simulation, SimulationBuilder, TickFrame};
pub use error::{ConfigError, RunError};
pub use organism::Organism;
pub use runtime::{start_run, RunHandle, RunObserver};
pub use verdict::{evaluate, RunResult, Verdict};
pub use world::{History, PopulationSnapshot};
