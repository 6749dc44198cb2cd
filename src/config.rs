//! Run configuration and its validation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::organism::Organism;
use crate::world::PopulationSnapshot;

pub const DEFAULT_TOTAL_STEPS: u32 = 100;

/// How long the disaster banner stays up before it clears itself.
pub const EVENT_DISPLAY: Duration = Duration::from_millis(4_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Reach the golden ratio with no disasters.
    #[default]
    Normal,
    /// Survive one random climate disaster.
    Hard,
}

impl GameMode {
    /// Wall-clock length of a paced run.
    pub fn duration(self) -> Duration {
        match self {
            GameMode::Normal => Duration::from_secs(10),
            GameMode::Hard => Duration::from_secs(20),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GameMode::Normal => "peaceful mode (balance goal)",
            GameMode::Hard => "climate crisis mode (survival goal)",
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameMode::Normal => f.write_str("normal"),
            GameMode::Hard => f.write_str("hard"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub mode: GameMode,
    pub initial: PopulationSnapshot,
}

impl SimulationConfig {
    pub fn new(mode: GameMode, initial: PopulationSnapshot) -> Self {
        Self { mode, initial }
    }

    /// Every starting population must lie inside its input range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for organism in Organism::ALL {
            let range = organism.input_range();
            let value = self.initial.get(organism);
            if !range.contains(value) {
                return Err(ConfigError::OutOfRange {
                    organism,
                    value,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }
}

/// Pacing and length of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub total_steps: u32,
    pub tick_interval: Duration,
    pub event_display: Duration,
}

impl RunSettings {
    pub fn for_mode(mode: GameMode) -> Self {
        Self::with_steps(mode, DEFAULT_TOTAL_STEPS)
    }

    /// Spreads the mode's duration evenly over `total_steps` ticks.
    pub fn with_steps(mode: GameMode, total_steps: u32) -> Self {
        let tick_interval = if total_steps == 0 {
            Duration::ZERO
        } else {
            mode.duration() / total_steps
        };
        Self {
            total_steps,
            tick_interval,
            event_display: EVENT_DISPLAY,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_steps == 0 {
            return Err(ConfigError::NoSteps);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_interval_follows_mode_duration() {
        assert_eq!(
            RunSettings::for_mode(GameMode::Normal).tick_interval,
            Duration::from_millis(100)
        );
        assert_eq!(
            RunSettings::for_mode(GameMode::Hard).tick_interval,
            Duration::from_millis(200)
        );
        assert_eq!(RunSettings::for_mode(GameMode::Hard).total_steps, 100);
    }

    #[test]
    fn rejects_out_of_range_start() {
        let config = SimulationConfig::new(
            GameMode::Normal,
            PopulationSnapshot::new(100, 50, 51, 25),
        );
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                organism: Organism::Secondary,
                value: 51,
                min: 0,
                max: 50,
            })
        );
    }

    #[test]
    fn accepts_range_edges() {
        let low = SimulationConfig::new(GameMode::Hard, PopulationSnapshot::zero());
        let high = SimulationConfig::new(GameMode::Hard, PopulationSnapshot::new(200, 100, 50, 100));
        assert!(low.validate().is_ok());
        assert!(high.validate().is_ok());
    }

    #[test]
    fn zero_steps_is_rejected() {
        let settings = RunSettings::with_steps(GameMode::Normal, 0);
        assert_eq!(settings.validate(), Err(ConfigError::NoSteps));
    }

    #[test]
    fn mode_parses_from_yaml() {
        let mode: GameMode = serde_yaml::from_str("hard").unwrap();
        assert_eq!(mode, GameMode::Hard);
    }
}
