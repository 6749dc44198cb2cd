use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    config::{GameMode, RunSettings, SimulationConfig, DEFAULT_TOTAL_STEPS},
    world::PopulationSnapshot,
};

/// A named starting setup, loaded from YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default)]
    pub steps: Option<u32>,
    #[serde(default)]
    pub seed: Option<u64>,
    pub populations: PopulationSnapshot,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        Scenario::from_yaml(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn config(&self) -> SimulationConfig {
        SimulationConfig::new(self.mode, self.populations)
    }

    pub fn settings(&self, override_steps: Option<u32>) -> RunSettings {
        let steps = override_steps.or(self.steps).unwrap_or(DEFAULT_TOTAL_STEPS);
        RunSettings::with_steps(self.mode, steps)
    }

    /// Ad-hoc scenario for runs configured entirely on the command line.
    pub fn custom(mode: GameMode, populations: PopulationSnapshot) -> Self {
        Self {
            name: "custom".into(),
            description: None,
            mode,
            steps: None,
            seed: None,
            populations,
        }
    }
}
