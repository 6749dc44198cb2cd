//! JSON export of finished runs.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::{
    config::GameMode,
    disaster::DisasterEvent,
    verdict::{Feedback, RunResult, TargetHint, Verdict},
    world::{History, PopulationSnapshot},
};

#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub scenario: &'a str,
    pub mode: GameMode,
    pub seed: Option<u64>,
    pub generated_at: DateTime<Utc>,
    pub verdict: Verdict,
    pub headline: &'static str,
    pub feedback: Feedback,
    pub feedback_message: &'static str,
    pub distance_to_target: u32,
    pub hint: Option<TargetHint>,
    pub disaster: Option<DisasterEvent>,
    pub final_snapshot: PopulationSnapshot,
    pub history: &'a History,
}

impl<'a> RunReport<'a> {
    pub fn new(scenario: &'a str, seed: Option<u64>, result: &'a RunResult) -> Self {
        Self {
            scenario,
            mode: result.mode,
            seed,
            generated_at: Utc::now(),
            verdict: result.verdict,
            headline: result.headline(),
            feedback: result.feedback,
            feedback_message: result.feedback.message(),
            distance_to_target: result.distance_to_target(),
            hint: (!result.is_success()).then(|| TargetHint::for_mode(result.mode)),
            disaster: result.disaster,
            final_snapshot: result.final_snapshot,
            history: &result.history,
        }
    }
}

pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Writes `<dir>/<scenario>/<mode>_<timestamp>.json` and returns its path.
    pub fn write(&self, report: &RunReport<'_>) -> Result<PathBuf> {
        let dir = self.scenario_dir(report.scenario)?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create report directory {}", dir.display()))?;
        let file_name = format!(
            "{}_{}.json",
            report.mode,
            report.generated_at.format("%Y%m%dT%H%M%S%3f")
        );
        let path = dir.join(file_name);
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!(path = %path.display(), "run report written");
        Ok(path)
    }

    /// Scenario names come from YAML; only a single plain path segment may
    /// be used under the output directory.
    fn scenario_dir(&self, scenario: &str) -> Result<PathBuf> {
        let mut components = Path::new(scenario).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.output_dir.join(name)),
            _ => bail!("Scenario name {scenario:?} cannot be used as a report directory"),
        }
    }
}
