//! Climate disasters for hard mode.
//!
//! At most one disaster fires per run, and only inside the danger window in
//! the middle of the run so the ecosystem has time to recover before scoring.

use serde::{Deserialize, Serialize};

use crate::config::GameMode;
use crate::organism::{Organism, OrganismTable};
use crate::rng::RandomSource;
use crate::world::PopulationSnapshot;

const DISASTER_CHANCE: f64 = 0.05;
pub const WINDOW_START_FRACTION: f64 = 0.2;
pub const WINDOW_END_FRACTION: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisasterKind {
    Drought,
    Flood,
    Typhoon,
    InvasiveSpecies,
}

impl DisasterKind {
    pub const ALL: [DisasterKind; 4] = [
        DisasterKind::Drought,
        DisasterKind::Flood,
        DisasterKind::Typhoon,
        DisasterKind::InvasiveSpecies,
    ];

    /// Picks a kind from a uniform roll in `[0, 1)` using quarter thresholds.
    pub fn from_roll(roll: f64) -> Self {
        if roll < 0.25 {
            DisasterKind::Drought
        } else if roll < 0.5 {
            DisasterKind::Flood
        } else if roll < 0.75 {
            DisasterKind::Typhoon
        } else {
            DisasterKind::InvasiveSpecies
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DisasterKind::Drought => "Severe drought",
            DisasterKind::Flood => "Great flood",
            DisasterKind::Typhoon => "Powerful typhoon",
            DisasterKind::InvasiveSpecies => "Invasive species arrival",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DisasterKind::Drought => "No rain is falling and the plants are withering!",
            DisasterKind::Flood => "Rising water sweeps across the land!",
            DisasterKind::Typhoon => "Gale-force winds batter the whole ecosystem!",
            DisasterKind::InvasiveSpecies => {
                "An invader with no natural predators threatens native species!"
            }
        }
    }

    /// Multiplicative survival factor per organism. `None` leaves it untouched.
    pub fn penalties(self) -> OrganismTable<Option<f64>> {
        match self {
            DisasterKind::Drought => OrganismTable::new([Some(0.85), None, None, None]),
            DisasterKind::Flood => OrganismTable::new([Some(0.9), None, None, Some(0.8)]),
            DisasterKind::Typhoon => OrganismTable::new([Some(0.9), Some(0.9), Some(0.95), None]),
            DisasterKind::InvasiveSpecies => {
                OrganismTable::new([None, Some(0.85), Some(0.95), None])
            }
        }
    }
}

impl std::fmt::Display for DisasterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisasterEvent {
    pub kind: DisasterKind,
    pub step: u32,
}

impl DisasterEvent {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn description(&self) -> &'static str {
        self.kind.description()
    }

    /// Applies this event's penalties, flooring each affected count.
    pub fn apply(&self, snapshot: &PopulationSnapshot) -> PopulationSnapshot {
        apply_penalty(snapshot, &self.kind.penalties())
    }
}

pub fn apply_penalty(
    snapshot: &PopulationSnapshot,
    factors: &OrganismTable<Option<f64>>,
) -> PopulationSnapshot {
    PopulationSnapshot::from_table(factors.map(|organism, factor| {
        let value = snapshot.get(organism);
        match factor {
            Some(factor) => penalize(value, *factor),
            None => value,
        }
    }))
}

fn penalize(value: u32, factor: f64) -> u32 {
    let scaled = (f64::from(value) * factor).floor();
    if scaled <= 0.0 {
        0
    } else {
        (scaled as u32).min(value)
    }
}

/// Open interval of steps in which a disaster may fire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DangerWindow {
    pub start: f64,
    pub end: f64,
}

impl DangerWindow {
    pub fn for_run(total_steps: u32) -> Self {
        let total = f64::from(total_steps);
        Self {
            start: total * WINDOW_START_FRACTION,
            end: total * WINDOW_END_FRACTION,
        }
    }

    pub fn contains(&self, step: u32) -> bool {
        let step = f64::from(step);
        step > self.start && step < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisasterModel;

impl DisasterModel {
    /// Rolls for a disaster at `step`. Draws nothing outside hard mode, after
    /// the run's disaster has fired, or outside the danger window.
    pub fn maybe_trigger(
        &self,
        step: u32,
        total_steps: u32,
        mode: GameMode,
        already_fired: bool,
        rng: &mut dyn RandomSource,
    ) -> Option<DisasterEvent> {
        if mode != GameMode::Hard || already_fired {
            return None;
        }
        if !DangerWindow::for_run(total_steps).contains(step) {
            return None;
        }
        if rng.next_unit() >= DISASTER_CHANCE {
            return None;
        }
        let kind = DisasterKind::from_roll(rng.next_unit());
        Some(DisasterEvent { kind, step })
    }
}

pub fn affected(kind: DisasterKind) -> Vec<Organism> {
    kind.penalties()
        .iter()
        .filter(|(_, factor)| factor.is_some())
        .map(|(organism, _)| organism)
        .collect()
}
