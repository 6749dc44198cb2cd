use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::EmptyHistory;
use crate::organism::{Organism, OrganismTable};

/// Population counts for every trophic level at one simulated step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "SnapshotFields", into = "SnapshotFields")]
pub struct PopulationSnapshot {
    counts: OrganismTable<u32>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotFields {
    producer: u32,
    primary: u32,
    secondary: u32,
    decomposer: u32,
}

impl From<SnapshotFields> for PopulationSnapshot {
    fn from(value: SnapshotFields) -> Self {
        Self::new(value.producer, value.primary, value.secondary, value.decomposer)
    }
}

impl From<PopulationSnapshot> for SnapshotFields {
    fn from(value: PopulationSnapshot) -> Self {
        Self {
            producer: value.producer(),
            primary: value.primary(),
            secondary: value.secondary(),
            decomposer: value.decomposer(),
        }
    }
}

impl PopulationSnapshot {
    pub const fn new(producer: u32, primary: u32, secondary: u32, decomposer: u32) -> Self {
        Self {
            counts: OrganismTable::new([producer, primary, secondary, decomposer]),
        }
    }

    pub const fn zero() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Starting point offered to new players. Intentionally off the golden ratio.
    pub const fn suggested() -> Self {
        Self::new(50, 30, 10, 20)
    }

    pub fn from_table(counts: OrganismTable<u32>) -> Self {
        Self { counts }
    }

    pub fn get(&self, organism: Organism) -> u32 {
        self.counts[organism]
    }

    pub fn with(mut self, organism: Organism, value: u32) -> Self {
        self.counts[organism] = value;
        self
    }

    pub fn producer(&self) -> u32 {
        self.counts[Organism::Producer]
    }

    pub fn primary(&self) -> u32 {
        self.counts[Organism::Primary]
    }

    pub fn secondary(&self) -> u32 {
        self.counts[Organism::Secondary]
    }

    pub fn decomposer(&self) -> u32 {
        self.counts[Organism::Decomposer]
    }

    /// Living biomass the decomposers feed on.
    pub fn total_biomass(&self) -> u32 {
        self.producer() + self.primary() + self.secondary()
    }

    /// Sum of absolute differences over producer, primary and secondary.
    /// Decomposers do not count toward the balance score.
    pub fn distance_to(&self, target: &PopulationSnapshot) -> u32 {
        [Organism::Producer, Organism::Primary, Organism::Secondary]
            .into_iter()
            .map(|organism| self.get(organism).abs_diff(target.get(organism)))
            .sum()
    }

    pub fn is_within_caps(&self) -> bool {
        self.counts
            .iter()
            .all(|(organism, value)| *value <= organism.cap())
    }
}

impl Index<Organism> for PopulationSnapshot {
    type Output = u32;

    fn index(&self, organism: Organism) -> &u32 {
        &self.counts[organism]
    }
}

impl std::fmt::Display for PopulationSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "producer={} primary={} secondary={} decomposer={}",
            self.producer(),
            self.primary(),
            self.secondary(),
            self.decomposer()
        )
    }
}

/// Append-only record of every snapshot in a run, starting with the configured one.
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PopulationSnapshot>", into = "Vec<PopulationSnapshot>")]
pub struct History {
    snapshots: Vec<PopulationSnapshot>,
}

impl TryFrom<Vec<PopulationSnapshot>> for History {
    type Error = EmptyHistory;

    fn try_from(snapshots: Vec<PopulationSnapshot>) -> Result<Self, Self::Error> {
        if snapshots.is_empty() {
            return Err(EmptyHistory);
        }
        Ok(Self { snapshots })
    }
}

impl From<History> for Vec<PopulationSnapshot> {
    fn from(history: History) -> Self {
        history.snapshots
    }
}

impl History {
    pub(crate) fn starting_at(initial: PopulationSnapshot) -> Self {
        Self {
            snapshots: vec![initial],
        }
    }

    pub(crate) fn push(&mut self, snapshot: PopulationSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn initial(&self) -> PopulationSnapshot {
        self.snapshots[0]
    }

    pub fn latest(&self) -> PopulationSnapshot {
        self.snapshots[self.snapshots.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn as_slice(&self) -> &[PopulationSnapshot] {
        &self.snapshots
    }

    pub fn iter(&self) -> impl Iterator<Item = &PopulationSnapshot> {
        self.snapshots.iter()
    }
}
