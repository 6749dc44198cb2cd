//! Trophic levels and the per-organism constants tables.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Organism {
    Producer,
    Primary,
    Secondary,
    Decomposer,
}

/// Range offered to the player when configuring a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRange {
    pub min: u32,
    pub max: u32,
    /// Advisory increment for input widgets; not enforced by validation.
    pub step: u32,
}

impl InputRange {
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl Organism {
    pub const ALL: [Organism; 4] = [
        Organism::Producer,
        Organism::Primary,
        Organism::Secondary,
        Organism::Decomposer,
    ];

    pub fn index(self) -> usize {
        match self {
            Organism::Producer => 0,
            Organism::Primary => 1,
            Organism::Secondary => 2,
            Organism::Decomposer => 3,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Organism::Producer => "producer",
            Organism::Primary => "primary",
            Organism::Secondary => "secondary",
            Organism::Decomposer => "decomposer",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Organism::Producer => "Producer",
            Organism::Primary => "Primary consumer",
            Organism::Secondary => "Secondary consumer",
            Organism::Decomposer => "Decomposer",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Organism::Producer => "Plants that make their own nutrients",
            Organism::Primary => "Herbivores that eat producers",
            Organism::Secondary => "Carnivores that eat primary consumers",
            Organism::Decomposer => "Microbes that break down dead organisms",
        }
    }

    /// Upper bound every simulated population is clamped to.
    pub fn cap(self) -> u32 {
        match self {
            Organism::Producer => 500,
            Organism::Primary => 300,
            Organism::Secondary => 100,
            Organism::Decomposer => 200,
        }
    }

    pub fn input_range(self) -> InputRange {
        match self {
            Organism::Producer => InputRange { min: 0, max: 200, step: 5 },
            Organism::Primary => InputRange { min: 0, max: 100, step: 1 },
            Organism::Secondary => InputRange { min: 0, max: 50, step: 1 },
            Organism::Decomposer => InputRange { min: 0, max: 100, step: 5 },
        }
    }

    /// Rounds a raw population to the nearest integer and clamps it into `[0, cap]`.
    pub fn clamp(self, raw: f64) -> u32 {
        let rounded = raw.round();
        if rounded <= 0.0 {
            0
        } else {
            rounded.min(f64::from(self.cap())) as u32
        }
    }
}

impl std::fmt::Display for Organism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Fixed-size table keyed by [`Organism`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OrganismTable<T>([T; 4]);

impl<T> OrganismTable<T> {
    pub const fn new(values: [T; 4]) -> Self {
        Self(values)
    }

    pub fn from_fn(mut f: impl FnMut(Organism) -> T) -> Self {
        Self(Organism::ALL.map(&mut f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Organism, &T)> {
        Organism::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(Organism, &T) -> U) -> OrganismTable<U> {
        OrganismTable::from_fn(|organism| f(organism, &self[organism]))
    }
}

impl<T> Index<Organism> for OrganismTable<T> {
    type Output = T;

    fn index(&self, organism: Organism) -> &T {
        &self.0[organism.index()]
    }
}

impl<T> IndexMut<Organism> for OrganismTable<T> {
    fn index_mut(&mut self, organism: Organism) -> &mut T {
        &mut self.0[organism.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_rounds_and_bounds() {
        assert_eq!(Organism::Producer.clamp(99.5), 100);
        assert_eq!(Organism::Producer.clamp(99.49), 99);
        assert_eq!(Organism::Producer.clamp(-12.0), 0);
        assert_eq!(Organism::Producer.clamp(-0.5), 0);
        assert_eq!(Organism::Producer.clamp(812.3), 500);
        assert_eq!(Organism::Primary.clamp(300.4), 300);
        assert_eq!(Organism::Secondary.clamp(1e9), 100);
        assert_eq!(Organism::Decomposer.clamp(200.6), 200);
    }

    #[test]
    fn clamp_is_idempotent() {
        for organism in Organism::ALL {
            for raw in [-40.0, -0.4, 0.0, 3.5, 57.2, 199.9, 250.0, 499.5, 10_000.0] {
                let once = organism.clamp(raw);
                assert_eq!(organism.clamp(f64::from(once)), once, "{organism} at {raw}");
            }
        }
    }

    #[test]
    fn input_ranges_fit_inside_caps() {
        for organism in Organism::ALL {
            let range = organism.input_range();
            assert!(range.min <= range.max);
            assert!(range.max <= organism.cap());
        }
    }

    #[test]
    fn table_indexes_by_organism() {
        let mut table = OrganismTable::from_fn(Organism::cap);
        assert_eq!(table[Organism::Secondary], 100);
        table[Organism::Secondary] = 7;
        let keys: Vec<_> = table.iter().map(|(o, v)| (o.key(), *v)).collect();
        assert_eq!(
            keys,
            vec![("producer", 500), ("primary", 300), ("secondary", 7), ("decomposer", 200)]
        );
    }
}
