use crate::{
    engine::{System, TickContext, TickState},
    organism::{Organism, OrganismTable},
    rng::RandomSource,
    world::PopulationSnapshot,
};

/// One explicit Euler step of the coupled logistic / predation model,
/// rounded and clamped per organism.
pub fn update(prev: &PopulationSnapshot) -> PopulationSnapshot {
    let p = f64::from(prev.producer());
    let c1 = f64::from(prev.primary());
    let c2 = f64::from(prev.secondary());
    let d = f64::from(prev.decomposer());

    let producer_growth = 0.2 * p * (1.0 - p / 500.0);
    let grazing = 0.32 * c1;
    let dp = producer_growth - grazing;

    let primary_growth = 0.1 * c1 * (p / 100.0);
    let predation = 0.5 * c2;
    let dc1 = primary_growth - predation;

    let secondary_growth = 0.1 * c2 * (c1 / 50.0);
    let secondary_death = 0.1 * c2;
    let dc2 = secondary_growth - secondary_death;

    // Decomposers relax toward a share of living biomass.
    let target_d = (p + c1 + c2) * 0.15;
    let dd = (target_d - d) * 0.1;

    let raw = OrganismTable::new([p + dp, c1 + dc1, c2 + dc2, d + dd]);
    PopulationSnapshot::from_table(OrganismTable::from_fn(|organism: Organism| {
        organism.clamp(raw[organism])
    }))
}

pub struct PopulationSystem;

impl PopulationSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PopulationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for PopulationSystem {
    fn name(&self) -> &str {
        "population"
    }

    fn run(&mut self, _ctx: &TickContext, state: &mut TickState, _rng: &mut dyn RandomSource) {
        state.working = update(&state.working);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_ratio_is_a_fixed_point() {
        let golden = PopulationSnapshot::new(100, 50, 10, 25);
        assert_eq!(update(&golden), golden);
    }

    #[test]
    fn update_is_pure() {
        let prev = PopulationSnapshot::new(137, 41, 9, 60);
        assert_eq!(update(&prev), update(&prev));
    }

    #[test]
    fn first_steps_match_hand_computation() {
        // dP = 0.2*50*0.9 - 0.32*30 = -0.6, dC1 = 1.5 - 5 = -3.5,
        // dC2 = 0.1*10*0.6 - 1 = -0.4, dD = (13.5 - 20)*0.1 = -0.65
        assert_eq!(
            update(&PopulationSnapshot::suggested()),
            PopulationSnapshot::new(49, 27, 10, 19)
        );
    }

    #[test]
    fn producer_without_plants_stays_extinct() {
        let next = update(&PopulationSnapshot::new(0, 30, 10, 20));
        assert_eq!(next.producer(), 0);
        assert_eq!(next, PopulationSnapshot::new(0, 25, 10, 19));
    }

    #[test]
    fn results_are_clamped_to_caps() {
        let crowded = PopulationSnapshot::new(500, 300, 100, 200);
        assert!(update(&crowded).is_within_caps());
        let empty = PopulationSnapshot::zero();
        assert_eq!(update(&empty), empty);
    }
}
