use tracing::info;

use crate::{
    disaster::DisasterModel,
    engine::{System, TickContext, TickState},
    rng::RandomSource,
};

/// Rolls for the run's disaster and penalizes the working snapshot before growth.
#[derive(Default)]
pub struct DisasterSystem {
    model: DisasterModel,
}

impl DisasterSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for DisasterSystem {
    fn name(&self) -> &str {
        "disaster"
    }

    fn run(&mut self, ctx: &TickContext, state: &mut TickState, rng: &mut dyn RandomSource) {
        let Some(event) = self.model.maybe_trigger(
            ctx.step,
            ctx.total_steps,
            ctx.mode,
            ctx.disaster_fired,
            rng,
        ) else {
            return;
        };
        let before = state.working;
        state.working = event.apply(&before);
        info!(
            step = ctx.step,
            kind = %event.kind,
            before = %before,
            after = %state.working,
            "disaster struck"
        );
        state.event = Some(event);
    }
}
