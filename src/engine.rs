use tracing::{debug, info};

use crate::{
    config::{GameMode, RunSettings, SimulationConfig},
    disaster::DisasterEvent,
    error::ConfigError,
    rng::RandomSource,
    systems::{DisasterSystem, PopulationSystem},
    verdict::{evaluate, RunResult},
    world::{History, PopulationSnapshot},
};

/// Read-only facts about the tick being computed.
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    pub step: u32,
    pub total_steps: u32,
    pub mode: GameMode,
    pub disaster_fired: bool,
}

/// Scratch state threaded through the systems within one tick.
#[derive(Debug, Clone)]
pub struct TickState {
    pub working: PopulationSnapshot,
    pub event: Option<DisasterEvent>,
}

impl TickState {
    pub fn new(previous: PopulationSnapshot) -> Self {
        Self {
            working: previous,
            event: None,
        }
    }
}

pub trait System: Send {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &TickContext, state: &mut TickState, rng: &mut dyn RandomSource);
}

/// What the caller sees after each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickFrame {
    pub step: u32,
    pub snapshot: PopulationSnapshot,
    pub event: Option<DisasterEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

pub struct SimulationBuilder<R> {
    config: SimulationConfig,
    settings: RunSettings,
    rng: R,
    systems: Vec<Box<dyn System>>,
}

impl<R: RandomSource> SimulationBuilder<R> {
    pub fn new(config: SimulationConfig, rng: R) -> Self {
        Self {
            settings: RunSettings::for_mode(config.mode),
            config,
            rng,
            systems: Vec::new(),
        }
    }

    pub fn settings(mut self, settings: RunSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Disaster roll first, then growth, unless custom systems were added.
    pub fn build(mut self) -> Result<Simulation<R>, ConfigError> {
        self.config.validate()?;
        self.settings.validate()?;
        if self.systems.is_empty() {
            self.systems.push(Box::new(DisasterSystem::new()));
            self.systems.push(Box::new(PopulationSystem::new()));
        }
        Ok(Simulation {
            history: History::starting_at(self.config.initial),
            config: self.config,
            settings: self.settings,
            rng: self.rng,
            systems: self.systems,
            phase: Phase::Idle,
            step: 0,
            disaster: None,
            result: None,
        })
    }
}

/// Owns the mutable state of a single run.
pub struct Simulation<R> {
    config: SimulationConfig,
    settings: RunSettings,
    rng: R,
    systems: Vec<Box<dyn System>>,
    phase: Phase,
    step: u32,
    history: History,
    disaster: Option<DisasterEvent>,
    result: Option<RunResult>,
}

impl<R: RandomSource> Simulation<R> {
    pub fn new(config: SimulationConfig, rng: R) -> Result<Self, ConfigError> {
        SimulationBuilder::new(config, rng).build()
    }

    pub fn builder(config: SimulationConfig, rng: R) -> SimulationBuilder<R> {
        SimulationBuilder::new(config, rng)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_step(&self) -> u32 {
        self.step
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn disaster(&self) -> Option<DisasterEvent> {
        self.disaster
    }

    pub fn result(&self) -> Option<&RunResult> {
        self.result.as_ref()
    }

    /// Advances one tick. Returns `None` once the run has finished.
    pub fn step(&mut self) -> Option<TickFrame> {
        if self.phase == Phase::Finished {
            return None;
        }
        self.phase = Phase::Running;
        self.step += 1;

        let ctx = TickContext {
            step: self.step,
            total_steps: self.settings.total_steps,
            mode: self.config.mode,
            disaster_fired: self.disaster.is_some(),
        };
        let mut state = TickState::new(self.history.latest());
        for system in &mut self.systems {
            system.run(&ctx, &mut state, &mut self.rng);
        }
        if let Some(event) = state.event {
            self.disaster.get_or_insert(event);
        }
        self.history.push(state.working);
        debug!(step = self.step, snapshot = %state.working, "tick committed");

        if self.step >= self.settings.total_steps {
            self.finish();
        }

        Some(TickFrame {
            step: self.step,
            snapshot: state.working,
            event: state.event,
        })
    }

    fn finish(&mut self) {
        self.phase = Phase::Finished;
        let final_snapshot = self.history.latest();
        let evaluation = evaluate(&final_snapshot, self.config.mode);
        info!(
            mode = %self.config.mode,
            verdict = %evaluation.verdict,
            steps = self.step,
            final_snapshot = %final_snapshot,
            "run finished"
        );
        self.result = Some(RunResult {
            mode: self.config.mode,
            verdict: evaluation.verdict,
            feedback: evaluation.feedback,
            final_snapshot,
            history: self.history.clone(),
            disaster: self.disaster,
        });
    }

    /// Runs every remaining tick, handing each frame and the history so far to `hook`.
    pub fn run_with_hook<F>(mut self, mut hook: F) -> RunResult
    where
        F: FnMut(&TickFrame, &History),
    {
        while let Some(frame) = self.step() {
            hook(&frame, &self.history);
        }
        self.into_result()
    }

    pub fn run_to_end(self) -> RunResult {
        self.run_with_hook(|_, _| {})
    }

    /// Finishes any remaining ticks and returns the verdict.
    pub fn into_result(mut self) -> RunResult {
        loop {
            if let Some(result) = self.result.take() {
                return result;
            }
            self.step();
        }
    }
}

impl<R: RandomSource> Iterator for Simulation<R> {
    type Item = TickFrame;

    fn next(&mut self) -> Option<TickFrame> {
        self.step()
    }
}
