use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ecobalance::{
    disaster,
    engine::TickFrame,
    rng::RngSource,
    runtime::{self, RunObserver},
    scenario::{Scenario, ScenarioLoader},
    snapshot::{ReportWriter, RunReport},
    verdict::TargetHint,
    GameMode, History, Organism, PopulationSnapshot, RunResult, Simulation,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Ecosystem balance simulator")]
struct Cli {
    /// Path to a scenario YAML file
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Game mode (overrides the scenario)
    #[arg(long, value_enum)]
    mode: Option<GameMode>,

    /// Starting producer population
    #[arg(long)]
    producer: Option<u32>,

    /// Starting primary consumer population
    #[arg(long)]
    primary: Option<u32>,

    /// Starting secondary consumer population
    #[arg(long)]
    secondary: Option<u32>,

    /// Starting decomposer population
    #[arg(long)]
    decomposer: Option<u32>,

    /// Override step count (uses scenario default when omitted)
    #[arg(long)]
    steps: Option<u32>,

    /// Seed for a reproducible disaster roll
    #[arg(long)]
    seed: Option<u64>,

    /// Pace the run in real time (10 s normal, 20 s hard); Ctrl+C cancels
    #[arg(long)]
    realtime: bool,

    /// Directory for JSON run reports
    #[arg(long)]
    report_dir: Option<PathBuf>,
}

impl Cli {
    fn scenario(&self) -> Result<Scenario> {
        let mut scenario = match &self.scenario {
            Some(path) => ScenarioLoader::new(".").load(path)?,
            None => Scenario::custom(GameMode::default(), PopulationSnapshot::suggested()),
        };
        if let Some(mode) = self.mode {
            scenario.mode = mode;
        }
        for (organism, value) in [
            (Organism::Producer, self.producer),
            (Organism::Primary, self.primary),
            (Organism::Secondary, self.secondary),
            (Organism::Decomposer, self.decomposer),
        ] {
            if let Some(value) = value {
                scenario.populations = scenario.populations.with(organism, value);
            }
        }
        if self.seed.is_some() {
            scenario.seed = self.seed;
        }
        Ok(scenario)
    }
}

struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn on_tick(&mut self, frame: &TickFrame, _history: &History) {
        print_frame(frame);
    }

    fn on_event_cleared(&mut self, event: &disaster::DisasterEvent) {
        println!("        ({} has passed)", event.name());
    }

    fn on_finish(&mut self, _result: &RunResult) {}
}

fn print_frame(frame: &TickFrame) {
    if let Some(event) = frame.event {
        let affected: Vec<_> = disaster::affected(event.kind)
            .into_iter()
            .map(Organism::key)
            .collect();
        println!(
            "!!! step {:>3}: {} - {} (hits {})",
            frame.step,
            event.name(),
            event.description(),
            affected.join(", ")
        );
    }
    println!("step {:>3}: {}", frame.step, frame.snapshot);
}

fn print_result(result: &RunResult) {
    println!();
    println!("{}: {}", result.verdict, result.headline());
    println!("{}", result.feedback);
    println!("final: {}", result.final_snapshot);
    if let Some(event) = result.disaster {
        println!("disaster: {} at step {}", event.name(), event.step);
    }
    if !result.is_success() {
        println!("{}", TargetHint::for_mode(result.mode));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let scenario = cli.scenario()?;
    let config = scenario.config();
    let settings = scenario.settings(cli.steps);
    let rng = match scenario.seed {
        Some(seed) => RngSource::seeded(seed),
        None => RngSource::from_entropy(),
    };
    info!(
        scenario = %scenario.name,
        mode = %config.mode,
        start = %config.initial,
        steps = settings.total_steps,
        "starting run ({})",
        config.mode.label()
    );

    let result = if cli.realtime {
        let mut handle = runtime::start_run(config, settings, rng, ConsoleObserver)?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                handle.finished().await?;
                println!("Run cancelled.");
                return Ok(());
            }
            finished = handle.finished() => finished?,
        }
    } else {
        Some(
            Simulation::builder(config, rng)
                .settings(settings)
                .build()?
                .run_with_hook(|frame, _| print_frame(frame)),
        )
    };

    let Some(result) = result else {
        return Ok(());
    };
    print_result(&result);

    if let Some(dir) = cli.report_dir {
        let report = RunReport::new(&scenario.name, scenario.seed, &result);
        let path = ReportWriter::new(dir).write(&report)?;
        println!("report: {}", path.display());
    }
    Ok(())
}
