//! End-of-run scoring.
//!
//! The extinction thresholds are deliberately uneven: producers and primary
//! consumers fail at 5 or fewer, secondary consumers only at 1 or fewer.

use serde::{Deserialize, Serialize};

use crate::config::GameMode;
use crate::disaster::DisasterEvent;
use crate::world::{History, PopulationSnapshot};

pub const GOLDEN_RATIO: PopulationSnapshot = PopulationSnapshot::new(100, 50, 10, 25);
pub const SUCCESS_TOLERANCE: u32 = 15;
/// Normal mode accepts twice the base tolerance.
pub const BALANCE_LIMIT: u32 = SUCCESS_TOLERANCE * 2;

const EXTINCTION_THRESHOLD: u32 = 5;
const STARVATION_THRESHOLD: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Success,
    Failure,
}

impl Verdict {
    pub fn is_success(self) -> bool {
        self == Verdict::Success
    }

    pub fn headline(self, mode: GameMode) -> &'static str {
        match (self, mode) {
            (Verdict::Success, GameMode::Normal) => {
                "A perfect golden balance! The ecosystem stays stable."
            }
            (Verdict::Success, GameMode::Hard) => {
                "You survived! A resilient ecosystem that weathered the disaster."
            }
            (Verdict::Failure, GameMode::Normal) => "The ecosystem lost its balance.",
            (Verdict::Failure, GameMode::Hard) => {
                "Some species went extinct and the ecosystem collapsed."
            }
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Success => f.write_str("success"),
            Verdict::Failure => f.write_str("failure"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "mode", rename_all = "kebab-case")]
pub enum Feedback {
    Thriving(GameMode),
    ProducerExtinction,
    PrimaryExtinction,
    SecondaryStarvation,
    BalanceCollapsed(GameMode),
}

impl Feedback {
    pub fn message(self) -> &'static str {
        match self {
            Feedback::Thriving(GameMode::Normal) => {
                "Perfect! Every species is living together in harmony."
            }
            Feedback::Thriving(GameMode::Hard) => {
                "The ecosystem survived the catastrophe! A triumph of stubborn life."
            }
            Feedback::ProducerExtinction => {
                "Failure: the grass went extinct. Plant more producers to prepare for climate disasters."
            }
            Feedback::PrimaryExtinction => {
                "Failure: the rabbits went extinct. There were too many foxes or too little food."
            }
            Feedback::SecondaryStarvation => {
                "Failure: the foxes starved. The base of the food chain has to be strong."
            }
            Feedback::BalanceCollapsed(GameMode::Normal) => {
                "The balance collapsed. Remember the pyramid: producers > primary > secondary consumers."
            }
            Feedback::BalanceCollapsed(GameMode::Hard) => {
                "The balance collapsed. In climate crisis mode the goal is that nothing goes extinct."
            }
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub feedback: Feedback,
}

pub fn has_extinction(snapshot: &PopulationSnapshot) -> bool {
    snapshot.producer() <= EXTINCTION_THRESHOLD
        || snapshot.primary() <= EXTINCTION_THRESHOLD
        || snapshot.secondary() <= STARVATION_THRESHOLD
}

pub fn evaluate(final_snapshot: &PopulationSnapshot, mode: GameMode) -> Evaluation {
    let extinct = has_extinction(final_snapshot);
    let success = match mode {
        GameMode::Hard => !extinct,
        GameMode::Normal => !extinct && final_snapshot.distance_to(&GOLDEN_RATIO) <= BALANCE_LIMIT,
    };

    if success {
        return Evaluation {
            verdict: Verdict::Success,
            feedback: Feedback::Thriving(mode),
        };
    }

    let feedback = if final_snapshot.producer() <= EXTINCTION_THRESHOLD {
        Feedback::ProducerExtinction
    } else if final_snapshot.primary() <= EXTINCTION_THRESHOLD {
        Feedback::PrimaryExtinction
    } else if final_snapshot.secondary() <= STARVATION_THRESHOLD {
        Feedback::SecondaryStarvation
    } else {
        Feedback::BalanceCollapsed(mode)
    };
    Evaluation {
        verdict: Verdict::Failure,
        feedback,
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub mode: GameMode,
    pub verdict: Verdict,
    pub feedback: Feedback,
    pub final_snapshot: PopulationSnapshot,
    pub history: History,
    pub disaster: Option<DisasterEvent>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.verdict.is_success()
    }

    pub fn headline(&self) -> &'static str {
        self.verdict.headline(self.mode)
    }

    pub fn distance_to_target(&self) -> u32 {
        self.final_snapshot.distance_to(&GOLDEN_RATIO)
    }
}

/// Recommended value for one organism on the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HintValue {
    Exact(u32),
    AtLeast(u32),
    Between(u32, u32),
}

impl std::fmt::Display for HintValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HintValue::Exact(value) => write!(f, "{value}"),
            HintValue::AtLeast(value) => write!(f, "{value}+"),
            HintValue::Between(low, high) => write!(f, "{low}~{high}"),
        }
    }
}

/// Target shown after a failed run: the golden ratio in normal mode, a
/// survival tip in hard mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetHint {
    pub title: &'static str,
    pub producer: HintValue,
    pub primary: HintValue,
    pub secondary: HintValue,
    pub decomposer: HintValue,
    pub note: Option<&'static str>,
}

impl TargetHint {
    pub fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::Normal => Self {
                title: "Golden ratio revealed",
                producer: HintValue::Exact(GOLDEN_RATIO.producer()),
                primary: HintValue::Exact(GOLDEN_RATIO.primary()),
                secondary: HintValue::Exact(GOLDEN_RATIO.secondary()),
                decomposer: HintValue::Exact(GOLDEN_RATIO.decomposer()),
                note: None,
            },
            GameMode::Hard => Self {
                title: "Recommended ratio for surviving the climate crisis",
                producer: HintValue::AtLeast(120),
                primary: HintValue::Between(40, 50),
                secondary: HintValue::Exact(GOLDEN_RATIO.secondary()),
                decomposer: HintValue::Exact(GOLDEN_RATIO.decomposer()),
                note: Some("Prepare plenty of producers for disasters!"),
            },
        }
    }
}

impl std::fmt::Display for TargetHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: producer {}, primary {}, secondary {}, decomposer {}",
            self.title, self.producer, self.primary, self.secondary, self.decomposer
        )?;
        if let Some(note) = self.note {
            write!(f, " ({note})")?;
        }
        Ok(())
    }
}
