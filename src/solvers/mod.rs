use std::fmt::Display;

use clap::ValueEnum;

pub mod node;
pub mod trainer;

pub use node::{
    Node,
    NodeMap,
};
pub use trainer::Trainer;

/// Which CFR recursion the trainer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Vanilla CFR; chance nodes are expanded inside the recursion.
    Standard,
    /// Chance-sampling CFR; one deal is sampled per iteration.
    Chance,
    /// External-sampling MCCFR.
    External,
    /// Outcome-sampling MCCFR.
    Outcome,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Standard => "standard",
            Mode::Chance => "chance",
            Mode::External => "external",
            Mode::Outcome => "outcome",
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
