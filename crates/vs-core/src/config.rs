use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BONUS_MULTIPLIER, DEFAULT_RECOGNITION_SCALE};

/// How a national tally with equal unit totals is resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Leave the national winner empty.
    #[default]
    Unresolved,
    /// Award the tie to the lexicographically smallest entity identifier.
    Lexicographic,
}

/// Kernel parameters. Every field has a default, so a partial config file
/// only overrides what it names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Scale of the demographic favorability tilt, clamped into [0, 1].
    pub bonus_multiplier: f64,
    /// Raw recognition value that maps to full recognition.
    pub recognition_scale: f64,
    pub tie_break: TieBreak,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            bonus_multiplier: DEFAULT_BONUS_MULTIPLIER,
            recognition_scale: DEFAULT_RECOGNITION_SCALE,
            tie_break: TieBreak::Unresolved,
        }
    }
}
