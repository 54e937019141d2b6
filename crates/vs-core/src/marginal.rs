use serde::{Deserialize, Serialize};

use crate::outcome::Category;

/// Probability distribution over the four attitudes toward one entity.
///
/// Constructed only through [`AttitudeMarginal::from_weights`] or
/// [`build_marginal`], both of which guarantee non-negative entries that
/// sum to 1. Degenerate input collapses to [`AttitudeMarginal::uniform`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttitudeMarginal {
    pub favorable: f64,
    pub neutral: f64,
    pub unfavorable: f64,
    pub unknown: f64,
}

impl AttitudeMarginal {
    /// Equal mass on every attitude.
    pub fn uniform() -> Self {
        Self {
            favorable: 0.25,
            neutral: 0.25,
            unfavorable: 0.25,
            unknown: 0.25,
        }
    }

    /// Normalize raw weights in [`Category::ALL`] order.
    /// Negative or non-finite weights count as zero; a zero total yields uniform.
    pub fn from_weights(weights: [f64; 4]) -> Self {
        let cleaned = weights.map(|w| if w.is_finite() && w > 0.0 { w } else { 0.0 });
        let total: f64 = cleaned.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Self::uniform();
        }
        let [favorable, neutral, unfavorable, unknown] = cleaned.map(|w| w / total);
        Self {
            favorable,
            neutral,
            unfavorable,
            unknown,
        }
    }

    /// Entries in [`Category::ALL`] order.
    pub fn as_array(&self) -> [f64; 4] {
        [self.favorable, self.neutral, self.unfavorable, self.unknown]
    }

    pub fn get(&self, category: Category) -> f64 {
        self.as_array()[category.index()]
    }
}

/// Share of the population that has never heard of the entity.
pub fn unknown_fraction(recognition: f64) -> f64 {
    let r = recognition.clamp(0.0, 1.0);
    (1.0 - r).powi(2)
}

/// Share that has heard of the entity but holds no opinion.
pub fn neutral_fraction(recognition: f64) -> f64 {
    let r = recognition.clamp(0.0, 1.0);
    ((1.0 - unknown_fraction(r)) * (1.0 - r)).max(0.0)
}

/// Turn a normalized recognition in [0, 1] and a favorability in [-1, 1]
/// into an attitude marginal. Out-of-range inputs are clamped; non-finite
/// inputs yield the uniform marginal.
pub fn build_marginal(recognition: f64, favorability: f64) -> AttitudeMarginal {
    if !recognition.is_finite() || !favorability.is_finite() {
        return AttitudeMarginal::uniform();
    }
    let r = recognition.clamp(0.0, 1.0);
    let f = favorability.clamp(-1.0, 1.0);

    let unknown = unknown_fraction(r);
    let neutral = neutral_fraction(r);
    let remainder = (1.0 - unknown - neutral).max(0.0);

    let approval_split = (1.0 + f) / 2.0;
    let favorable = (remainder * approval_split).max(0.0);
    let unfavorable = (remainder - favorable).max(0.0);

    AttitudeMarginal::from_weights([favorable, neutral, unfavorable, unknown])
}
