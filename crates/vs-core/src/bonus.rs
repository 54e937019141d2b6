//! Demographic favorability tilt.
//!
//! A similarity provider scores how closely each entity resembles a
//! demographic profile. The kernel only consumes those scalars: the
//! difference between the two sides becomes a bounded, zero-sum nudge to
//! base favorability within that segment.

use serde::{Deserialize, Serialize};

use crate::constants::{
    AMPLIFICATION_GAIN, HIGH_CONFIDENCE_MARGIN, MEDIUM_CONFIDENCE_MARGIN,
};
use crate::region::Side;

/// Zero-sum favorability tilt: `a == -b` and `|a| <= multiplier`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bonus {
    pub a: f64,
    pub b: f64,
}

impl Bonus {
    pub fn neutral() -> Self {
        Self { a: 0.0, b: 0.0 }
    }

    /// Add the tilt to base favorabilities, clamping each to [-1, 1].
    pub fn apply(&self, favorability_a: f64, favorability_b: f64) -> (f64, f64) {
        (
            (favorability_a + self.a).clamp(-1.0, 1.0),
            (favorability_b + self.b).clamp(-1.0, 1.0),
        )
    }

    pub fn swapped(self) -> Self {
        Self {
            a: self.b,
            b: self.a,
        }
    }
}

/// Compute the tilt from a pair of similarity scores.
///
/// Missing or non-finite similarity on either side means no tilt. The
/// multiplier is clamped into [0, 1].
pub fn compute_bonus(similarity_a: Option<f64>, similarity_b: Option<f64>, multiplier: f64) -> Bonus {
    let (Some(sim_a), Some(sim_b)) = (similarity_a, similarity_b) else {
        return Bonus::neutral();
    };
    if !sim_a.is_finite() || !sim_b.is_finite() {
        return Bonus::neutral();
    }
    let m = if multiplier.is_finite() {
        multiplier.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let a = ((sim_a - sim_b) * m).clamp(-m, m);
    Bonus { a, b: -a }
}

/// Spread raw cosine similarities of one entity across several
/// demographic profiles into [0, 1] scores, emphasizing each profile's
/// distance from the entity's mean similarity.
pub fn amplify_similarities(raw: &[f64]) -> Vec<f64> {
    if raw.is_empty() {
        return Vec::new();
    }
    let mean = raw.iter().sum::<f64>() / raw.len() as f64;
    raw.iter()
        .map(|s| ((s - mean) * AMPLIFICATION_GAIN).tanh() * 0.5 + 0.5)
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Which side a segment's similarity scores lean toward.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentPreference {
    /// `None` when both similarities are identical.
    pub preferred: Option<Side>,
    pub margin: f64,
    pub confidence: Confidence,
}

pub fn segment_preference(similarity_a: f64, similarity_b: f64) -> SegmentPreference {
    let margin = (similarity_a - similarity_b).abs();
    let preferred = if similarity_a > similarity_b {
        Some(Side::A)
    } else if similarity_b > similarity_a {
        Some(Side::B)
    } else {
        None
    };
    let confidence = if margin > HIGH_CONFIDENCE_MARGIN {
        Confidence::High
    } else if margin > MEDIUM_CONFIDENCE_MARGIN {
        Confidence::Medium
    } else {
        Confidence::Low
    };
    SegmentPreference {
        preferred,
        margin,
        confidence,
    }
}
