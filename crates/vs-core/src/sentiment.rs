//! Favorability inputs from sentiment sources.
//!
//! Sentiment providers report compound scores in [-1, 1] per source. These
//! helpers combine weighted sources into one favorability baseline and
//! describe a pair of baselines for display.

use serde::{Deserialize, Serialize};

use crate::region::{Side, decide_winner};

/// Weighted mean of `(score, weight)` pairs, clamped to [-1, 1].
/// Empty input, non-positive total weight, or non-finite entries give 0.
pub fn weighted_average(scores: &[(f64, f64)]) -> f64 {
    let usable = scores
        .iter()
        .filter(|(s, w)| s.is_finite() && w.is_finite() && *w > 0.0);
    let (sum, total) = usable.fold((0.0_f64, 0.0_f64), |(sum, total), (s, w)| (sum + s * w, total + w));
    if total <= 0.0 {
        return 0.0;
    }
    (sum / total).clamp(-1.0, 1.0)
}

/// Five-way bucket for a compound sentiment score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentCategory {
    VeryPositive,
    Positive,
    Neutral,
    Negative,
    VeryNegative,
}

impl SentimentCategory {
    pub fn classify(score: f64) -> Self {
        if score >= 0.15 {
            Self::VeryPositive
        } else if score >= 0.05 {
            Self::Positive
        } else if score >= -0.05 {
            Self::Neutral
        } else if score >= -0.15 {
            Self::Negative
        } else {
            Self::VeryNegative
        }
    }
}

/// Side-by-side description of two favorability baselines.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSummary {
    pub score_a: f64,
    pub score_b: f64,
    pub category_a: SentimentCategory,
    pub category_b: SentimentCategory,
    /// Side with the strictly higher score.
    pub leader: Option<Side>,
    pub margin: f64,
    /// Whether the combined mood toward both entities is positive.
    pub positive_overall: bool,
}

impl SentimentSummary {
    pub fn new(score_a: f64, score_b: f64) -> Self {
        Self {
            score_a,
            score_b,
            category_a: SentimentCategory::classify(score_a),
            category_b: SentimentCategory::classify(score_b),
            leader: decide_winner(score_a, score_b),
            margin: (score_a - score_b).abs(),
            positive_overall: score_a + score_b > 0.0,
        }
    }
}
