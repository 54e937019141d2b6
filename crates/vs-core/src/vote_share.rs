use serde::{Deserialize, Serialize};

use crate::constants::{EPSILON, FALLBACK_SHARE_PCT};
use crate::marginal::AttitudeMarginal;
use crate::outcome::OUTCOME_MATRIX;

/// Vote shares of one segment, as percentages of the decided electorate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentResult {
    pub vote_share_pct_a: f64,
    pub vote_share_pct_b: f64,
    /// Fraction of the joint attitude mass that casts a vote.
    pub turnout_fraction: f64,
    /// Set when nobody turns out and the shares are the 50/50 fallback.
    #[serde(default)]
    pub low_confidence: bool,
}

impl SegmentResult {
    pub fn swapped(self) -> Self {
        Self {
            vote_share_pct_a: self.vote_share_pct_b,
            vote_share_pct_b: self.vote_share_pct_a,
            ..self
        }
    }
}

/// Combine two attitude marginals through the outcome table.
///
/// The A-win mass is summed row-major and the B-win mass column-major, and
/// the abstain mass is the mean of both orders. With the table's exact
/// role-swap symmetry this makes `compute_vote_share(a, b)` the bitwise
/// mirror of `compute_vote_share(b, a)`.
pub fn compute_vote_share(marginal_a: &AttitudeMarginal, marginal_b: &AttitudeMarginal) -> SegmentResult {
    let pa = marginal_a.as_array();
    let pb = marginal_b.as_array();

    let mut vote_a = 0.0;
    let mut abstain_rows = 0.0;
    for i in 0..4 {
        for j in 0..4 {
            let joint = pa[i] * pb[j];
            vote_a += joint * OUTCOME_MATRIX[i][j].a;
            abstain_rows += joint * OUTCOME_MATRIX[i][j].abstain;
        }
    }

    let mut vote_b = 0.0;
    let mut abstain_cols = 0.0;
    for j in 0..4 {
        for i in 0..4 {
            let joint = pa[i] * pb[j];
            vote_b += joint * OUTCOME_MATRIX[i][j].b;
            abstain_cols += joint * OUTCOME_MATRIX[i][j].abstain;
        }
    }
    let abstain = (abstain_rows + abstain_cols) * 0.5;

    // Drift correction: the three masses must describe one electorate.
    let total = vote_a + vote_b + abstain;
    if total <= EPSILON {
        return zero_turnout();
    }
    let vote_a = vote_a / total;
    let vote_b = vote_b / total;
    let turnout = 1.0 - abstain / total;

    if turnout <= EPSILON {
        return zero_turnout();
    }

    SegmentResult {
        vote_share_pct_a: 100.0 * vote_a / turnout,
        vote_share_pct_b: 100.0 * vote_b / turnout,
        turnout_fraction: turnout,
        low_confidence: false,
    }
}

fn zero_turnout() -> SegmentResult {
    SegmentResult {
        vote_share_pct_a: FALLBACK_SHARE_PCT,
        vote_share_pct_b: FALLBACK_SHARE_PCT,
        turnout_fraction: 0.0,
        low_confidence: true,
    }
}
