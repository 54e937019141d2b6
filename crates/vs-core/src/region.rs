use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bonus::{Bonus, compute_bonus};
use crate::config::SimulationConfig;
use crate::constants::{EPSILON, FALLBACK_SHARE_PCT};
use crate::marginal::{AttitudeMarginal, build_marginal};
use crate::recognition::normalize_recognition;
use crate::vote_share::{SegmentResult, compute_vote_share};

/// One of the two entities being compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Select the value belonging to this side.
    pub fn pick<T>(self, a: T, b: T) -> T {
        match self {
            Side::A => a,
            Side::B => b,
        }
    }
}

/// Strict majority; an exact tie has no winner.
pub fn decide_winner(pct_a: f64, pct_b: f64) -> Option<Side> {
    if pct_a > pct_b {
        Some(Side::A)
    } else if pct_b > pct_a {
        Some(Side::B)
    } else {
        None
    }
}

/// Raw signals for one demographic segment of one region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentInput {
    pub segment: String,
    pub recognition_a: f64,
    pub recognition_b: f64,
    pub favorability_a: f64,
    pub favorability_b: f64,
    /// Share of the region's population; shares need not sum to 100.
    pub population_share_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_b: Option<f64>,
}

impl SegmentInput {
    /// The same segment with the roles of A and B exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            segment: self.segment.clone(),
            recognition_a: self.recognition_b,
            recognition_b: self.recognition_a,
            favorability_a: self.favorability_b,
            favorability_b: self.favorability_a,
            population_share_pct: self.population_share_pct,
            similarity_a: self.similarity_b,
            similarity_b: self.similarity_a,
        }
    }
}

/// Everything computed for one segment on the way to its vote shares.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentOutcome {
    pub segment: String,
    pub population_share_pct: f64,
    pub bonus: Bonus,
    pub marginal_a: AttitudeMarginal,
    pub marginal_b: AttitudeMarginal,
    pub result: SegmentResult,
}

impl SegmentOutcome {
    pub fn swapped(self) -> Self {
        Self {
            bonus: self.bonus.swapped(),
            marginal_a: self.marginal_b,
            marginal_b: self.marginal_a,
            result: self.result.swapped(),
            ..self
        }
    }
}

/// Weighted vote shares with their winner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSplit {
    pub vote_share_pct_a: f64,
    pub vote_share_pct_b: f64,
    pub winner: Option<Side>,
    /// The split is the 50/50 fallback because no weight was decided.
    #[serde(default)]
    pub low_confidence: bool,
}

impl VoteSplit {
    pub fn swapped(self) -> Self {
        Self {
            vote_share_pct_a: self.vote_share_pct_b,
            vote_share_pct_b: self.vote_share_pct_a,
            winner: self.winner.map(Side::other),
            low_confidence: self.low_confidence,
        }
    }
}

/// Running weighted mean of vote shares.
#[derive(Clone, Copy, Debug, Default)]
struct WeightedShare {
    sum_a: f64,
    sum_b: f64,
    weight: f64,
}

impl WeightedShare {
    fn add(&mut self, result: &SegmentResult, weight: f64) {
        self.sum_a += result.vote_share_pct_a * weight;
        self.sum_b += result.vote_share_pct_b * weight;
        self.weight += weight;
    }

    fn finish(&self) -> VoteSplit {
        if self.weight <= EPSILON {
            return VoteSplit {
                vote_share_pct_a: FALLBACK_SHARE_PCT,
                vote_share_pct_b: FALLBACK_SHARE_PCT,
                winner: None,
                low_confidence: true,
            };
        }
        let pct_a = self.sum_a / self.weight;
        let pct_b = self.sum_b / self.weight;
        VoteSplit {
            vote_share_pct_a: pct_a,
            vote_share_pct_b: pct_b,
            winner: decide_winner(pct_a, pct_b),
            low_confidence: false,
        }
    }
}

/// Population- and turnout-weighted result for one region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionResult {
    pub vote_share_pct_a: f64,
    pub vote_share_pct_b: f64,
    pub winner: Option<Side>,
    #[serde(default)]
    pub low_confidence: bool,
    /// Mean of `recognition_a + recognition_b` (normalized) over segments.
    pub recognition_mass: f64,
    pub segments: Vec<SegmentOutcome>,
}

impl RegionResult {
    pub fn split(&self) -> VoteSplit {
        VoteSplit {
            vote_share_pct_a: self.vote_share_pct_a,
            vote_share_pct_b: self.vote_share_pct_b,
            winner: self.winner,
            low_confidence: self.low_confidence,
        }
    }

    pub fn swapped(self) -> Self {
        Self {
            vote_share_pct_a: self.vote_share_pct_b,
            vote_share_pct_b: self.vote_share_pct_a,
            winner: self.winner.map(Side::other),
            low_confidence: self.low_confidence,
            recognition_mass: self.recognition_mass,
            segments: self.segments.into_iter().map(SegmentOutcome::swapped).collect(),
        }
    }
}

/// Run one segment through normalization, tilt, marginals and the outcome table.
pub fn evaluate_segment(input: &SegmentInput, config: &SimulationConfig) -> SegmentOutcome {
    let rec_a = normalize_recognition(input.recognition_a, config.recognition_scale);
    let rec_b = normalize_recognition(input.recognition_b, config.recognition_scale);

    let bonus = compute_bonus(input.similarity_a, input.similarity_b, config.bonus_multiplier);
    let (fav_a, fav_b) = bonus.apply(input.favorability_a, input.favorability_b);

    let marginal_a = build_marginal(rec_a, fav_a);
    let marginal_b = build_marginal(rec_b, fav_b);
    let result = compute_vote_share(&marginal_a, &marginal_b);

    SegmentOutcome {
        segment: input.segment.clone(),
        population_share_pct: input.population_share_pct,
        bonus,
        marginal_a,
        marginal_b,
        result,
    }
}

fn population_weight(share_pct: f64) -> f64 {
    if share_pct.is_finite() { share_pct.max(0.0) } else { 0.0 }
}

/// Aggregate the segments of one region into its vote shares and winner.
///
/// Each segment is weighted by population share times turnout. A region
/// where nothing is decided falls back to 50/50 and is flagged low-confidence.
pub fn aggregate_region(segments: &[SegmentInput], config: &SimulationConfig) -> RegionResult {
    let mut share = WeightedShare::default();
    let mut mass = 0.0;
    let mut outcomes = Vec::with_capacity(segments.len());

    for input in segments {
        let outcome = evaluate_segment(input, config);
        let weight = population_weight(input.population_share_pct) * outcome.result.turnout_fraction;
        share.add(&outcome.result, weight);
        mass += normalize_recognition(input.recognition_a, config.recognition_scale)
            + normalize_recognition(input.recognition_b, config.recognition_scale);
        outcomes.push(outcome);
    }

    let split = share.finish();
    let recognition_mass = if segments.is_empty() {
        0.0
    } else {
        mass / segments.len() as f64
    };

    RegionResult {
        vote_share_pct_a: split.vote_share_pct_a,
        vote_share_pct_b: split.vote_share_pct_b,
        winner: split.winner,
        low_confidence: split.low_confidence,
        recognition_mass,
        segments: outcomes,
    }
}

/// Per-segment view across all regions plus an overall row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalBreakdown {
    pub segments: BTreeMap<String, VoteSplit>,
    pub overall: VoteSplit,
}

impl NationalBreakdown {
    pub fn swapped(self) -> Self {
        Self {
            segments: self
                .segments
                .into_iter()
                .map(|(k, v)| (k, v.swapped()))
                .collect(),
            overall: self.overall.swapped(),
        }
    }
}

/// Collects region results into a [`NationalBreakdown`].
///
/// A segment's contribution is its population share times turnout, scaled
/// by its region's recognition mass, so regions with more signal count more.
#[derive(Debug, Default)]
pub struct NationalAccumulator {
    buckets: BTreeMap<String, WeightedShare>,
    overall: WeightedShare,
}

impl NationalAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_region(&mut self, region: &RegionResult) {
        for outcome in &region.segments {
            let weight = population_weight(outcome.population_share_pct)
                * outcome.result.turnout_fraction
                * region.recognition_mass;
            self.buckets
                .entry(outcome.segment.clone())
                .or_default()
                .add(&outcome.result, weight);
            self.overall.add(&outcome.result, weight);
        }
    }

    pub fn finish(self) -> NationalBreakdown {
        NationalBreakdown {
            segments: self
                .buckets
                .iter()
                .map(|(name, share)| (name.clone(), share.finish()))
                .collect(),
            overall: self.overall.finish(),
        }
    }
}
