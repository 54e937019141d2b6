//! Vote-share simulation kernel.
//!
//! Turns per-segment recognition and favorability signals for two entities
//! into attitude marginals, evaluates a fixed 4x4 outcome policy over every
//! attitude pair, and rolls segment shares up into regions, a national split
//! and a winner-take-all unit tally.
//!
//! Zero I/O, no randomness, no clocks. Caching is injected via [`ResultCache`].

pub mod bonus;
pub mod cache;
pub mod config;
pub mod constants;
pub mod electoral;
pub mod error;
pub mod marginal;
pub mod outcome;
pub mod recognition;
pub mod region;
pub mod sentiment;
pub mod simulate;
pub mod units;
pub mod vote_share;
pub mod wire;

pub use bonus::{Bonus, Confidence, SegmentPreference, amplify_similarities, compute_bonus, segment_preference};
pub use cache::{CacheSource, CachedOutcome, CachedSimulator, MemoryCache, ResultCache, cache_key};
pub use config::{SimulationConfig, TieBreak};
pub use constants::{DEFAULT_BONUS_MULTIPLIER, DEFAULT_RECOGNITION_SCALE, EPSILON, FALLBACK_SHARE_PCT};
pub use electoral::{ElectoralTally, tally_electoral};
pub use error::InputError;
pub use marginal::{AttitudeMarginal, build_marginal};
pub use outcome::{Category, OUTCOME_MATRIX, OutcomeWeight, outcome};
pub use recognition::normalize_recognition;
pub use region::{
    NationalAccumulator, NationalBreakdown, RegionResult, SegmentInput, SegmentOutcome, Side,
    VoteSplit, aggregate_region, decide_winner, evaluate_segment,
};
pub use sentiment::{SentimentCategory, SentimentSummary, weighted_average};
pub use simulate::{Baseline, ElectionResult, Scenario, simulate};
pub use units::{US_ELECTORAL_UNITS, region_code, us_electoral_units};
pub use vote_share::{SegmentResult, compute_vote_share};
pub use wire::{
    canonical_regions, marginal_from_value, parse_marginal, parse_scenario, parse_tally,
    scenario_from_value,
};
