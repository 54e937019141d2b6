//! JSON wire format for requests.
//!
//! Field names are camelCase. Every field is optional on the wire so that a
//! missing one can be reported by name and location instead of as a generic
//! parse failure. Marginals are accepted either as an object with named
//! attitudes or as a `[favorable, neutral, unfavorable, unknown]` array.
//!
//! Region keys are canonicalized with [`region_code`]. A segment may carry
//! raw `cosineA`/`cosineB` profile similarities instead of finished
//! similarity scores; those are amplified across the region's segments.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::bonus::amplify_similarities;
use crate::error::{InputError, Result};
use crate::marginal::AttitudeMarginal;
use crate::region::SegmentInput;
use crate::sentiment::weighted_average;
use crate::simulate::{Baseline, Scenario};
use crate::units::region_code;

// --- Wire format types ---

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct WireScenario {
    pub entity_a: Option<String>,
    pub entity_b: Option<String>,
    pub regions: Option<BTreeMap<String, Vec<WireSegment>>>,
    #[serde(default)]
    pub units: Option<BTreeMap<String, u32>>,
    /// National favorability baseline, used for segments that carry none.
    #[serde(default)]
    pub favorability: Option<WireFavorability>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WireSegment {
    pub segment: Option<String>,
    pub recognition_a: Option<f64>,
    pub recognition_b: Option<f64>,
    pub favorability_a: Option<f64>,
    pub favorability_b: Option<f64>,
    pub population_share_pct: Option<f64>,
    pub similarity_a: Option<f64>,
    pub similarity_b: Option<f64>,
    /// Raw cosine similarity to the segment's profile, amplified per region.
    pub cosine_a: Option<f64>,
    pub cosine_b: Option<f64>,
}

#[derive(Deserialize, Debug)]
pub struct WireFavorability {
    pub a: WireSentiment,
    pub b: WireSentiment,
}

/// A single score, or weighted per-source scores to be averaged.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum WireSentiment {
    Score(f64),
    Sources(Vec<WireSource>),
}

#[derive(Deserialize, Debug)]
pub struct WireSource {
    #[serde(default)]
    pub source: String,
    pub score: f64,
    #[serde(default = "default_source_weight")]
    pub weight: f64,
}

fn default_source_weight() -> f64 {
    1.0
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum WireMarginal {
    Named {
        favorable: f64,
        neutral: f64,
        unfavorable: f64,
        unknown: f64,
    },
    Positional(Vec<f64>),
}

#[derive(Deserialize, Debug)]
pub struct WireTally {
    pub winners: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub units: Option<BTreeMap<String, u32>>,
}

// --- Conversion: Wire → Domain ---

impl WireSentiment {
    fn resolve(&self) -> f64 {
        match self {
            WireSentiment::Score(s) => s.clamp(-1.0, 1.0),
            WireSentiment::Sources(sources) => {
                let pairs: Vec<(f64, f64)> = sources.iter().map(|s| (s.score, s.weight)).collect();
                weighted_average(&pairs)
            }
        }
    }
}

impl WireMarginal {
    pub fn into_marginal(self) -> Result<AttitudeMarginal> {
        let weights = match self {
            WireMarginal::Named {
                favorable,
                neutral,
                unfavorable,
                unknown,
            } => [favorable, neutral, unfavorable, unknown],
            WireMarginal::Positional(values) => {
                let len = values.len();
                <[f64; 4]>::try_from(values).map_err(|_| {
                    InputError::BadMarginal(format!("expected 4 entries, got {len}"))
                })?
            }
        };
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(InputError::BadMarginal(format!(
                "entries must be finite and non-negative, got {bad}"
            )));
        }
        Ok(AttitudeMarginal::from_weights(weights))
    }
}

impl WireSegment {
    fn into_segment(
        self,
        location: &str,
        baseline: Option<Baseline>,
        amplified: (Option<f64>, Option<f64>),
    ) -> Result<SegmentInput> {
        let missing = |field| InputError::MissingField {
            location: location.to_string(),
            field,
        };
        let finite = |value: f64, field| {
            if value.is_finite() {
                Ok(value)
            } else {
                Err(InputError::NonFinite {
                    location: location.to_string(),
                    field,
                })
            }
        };

        if let Some(cosine) = self.cosine_a {
            finite(cosine, "cosineA")?;
        }
        if let Some(cosine) = self.cosine_b {
            finite(cosine, "cosineB")?;
        }

        let favorability_a = self
            .favorability_a
            .or(baseline.map(|b| b.a))
            .ok_or_else(|| missing("favorabilityA"))?;
        let favorability_b = self
            .favorability_b
            .or(baseline.map(|b| b.b))
            .ok_or_else(|| missing("favorabilityB"))?;

        Ok(SegmentInput {
            segment: self.segment.ok_or_else(|| missing("segment"))?,
            recognition_a: finite(
                self.recognition_a.ok_or_else(|| missing("recognitionA"))?,
                "recognitionA",
            )?,
            recognition_b: finite(
                self.recognition_b.ok_or_else(|| missing("recognitionB"))?,
                "recognitionB",
            )?,
            favorability_a: finite(favorability_a, "favorabilityA")?,
            favorability_b: finite(favorability_b, "favorabilityB")?,
            population_share_pct: finite(
                self.population_share_pct
                    .ok_or_else(|| missing("populationSharePct"))?,
                "populationSharePct",
            )?,
            similarity_a: self.similarity_a.or(amplified.0),
            similarity_b: self.similarity_b.or(amplified.1),
        })
    }
}

impl WireScenario {
    pub fn into_scenario(self) -> Result<Scenario> {
        let missing = |field| InputError::MissingField {
            location: "scenario".to_string(),
            field,
        };
        let entity_a = self.entity_a.ok_or_else(|| missing("entityA"))?;
        let entity_b = self.entity_b.ok_or_else(|| missing("entityB"))?;
        let wire_regions = self.regions.ok_or_else(|| missing("regions"))?;
        if entity_a.to_lowercase() == entity_b.to_lowercase() {
            return Err(InputError::SameEntity(entity_a));
        }

        let baseline = self.favorability.map(|f| Baseline {
            a: f.a.resolve(),
            b: f.b.resolve(),
        });

        let mut regions = BTreeMap::new();
        for (region, segments) in wire_regions {
            let amplified_a = amplified_cosines(&segments, |s| s.cosine_a);
            let amplified_b = amplified_cosines(&segments, |s| s.cosine_b);
            let converted = segments
                .into_iter()
                .zip(amplified_a.into_iter().zip(amplified_b))
                .enumerate()
                .map(|(i, (seg, amplified))| {
                    seg.into_segment(&format!("regions.{region}[{i}]"), baseline, amplified)
                })
                .collect::<Result<Vec<_>>>()?;
            let code = region_code(&region);
            if regions.insert(code.clone(), converted).is_some() {
                return Err(InputError::DuplicateRegion(code));
            }
        }

        Ok(Scenario {
            entity_a,
            entity_b,
            regions,
            units: self.units.map(canonical_regions).transpose()?,
            baseline,
        })
    }
}

/// Amplify one entity's raw cosines across a region's segments. Segments
/// without a finite cosine get `None` and do not shift the mean.
fn amplified_cosines(
    segments: &[WireSegment],
    cosine: impl Fn(&WireSegment) -> Option<f64>,
) -> Vec<Option<f64>> {
    let usable = |s: &WireSegment| cosine(s).filter(|c| c.is_finite());
    let raw: Vec<f64> = segments.iter().filter_map(usable).collect();
    let mut scores = amplify_similarities(&raw).into_iter();
    segments
        .iter()
        .map(|s| usable(s).and_then(|_| scores.next()))
        .collect()
}

/// Re-key a region map by [`region_code`]. Keys that collide once
/// canonicalized are an error.
pub fn canonical_regions<V>(map: BTreeMap<String, V>) -> Result<BTreeMap<String, V>> {
    let mut canonical = BTreeMap::new();
    for (region, value) in map {
        let code = region_code(&region);
        if canonical.insert(code.clone(), value).is_some() {
            return Err(InputError::DuplicateRegion(code));
        }
    }
    Ok(canonical)
}

// --- Entry points ---

pub fn parse_scenario(json: &str) -> Result<Scenario> {
    let wire: WireScenario = serde_json::from_str(json)?;
    wire.into_scenario()
}

pub fn scenario_from_value(value: serde_json::Value) -> Result<Scenario> {
    let wire: WireScenario = serde_json::from_value(value)?;
    wire.into_scenario()
}

pub fn parse_marginal(json: &str) -> Result<AttitudeMarginal> {
    let wire: WireMarginal = serde_json::from_str(json)?;
    wire.into_marginal()
}

pub fn marginal_from_value(value: serde_json::Value) -> Result<AttitudeMarginal> {
    let wire: WireMarginal = serde_json::from_value(value)?;
    wire.into_marginal()
}

pub fn parse_tally(json: &str) -> Result<WireTally> {
    let wire: WireTally = serde_json::from_str(json)?;
    Ok(WireTally {
        winners: canonical_regions(wire.winners)?,
        units: wire.units.map(canonical_regions).transpose()?,
    })
}
