use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::electoral::{ElectoralTally, tally_electoral};
use crate::region::{
    NationalAccumulator, NationalBreakdown, RegionResult, SegmentInput, aggregate_region,
};
use crate::sentiment::SentimentSummary;
use crate::units::region_code;

/// National favorability baselines reported by the sentiment provider.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub a: f64,
    pub b: f64,
}

/// A complete head-to-head: both entities, every region's segments, and
/// optionally the unit table to tally against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub entity_a: String,
    pub entity_b: String,
    pub regions: BTreeMap<String, Vec<SegmentInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<BTreeMap<String, u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Baseline>,
}

impl Scenario {
    /// The same contest with A and B exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            entity_a: self.entity_b.clone(),
            entity_b: self.entity_a.clone(),
            regions: self
                .regions
                .iter()
                .map(|(region, segs)| (region.clone(), segs.iter().map(SegmentInput::swapped).collect()))
                .collect(),
            units: self.units.clone(),
            baseline: self.baseline.map(|b| Baseline { a: b.b, b: b.a }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResult {
    pub entity_a: String,
    pub entity_b: String,
    pub regions: BTreeMap<String, RegionResult>,
    pub national: NationalBreakdown,
    pub tally: ElectoralTally<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentSummary>,
}

impl ElectionResult {
    /// Mirror the result onto the swapped contest. The tally is keyed by
    /// entity name, so it carries over unchanged.
    pub fn swapped(self) -> Self {
        Self {
            entity_a: self.entity_b,
            entity_b: self.entity_a,
            regions: self
                .regions
                .into_iter()
                .map(|(region, result)| (region, result.swapped()))
                .collect(),
            national: self.national.swapped(),
            tally: self.tally,
            sentiment: self
                .sentiment
                .map(|s| SentimentSummary::new(s.score_b, s.score_a)),
        }
    }

    /// Regions whose split is the 50/50 fallback.
    pub fn low_confidence_regions(&self) -> impl Iterator<Item = &str> {
        self.regions
            .iter()
            .filter(|(_, r)| r.low_confidence)
            .map(|(region, _)| region.as_str())
    }
}

/// Run every region of a scenario and tally the winners.
///
/// `default_units` is used when the scenario carries no unit table of its own.
/// Regions are matched to units by [`region_code`]. The two entities must
/// have distinct names: the tally is keyed by name, so identical names pool
/// both sides' units. The wire format rejects such scenarios.
pub fn simulate(
    scenario: &Scenario,
    config: &SimulationConfig,
    default_units: &BTreeMap<String, u32>,
) -> ElectionResult {
    let units: BTreeMap<String, u32> = scenario
        .units
        .as_ref()
        .unwrap_or(default_units)
        .iter()
        .map(|(region, count)| (region_code(region), *count))
        .collect();

    let mut national = NationalAccumulator::new();
    let mut regions = BTreeMap::new();
    let mut winners: BTreeMap<String, Option<String>> = BTreeMap::new();

    for (region, segments) in &scenario.regions {
        let result = aggregate_region(segments, config);
        national.add_region(&result);
        winners.insert(
            region_code(region),
            result
                .winner
                .map(|side| side.pick(&scenario.entity_a, &scenario.entity_b).clone()),
        );
        regions.insert(region.clone(), result);
    }

    let tally = tally_electoral(&winners, &units, config.tie_break);

    ElectionResult {
        entity_a: scenario.entity_a.clone(),
        entity_b: scenario.entity_b.clone(),
        regions,
        national: national.finish(),
        tally,
        sentiment: scenario
            .baseline
            .map(|b| SentimentSummary::new(b.a, b.b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Side;

    fn seg(name: &str, rec: (f64, f64), fav: (f64, f64)) -> SegmentInput {
        SegmentInput {
            segment: name.to_string(),
            recognition_a: rec.0,
            recognition_b: rec.1,
            favorability_a: fav.0,
            favorability_b: fav.1,
            population_share_pct: 100.0,
            similarity_a: None,
            similarity_b: None,
        }
    }

    fn scenario() -> Scenario {
        let mut regions = BTreeMap::new();
        regions.insert("R1".to_string(), vec![seg("ALL", (90.0, 90.0), (0.8, -0.4))]);
        regions.insert("R2".to_string(), vec![seg("ALL", (90.0, 90.0), (-0.4, 0.8))]);
        regions.insert("R3".to_string(), vec![seg("ALL", (0.0, 0.0), (0.0, 0.0))]);
        let units = [("R1", 10), ("R2", 5), ("R3", 8)]
            .into_iter()
            .map(|(r, u)| (r.to_string(), u))
            .collect();
        Scenario {
            entity_a: "X".to_string(),
            entity_b: "Y".to_string(),
            regions,
            units: Some(units),
            baseline: Some(Baseline { a: 0.2, b: -0.1 }),
        }
    }

    #[test]
    fn test_simulate_tallies_region_winners() {
        let result = simulate(&scenario(), &SimulationConfig::default(), &BTreeMap::new());
        assert_eq!(result.regions["R1"].winner, Some(Side::A));
        assert_eq!(result.regions["R2"].winner, Some(Side::B));
        assert_eq!(result.regions["R3"].winner, None);
        assert_eq!(result.tally.per_entity.get("X"), Some(&10));
        assert_eq!(result.tally.per_entity.get("Y"), Some(&5));
        assert_eq!(result.tally.national_winner.as_deref(), Some("X"));
        assert_eq!(result.low_confidence_regions().collect::<Vec<_>>(), vec!["R3"]);
        assert_eq!(result.sentiment.map(|s| s.leader), Some(Some(Side::A)));
    }

    #[test]
    fn test_default_units_used_when_scenario_has_none() {
        let mut s = scenario();
        s.units = None;
        let defaults: BTreeMap<String, u32> =
            [("R2".to_string(), 20)].into_iter().collect();
        let result = simulate(&s, &SimulationConfig::default(), &defaults);
        assert_eq!(result.tally.national_winner.as_deref(), Some("Y"));
        assert_eq!(result.tally.per_entity.get("X"), Some(&0));
    }

    #[test]
    fn test_region_codes_match_units_ignoring_case() {
        let mut s = scenario();
        s.units = None;
        let r1 = s.regions.remove("R1").unwrap();
        s.regions.insert("r1".to_string(), r1);
        let defaults: BTreeMap<String, u32> = [("R1".to_string(), 10)].into_iter().collect();

        let result = simulate(&s, &SimulationConfig::default(), &defaults);
        assert_eq!(result.regions["r1"].winner, Some(Side::A));
        assert_eq!(result.tally.per_entity.get("X"), Some(&10));
        assert_eq!(result.tally.total_units, 10);
    }

    #[test]
    fn test_swapped_scenario_mirrors_result() {
        let config = SimulationConfig::default();
        let forward = simulate(&scenario(), &config, &BTreeMap::new());
        let backward = simulate(&scenario().swapped(), &config, &BTreeMap::new());
        assert_eq!(forward.swapped(), backward);
    }

    #[test]
    fn test_simulate_is_deterministic() {
        let config = SimulationConfig::default();
        let first = simulate(&scenario(), &config, &BTreeMap::new());
        let second = simulate(&scenario(), &config, &BTreeMap::new());
        assert_eq!(first, second);
    }
}
