//! Result caching around [`simulate`].
//!
//! The kernel never owns a cache. Callers inject one through
//! [`ResultCache`]; the in-memory implementation here serves tests and
//! short-lived processes, persistent ones live outside this crate.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::region::SegmentInput;
use crate::simulate::{Baseline, ElectionResult, Scenario, simulate};

/// Key-value store for serialized results.
pub trait ResultCache {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&mut self, key: &str, value: &str);
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// Everything besides the entity names that determines a result.
#[derive(Serialize)]
struct Fingerprint<'a> {
    config: &'a SimulationConfig,
    regions: &'a BTreeMap<String, Vec<SegmentInput>>,
    units: &'a BTreeMap<String, u32>,
    baseline: Option<Baseline>,
}

/// Cache key: `a|||b|||digest`, entity names lowercased, digest over the
/// canonical JSON of config, signals and the effective unit table.
pub fn cache_key(
    scenario: &Scenario,
    config: &SimulationConfig,
    default_units: &BTreeMap<String, u32>,
) -> String {
    let fingerprint = Fingerprint {
        config,
        regions: &scenario.regions,
        units: scenario.units.as_ref().unwrap_or(default_units),
        baseline: scenario.baseline,
    };
    let canonical = serde_json::to_vec(&fingerprint).unwrap_or_default();
    let digest = blake3::hash(&canonical);
    format!(
        "{}|||{}|||{}",
        scenario.entity_a.to_lowercase(),
        scenario.entity_b.to_lowercase(),
        digest.to_hex()
    )
}

/// Where a result came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSource {
    Computed,
    Cached,
    /// Found under the swapped contest and mirrored.
    CachedReverse,
}

#[derive(Clone, Debug)]
pub struct CachedOutcome {
    pub result: ElectionResult,
    pub source: CacheSource,
    pub key: String,
}

/// Runs scenarios through an injected cache.
pub struct CachedSimulator<'a, C: ResultCache + ?Sized> {
    cache: &'a mut C,
    config: &'a SimulationConfig,
    default_units: &'a BTreeMap<String, u32>,
}

impl<'a, C: ResultCache + ?Sized> CachedSimulator<'a, C> {
    pub fn new(
        cache: &'a mut C,
        config: &'a SimulationConfig,
        default_units: &'a BTreeMap<String, u32>,
    ) -> Self {
        Self {
            cache,
            config,
            default_units,
        }
    }

    /// Look up the scenario, then its swapped twin, and compute on a miss.
    /// Unreadable cache entries count as misses and get overwritten.
    pub fn run(&mut self, scenario: &Scenario) -> CachedOutcome {
        let key = cache_key(scenario, self.config, self.default_units);

        if let Some(result) = self.lookup(&key) {
            return CachedOutcome {
                result: with_names(result, scenario),
                source: CacheSource::Cached,
                key,
            };
        }

        let reverse_key = cache_key(&scenario.swapped(), self.config, self.default_units);
        if let Some(result) = self.lookup(&reverse_key) {
            return CachedOutcome {
                result: with_names(result.swapped(), scenario),
                source: CacheSource::CachedReverse,
                key,
            };
        }

        let result = simulate(scenario, self.config, self.default_units);
        if let Ok(json) = serde_json::to_string(&result) {
            self.cache.put(&key, &json);
        }
        CachedOutcome {
            result,
            source: CacheSource::Computed,
            key,
        }
    }

    fn lookup(&self, key: &str) -> Option<ElectionResult> {
        let raw = self.cache.get(key)?;
        serde_json::from_str(&raw).ok()
    }
}

/// Keys are case-insensitive, so restore the caller's spelling.
fn with_names(mut result: ElectionResult, scenario: &Scenario) -> ElectionResult {
    if result.entity_a != scenario.entity_a {
        let from = std::mem::replace(&mut result.entity_a, scenario.entity_a.clone());
        rename_tally(&mut result, &from, &scenario.entity_a);
    }
    if result.entity_b != scenario.entity_b {
        let from = std::mem::replace(&mut result.entity_b, scenario.entity_b.clone());
        rename_tally(&mut result, &from, &scenario.entity_b);
    }
    result
}

fn rename_tally(result: &mut ElectionResult, from: &str, to: &str) {
    if let Some(units) = result.tally.per_entity.remove(from) {
        result.tally.per_entity.insert(to.to_string(), units);
    }
    if result.tally.national_winner.as_deref() == Some(from) {
        result.tally.national_winner = Some(to.to_string());
    }
}
