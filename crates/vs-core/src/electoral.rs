use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::TieBreak;

/// National reduction of region winners into unit counts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectoralTally<E: Ord> {
    pub per_entity: BTreeMap<E, u32>,
    pub national_winner: Option<E>,
    /// Units of regions that produced no winner.
    pub unallocated: u32,
    /// Units of every region that appears in the winner map.
    pub total_units: u32,
}

/// Sum each region's units into its winner's total.
///
/// Regions without a winner, or without a unit count, add nothing to any
/// entity. The national winner needs a strictly greater total than every
/// other entity unless `tie_break` says otherwise.
pub fn tally_electoral<R, E>(
    region_winners: &BTreeMap<R, Option<E>>,
    region_units: &BTreeMap<R, u32>,
    tie_break: TieBreak,
) -> ElectoralTally<E>
where
    R: Ord,
    E: Ord + Clone,
{
    let mut per_entity: BTreeMap<E, u32> = BTreeMap::new();
    let mut unallocated = 0u32;
    let mut total_units = 0u32;

    for (region, winner) in region_winners {
        let units = region_units.get(region).copied().unwrap_or(0);
        total_units = total_units.saturating_add(units);
        match winner {
            Some(entity) => {
                let total = per_entity.entry(entity.clone()).or_insert(0);
                *total = total.saturating_add(units);
            }
            None => unallocated = unallocated.saturating_add(units),
        }
    }

    let national_winner = national_winner(&per_entity, tie_break);
    ElectoralTally {
        per_entity,
        national_winner,
        unallocated,
        total_units,
    }
}

fn national_winner<E: Ord + Clone>(per_entity: &BTreeMap<E, u32>, tie_break: TieBreak) -> Option<E> {
    let best = per_entity.values().copied().max()?;
    // BTreeMap iteration is ascending, so the first leader is the smallest id.
    let mut leaders = per_entity.iter().filter(|(_, total)| **total == best);
    let (first, _) = leaders.next()?;
    if leaders.next().is_none() {
        return Some(first.clone());
    }
    match tie_break {
        TieBreak::Unresolved => None,
        TieBreak::Lexicographic => Some(first.clone()),
    }
}
