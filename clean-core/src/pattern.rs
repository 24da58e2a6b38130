//! Twin-distribution pattern generation.
//!
//! The base pattern is the input `StaffDistribution` verbatim; every other
//! pattern is a single-unit pairwise swap of one twin bin between two
//! staff, tried in generation order.

use std::collections::BTreeMap;

use crate::staff::StaffDistribution;
use crate::types::{Building, StaffId};

/// One twin-quota pattern: staff -> (main_twin, annex_twin) target.
#[derive(Debug, Clone)]
pub struct TwinPattern {
    pub main_twin: BTreeMap<StaffId, u32>,
    pub annex_twin: BTreeMap<StaffId, u32>,
}

impl TwinPattern {
    pub fn twin(&self, building: Building, staff: StaffId) -> u32 {
        match building {
            Building::Main => self.main_twin.get(&staff).copied().unwrap_or(0),
            Building::Annex => self.annex_twin.get(&staff).copied().unwrap_or(0),
        }
    }
}

/// Generates the base pattern plus every single-unit pairwise swap in both
/// directions (`s1` -> `s2` and `s2` -> `s1`), in a deterministic order
/// (staff iterated in roster order).
pub fn generate_patterns(
    staff_order: &[StaffId],
    distribution: &BTreeMap<StaffId, StaffDistribution>,
) -> Vec<TwinPattern> {
    let base = TwinPattern {
        main_twin: staff_order
            .iter()
            .map(|&s| (s, distribution.get(&s).map(|d| d.main_twin).unwrap_or(0)))
            .collect(),
        annex_twin: staff_order
            .iter()
            .map(|&s| (s, distribution.get(&s).map(|d| d.annex_twin).unwrap_or(0)))
            .collect(),
    };

    let mut patterns = vec![base.clone()];

    for building in [Building::Main, Building::Annex] {
        for i in 0..staff_order.len() {
            for j in (i + 1)..staff_order.len() {
                let s1 = staff_order[i];
                let s2 = staff_order[j];

                let s1_target = base.twin(building, s1);
                if s1_target > 0 {
                    let mut mutated = base.clone();
                    let bin = match building {
                        Building::Main => &mut mutated.main_twin,
                        Building::Annex => &mut mutated.annex_twin,
                    };
                    *bin.get_mut(&s1).unwrap() -= 1;
                    *bin.entry(s2).or_insert(0) += 1;
                    patterns.push(mutated);
                }

                let s2_target = base.twin(building, s2);
                if s2_target > 0 {
                    let mut mutated = base.clone();
                    let bin = match building {
                        Building::Main => &mut mutated.main_twin,
                        Building::Annex => &mut mutated.annex_twin,
                    };
                    *bin.get_mut(&s2).unwrap() -= 1;
                    *bin.entry(s1).or_insert(0) += 1;
                    patterns.push(mutated);
                }
            }
        }
    }

    #[cfg(feature = "trace")]
    tracing::info!(target: "pattern", patterns = patterns.len() as u64, "twin patterns generated");

    patterns
}

/// Rebalances a mutated pattern against `original`: if a staff's pattern
/// value exceeds their original target, redistribute the excess in
/// `staff_order` to staff currently below their original target, capped at
/// the original; any unabsorbable excess is discarded.
pub fn rebalance_against_original(
    pattern: &mut TwinPattern,
    original: &TwinPattern,
    building: Building,
    staff_order: &[StaffId],
) {
    let bin = match building {
        Building::Main => &mut pattern.main_twin,
        Building::Annex => &mut pattern.annex_twin,
    };
    let original_bin = match building {
        Building::Main => &original.main_twin,
        Building::Annex => &original.annex_twin,
    };

    let mut excess_pool: u32 = 0;
    for &staff in staff_order {
        let current = bin.get(&staff).copied().unwrap_or(0);
        let orig = original_bin.get(&staff).copied().unwrap_or(0);
        if current > orig {
            excess_pool += current - orig;
            bin.insert(staff, orig);
        }
    }

    for &staff in staff_order {
        if excess_pool == 0 {
            break;
        }
        let current = bin.get(&staff).copied().unwrap_or(0);
        let orig = original_bin.get(&staff).copied().unwrap_or(0);
        if current < orig {
            let room = (orig - current).min(excess_pool);
            *bin.entry(staff).or_insert(0) += room;
            excess_pool -= room;
        }
    }
    // Remaining `excess_pool` is discarded, producing per-staff shortage later.
    #[cfg(feature = "trace")]
    if excess_pool > 0 {
        tracing::info!(
            target: "pattern",
            building = building.as_str(),
            discarded = excess_pool as u64,
            "rebalance could not fully absorb excess twin units"
        );
    }
}
