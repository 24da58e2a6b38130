//! Top-level optimization pipeline.
//!
//! Runs, in order: bath pre-placement once, then for each floor-cap value
//! in [`OptimizeConfig::max_staff_per_floor_range`] (loosest constraint
//! first is wrong for quality, so we go strictest-first and only relax
//! once a cap value yields nothing complete), every twin pattern from
//! [`crate::pattern::generate_patterns`], the single solver's enumerated
//! candidates, and finally the eco solver on each complete candidate. The
//! first cap value to produce at least one complete candidate wins; we
//! never loosen further than necessary. If no cap value ever completes,
//! the best partial candidates found across the whole search are returned
//! instead, each flagged incomplete.

use std::collections::BTreeMap;

use crate::allocation::{OptimizationResult, StaffAssignment};
use crate::bath;
use crate::building::BuildingData;
use crate::config::OptimizeConfig;
use crate::error::OptimizeError;
use crate::eco_solver;
use crate::fingerprint::{dedup_by_fingerprint, fingerprint};
use crate::floor_pool::FloorPools;
use crate::pattern;
use crate::single_solver;
use crate::staff::{Roster, StaffConstraints, StaffDistribution, max_floors_per_building};
use crate::twin;
use crate::types::{Building, RoomTypeSet, StaffId};
use crate::unassigned::compute_unassigned;

struct Candidate {
    assignments: Vec<StaffAssignment>,
    shortage: u32,
}

pub fn optimize(
    building_data: &BuildingData,
    roster: &Roster,
    distribution: &BTreeMap<StaffId, StaffDistribution>,
    constraints: &BTreeMap<StaffId, StaffConstraints>,
    room_types: &RoomTypeSet,
    config: &OptimizeConfig,
) -> Result<Vec<OptimizationResult>, OptimizeError> {
    if roster.is_empty() || building_data.is_empty() {
        return Ok(vec![OptimizationResult {
            assignments: Vec::new(),
            unassigned_rooms: Default::default(),
            is_complete: true,
        }]);
    }

    if distribution.is_empty() {
        return Err(OptimizeError::MissingDistribution);
    }

    #[cfg(feature = "trace")]
    let _span = tracing::info_span!(
        "optimize",
        staff = roster.len() as u64,
        k = config.k,
    )
    .entered();

    let staff_order: Vec<StaffId> = roster.iter().map(|s| s.id).collect();
    let bath_staff: Vec<StaffId> = staff_order
        .iter()
        .copied()
        .filter(|s| constraints.get(s).is_some_and(StaffConstraints::is_bath_cleaner))
        .collect();

    let bath_result = bath::place_bath_staff(building_data, distribution, constraints, room_types, &bath_staff);
    let remaining_staff_order: Vec<StaffId> = staff_order
        .iter()
        .copied()
        .filter(|s| !bath_staff.contains(s))
        .collect();

    let max_floors_per_building_map: BTreeMap<StaffId, u32> = remaining_staff_order
        .iter()
        .map(|&s| {
            let cons = constraints.get(&s).copied().unwrap_or_default();
            let dist = distribution.get(&s).copied().unwrap_or_default();
            (s, max_floors_per_building(&cons, &dist))
        })
        .collect();

    let patterns = pattern::generate_patterns(&remaining_staff_order, &bath_result.remaining_distribution);
    let base_pattern = patterns[0].clone();

    #[cfg(feature = "trace")]
    tracing::info!(target: "orchestrator", patterns = patterns.len() as u64, "twin patterns generated");

    let mut best_partials: Vec<Candidate> = Vec::new();

    for &max_staff_per_floor in &config.max_staff_per_floor_range.clone().collect::<Vec<_>>() {
        if config.deadline_exceeded() {
            break;
        }

        #[cfg(feature = "trace")]
        let _cap_span = tracing::info_span!("floor_cap_relaxation", max_staff_per_floor).entered();

        let mut complete_this_cap: Vec<Candidate> = Vec::new();

        for (pattern_index, pattern) in patterns.iter().enumerate() {
            if config.deadline_exceeded() {
                break;
            }
            #[cfg(not(feature = "trace"))]
            let _ = pattern_index;

            #[cfg(feature = "trace")]
            tracing::info!(
                target: "orchestrator",
                max_staff_per_floor,
                pattern_index,
                "trying twin pattern"
            );

            let mut pools = FloorPools::from_building_data(&bath_result.remaining_building_data);
            let twin_assignments = match twin::distribute_twins(
                &bath_result.remaining_building_data,
                &mut pools,
                pattern,
                &remaining_staff_order,
                constraints,
                &max_floors_per_building_map,
                room_types,
            ) {
                Some(assignments) => assignments,
                None => {
                    let mut repaired = pattern.clone();
                    pattern::rebalance_against_original(&mut repaired, &base_pattern, Building::Main, &remaining_staff_order);
                    pattern::rebalance_against_original(&mut repaired, &base_pattern, Building::Annex, &remaining_staff_order);
                    let mut retry_pools = FloorPools::from_building_data(&bath_result.remaining_building_data);
                    match twin::distribute_twins(
                        &bath_result.remaining_building_data,
                        &mut retry_pools,
                        &repaired,
                        &remaining_staff_order,
                        constraints,
                        &max_floors_per_building_map,
                        room_types,
                    ) {
                        Some(assignments) => {
                            pools = retry_pools;
                            assignments
                        }
                        None => continue,
                    }
                }
            };

            let single_results = single_solver::solve_singles(
                &bath_result.remaining_building_data,
                &mut pools,
                &remaining_staff_order,
                &twin_assignments,
                constraints,
                &bath_result.remaining_distribution,
                max_staff_per_floor,
                room_types,
                config.single_enumeration_cap,
                config.single_solver_timeout,
            );

            for partial in single_results {
                let mut full_assignments = partial.assignments.clone();
                full_assignments.extend(bath_result.assignments.values().cloned());

                if partial.is_complete() {
                    let mut eco_pools = pools.clone();
                    let mut by_staff: BTreeMap<StaffId, StaffAssignment> =
                        full_assignments.into_iter().map(|a| (a.staff_id, a)).collect();
                    eco_solver::solve_eco(
                        &bath_result.remaining_building_data,
                        &mut eco_pools,
                        &mut by_staff,
                        &staff_order,
                        distribution,
                        constraints,
                        config.eco_solver_timeout,
                        config.fallback_timeout,
                    );
                    complete_this_cap.push(Candidate {
                        assignments: by_staff.into_values().collect(),
                        shortage: 0,
                    });
                } else {
                    best_partials.push(Candidate { assignments: full_assignments, shortage: partial.shortage() });
                }
            }
        }

        if !complete_this_cap.is_empty() {
            #[cfg(feature = "trace")]
            tracing::info!(target: "orchestrator", max_staff_per_floor, candidates = complete_this_cap.len() as u64, "cap satisfied");

            let deduped = dedup_by_fingerprint(complete_this_cap, |c| fingerprint(&c.assignments, roster));
            return Ok(build_results(building_data, deduped, config.k));
        }

        #[cfg(feature = "trace")]
        tracing::info!(target: "orchestrator", max_staff_per_floor, "cap unsatisfied, relaxing");
    }

    if best_partials.is_empty() {
        return Err(OptimizeError::Infeasible {
            diagnostic: "no staff distribution could be satisfied, even partially".to_string(),
        });
    }

    best_partials.sort_by_key(|c| c.shortage);
    best_partials.truncate(config.best_partial_pool_size);
    let mut deduped = dedup_by_fingerprint(best_partials, |c| fingerprint(&c.assignments, roster));

    // Best partials never ran the eco solver inline (only complete single
    // candidates do); run it now so every returned result, complete or
    // not, reflects its full eco placement rather than leaving eco
    // entirely unassigned.
    for candidate in &mut deduped {
        let mut eco_pools = FloorPools::from_building_data(&bath_result.remaining_building_data);
        let mut by_staff: BTreeMap<StaffId, StaffAssignment> =
            candidate.assignments.drain(..).map(|a| (a.staff_id, a)).collect();
        eco_solver::solve_eco(
            &bath_result.remaining_building_data,
            &mut eco_pools,
            &mut by_staff,
            &staff_order,
            distribution,
            constraints,
            config.eco_solver_timeout,
            config.fallback_timeout,
        );
        candidate.assignments = by_staff.into_values().collect();
    }

    Ok(build_results(building_data, deduped, config.k))
}

fn build_results(
    building_data: &BuildingData,
    candidates: Vec<Candidate>,
    k: usize,
) -> Vec<OptimizationResult> {
    candidates
        .into_iter()
        .take(k.max(1))
        .map(|c| {
            let unassigned_rooms = compute_unassigned(building_data, &c.assignments);
            let is_complete = unassigned_rooms.is_complete();
            OptimizationResult { unassigned_rooms, assignments: c.assignments, is_complete }
        })
        .collect()
}
