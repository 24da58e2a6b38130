//! Round-robin floor-level twin-room distribution.

use std::collections::{BTreeMap, VecDeque};

use crate::allocation::StaffAssignment;
use crate::building::BuildingData;
use crate::floor_pool::FloorPools;
use crate::pattern::TwinPattern;
use crate::staff::StaffConstraints;
use crate::types::{Building, RoomTypeSet, StaffId};

/// Runs the twin distributor for one pattern.
///
/// Returns `None` when any staff's remaining target could not be met
/// (signalling the pattern is infeasible), in which case the caller tries
/// the next pattern rather than using any partial result.
/// `max_floors_per_building` bounds how many distinct floors, in this
/// building, one staff may be assigned via the twin stage.
pub fn distribute_twins(
    building_data: &BuildingData,
    pools: &mut FloorPools,
    pattern: &TwinPattern,
    staff_order: &[StaffId],
    constraints: &BTreeMap<StaffId, StaffConstraints>,
    max_floors_per_building: &BTreeMap<StaffId, u32>,
    room_types: &RoomTypeSet,
) -> Option<BTreeMap<StaffId, StaffAssignment>> {
    let mut out: BTreeMap<StaffId, StaffAssignment> = staff_order
        .iter()
        .map(|&s| {
            let bath_type = constraints
                .get(&s)
                .map(|c| c.bath_type)
                .unwrap_or(crate::staff::BathCleaningType::None);
            (s, StaffAssignment::new(s, bath_type))
        })
        .collect();

    for building in [Building::Main, Building::Annex] {
        let mut remaining: BTreeMap<StaffId, u32> = staff_order
            .iter()
            .map(|&s| (s, pattern.twin(building, s)))
            .filter(|&(_, target)| target > 0)
            .collect();

        if remaining.is_empty() {
            continue;
        }

        let mut queue: VecDeque<StaffId> = staff_order
            .iter()
            .copied()
            .filter(|s| remaining.contains_key(s))
            .collect();

        for floor in building_data.floors(building) {
            loop {
                let Some(pool) = pools.get(building, floor.floor_number) else {
                    break;
                };
                let floor_remaining: u32 = pool
                    .normal_remaining()
                    .iter()
                    .filter(|(c, _)| room_types.is_twin(c))
                    .map(|(_, &n)| n)
                    .sum();
                if floor_remaining == 0 || queue.is_empty() {
                    break;
                }

                let mut rotations_without_progress = 0;
                let mut placed_this_floor = false;

                loop {
                    let Some(&staff) = queue.front() else { break };
                    if remaining.get(&staff).copied().unwrap_or(0) == 0 {
                        queue.pop_front();
                        continue;
                    }

                    let assignment = out.get_mut(&staff).unwrap();
                    let already_present = assignment
                        .assignments(building)
                        .contains_key(&floor.floor_number);
                    let used_floors = assignment.assignments(building).len() as u32;
                    let cap = max_floors_per_building.get(&staff).copied().unwrap_or(1);
                    let can_accept = already_present || used_floors < cap;

                    if can_accept {
                        let pool = pools.get_mut(building, floor.floor_number).unwrap();
                        let taken = pool.allocate_normal_matching(1, |c| room_types.is_twin(c));
                        if taken.is_empty() {
                            break; // floor's twin rooms exhausted mid-rotation
                        }
                        for (code, n) in taken {
                            assignment
                                .assignments_mut(building)
                                .entry(floor.floor_number)
                                .or_default()
                                .add(code, n);
                        }
                        *remaining.get_mut(&staff).unwrap() -= 1;
                        placed_this_floor = true;
                        rotations_without_progress = 0;

                        let staff = queue.pop_front().unwrap();
                        if remaining.get(&staff).copied().unwrap_or(0) > 0 {
                            queue.push_back(staff);
                        }
                    } else {
                        // Not eligible this round: rotate past without allocating.
                        let staff = queue.pop_front().unwrap();
                        queue.push_back(staff);
                        rotations_without_progress += 1;
                        if rotations_without_progress >= queue.len().max(1) {
                            break; // full rotation, no eligible staff
                        }
                    }

                    let pool = pools.get(building, floor.floor_number).unwrap();
                    let still_remaining = pool
                        .normal_remaining()
                        .iter()
                        .filter(|(c, _)| room_types.is_twin(c))
                        .map(|(_, &n)| n)
                        .sum::<u32>();
                    if still_remaining == 0 {
                        break;
                    }
                }

                if !placed_this_floor {
                    break;
                }
            }
        }

        remaining.retain(|_, &mut target| target > 0);
        if !remaining.is_empty() {
            #[cfg(feature = "trace")]
            tracing::info!(
                target: "twin",
                building = building.as_str(),
                unmet_staff = remaining.len() as u64,
                "twin pattern infeasible: residual staff target"
            );
            return None;
        }
    }

    Some(out)
}
