//! Greedy pre-placement of bath-cleaning staff.
//!
//! Bath cleaners have a hard cap of one floor per building; smallest-
//! sufficient-fit avoids blocking scarce small floors for everyone else.

use std::collections::{BTreeMap, HashSet};

use crate::allocation::StaffAssignment;
use crate::building::BuildingData;
use crate::staff::{StaffConstraints, StaffDistribution};
use crate::types::{Building, RoomTypeSet, StaffId};

/// Result of the pre-placement pass.
pub struct BathPrePlacement {
    /// Partial assignments, keyed by staff id, for bath cleaners that found
    /// a floor. Staff with no assignment here were skipped because no
    /// sufficient unused floor existed.
    pub assignments: BTreeMap<StaffId, StaffAssignment>,
    /// The remaining building data, with bath floors' rooms decremented.
    pub remaining_building_data: BuildingData,
    /// The remaining staff distribution map, with bath staff removed.
    pub remaining_distribution: BTreeMap<StaffId, StaffDistribution>,
}

/// Runs the bath pre-placer.
///
/// `bath_staff` must be in shift-sheet input order: placement iterates
/// staff in that order.
pub fn place_bath_staff(
    building_data: &BuildingData,
    distribution: &BTreeMap<StaffId, StaffDistribution>,
    constraints: &BTreeMap<StaffId, StaffConstraints>,
    room_types: &RoomTypeSet,
    bath_staff: &[StaffId],
) -> BathPrePlacement {
    let mut assignments = BTreeMap::new();
    let mut remaining_distribution = distribution.clone();
    let mut pools = crate::floor_pool::FloorPools::from_building_data(building_data);
    let mut used_main: HashSet<i32> = HashSet::new();
    let mut used_annex: HashSet<i32> = HashSet::new();

    for &staff_id in bath_staff {
        let Some(dist) = distribution.get(&staff_id) else {
            continue;
        };
        let Some(cons) = constraints.get(&staff_id) else {
            continue;
        };

        let mut assignment = StaffAssignment::new(staff_id, cons.bath_type);

        place_in_building(
            Building::Main,
            staff_id,
            dist,
            building_data,
            &mut pools,
            &mut used_main,
            room_types,
            &mut assignment,
        );
        place_in_building(
            Building::Annex,
            staff_id,
            dist,
            building_data,
            &mut pools,
            &mut used_annex,
            room_types,
            &mut assignment,
        );

        #[cfg(feature = "trace")]
        tracing::info!(
            target: "bath",
            floors_assigned = assignment.floor_count() as u64,
            rooms_assigned = assignment.total_rooms() as u64,
            "bath pre-placement for one staff member"
        );

        remaining_distribution.remove(&staff_id);
        assignments.insert(staff_id, assignment);
    }

    let remaining_building_data = rebuild_building_data(building_data, &pools);

    BathPrePlacement {
        assignments,
        remaining_building_data,
        remaining_distribution,
    }
}

#[allow(clippy::too_many_arguments)]
fn place_in_building(
    building: Building,
    staff_id: StaffId,
    dist: &StaffDistribution,
    building_data: &BuildingData,
    pools: &mut crate::floor_pool::FloorPools,
    used: &mut HashSet<i32>,
    room_types: &RoomTypeSet,
    assignment: &mut StaffAssignment,
) {
    let required = dist.single(building) + dist.twin(building);
    if required == 0 {
        return;
    }

    // Floors sorted ascending by total room count.
    let mut floors: Vec<_> = building_data.floors(building).to_vec();
    floors.sort_by_key(|f| f.total_normal_rooms());

    let Some(floor) = floors
        .iter()
        .find(|f| !used.contains(&f.floor_number) && f.total_normal_rooms() >= required)
    else {
        return; // no sufficient floor: leaves shortage for later accounting
    };

    used.insert(floor.floor_number);
    let Some(pool) = pools.get_mut(building, floor.floor_number) else {
        return;
    };

    let twin_target = dist.twin(building);
    let single_target = dist.single(building);

    // Twin codes first, then non-twin.
    let taken_twin = pool.allocate_normal_matching(twin_target, |c| room_types.is_twin(c));
    let taken_single = pool.allocate_normal_matching(single_target, |c| room_types.is_single_like(c));

    let slot = assignment.assignments_mut(building).entry(floor.floor_number).or_default();
    for (c, n) in taken_twin.into_iter().chain(taken_single) {
        slot.add(c, n);
    }
}

fn rebuild_building_data(original: &BuildingData, pools: &crate::floor_pool::FloorPools) -> BuildingData {
    let mut floors = Vec::new();
    for building in [Building::Main, Building::Annex] {
        for floor in original.floors(building) {
            let eco = pools
                .get(building, floor.floor_number)
                .map(|p| p.eco_remaining())
                .unwrap_or(floor.eco_rooms);
            let counts = pools
                .get(building, floor.floor_number)
                .map(|p| p.normal_remaining().clone())
                .unwrap_or_else(|| floor.room_counts().clone());
            floors.push(crate::building::FloorInfo::new(
                floor.floor_number,
                building,
                counts,
                eco,
            ));
        }
    }
    BuildingData::new(floors)
}
