//! Unassigned-room accounting.
//!
//! Compares a candidate's final assignments against the original building
//! data to report exactly what was left uncleaned, per floor.

use std::collections::BTreeMap;

use crate::allocation::{FloorUnassigned, StaffAssignment, UnassignedRooms};
use crate::building::BuildingData;
use crate::types::{Building, RoomType};

pub fn compute_unassigned(building_data: &BuildingData, assignments: &[StaffAssignment]) -> UnassignedRooms {
    UnassignedRooms {
        main_building: compute_for_building(building_data, assignments, Building::Main),
        annex_building: compute_for_building(building_data, assignments, Building::Annex),
    }
}

fn compute_for_building(
    building_data: &BuildingData,
    assignments: &[StaffAssignment],
    building: Building,
) -> Vec<FloorUnassigned> {
    let mut out = Vec::new();

    for floor in building_data.floors(building) {
        let mut assigned_normal: BTreeMap<RoomType, u32> = BTreeMap::new();
        let mut assigned_eco = 0;

        for assignment in assignments {
            if let Some(allocation) = assignment.assignments(building).get(&floor.floor_number) {
                for (code, &n) in &allocation.room_counts {
                    *assigned_normal.entry(code.clone()).or_insert(0) += n;
                }
                assigned_eco += allocation.eco_rooms;
            }
        }

        let mut normal = BTreeMap::new();
        for (code, &total) in floor.room_counts() {
            let assigned = assigned_normal.get(code).copied().unwrap_or(0);
            let left = total.saturating_sub(assigned);
            if left > 0 {
                normal.insert(code.clone(), left);
            }
        }
        let eco = floor.eco_rooms.saturating_sub(assigned_eco);

        if !normal.is_empty() || eco > 0 {
            out.push(FloorUnassigned { floor: floor.floor_number, normal, eco });
        }
    }

    out
}
