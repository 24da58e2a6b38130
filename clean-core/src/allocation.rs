//! Per-staff allocation records and the engine's output types.

use std::collections::BTreeMap;

use crate::staff::BathCleaningType;
use crate::types::{Building, RoomType, StaffId};

/// What one staff member cleans on one floor.
///
/// Immutable after construction; built only by the bath, twin, single, and
/// eco stages.
#[derive(Debug, Clone, Default)]
pub struct RoomAllocation {
    pub room_counts: BTreeMap<RoomType, u32>,
    pub eco_rooms: u32,
}

impl RoomAllocation {
    pub fn new(room_counts: impl IntoIterator<Item = (RoomType, u32)>, eco_rooms: u32) -> Self {
        Self {
            room_counts: room_counts.into_iter().collect(),
            eco_rooms,
        }
    }

    pub fn total_rooms(&self) -> u32 {
        self.room_counts.values().sum::<u32>() + self.eco_rooms
    }

    pub fn add(&mut self, code: RoomType, count: u32) {
        if count == 0 {
            return;
        }
        *self.room_counts.entry(code).or_insert(0) += count;
    }

    pub fn add_eco(&mut self, count: u32) {
        self.eco_rooms += count;
    }

    /// Whether this allocation actually holds any rooms: the only test a
    /// floor-coverage computation should ever use, since an allocation can
    /// exist as a map entry with every count at zero.
    pub fn is_occupied(&self) -> bool {
        self.total_rooms() > 0
    }
}

/// Everything one staff member was assigned, across both buildings.
///
/// Created once per staff per optimization; never mutated after the
/// orchestrator returns it, except the eco solver writing in before return.
#[derive(Debug, Clone)]
pub struct StaffAssignment {
    pub staff_id: StaffId,
    /// floor -> allocation, main building.
    pub main_assignments: BTreeMap<i32, RoomAllocation>,
    /// floor -> allocation, annex building.
    pub annex_assignments: BTreeMap<i32, RoomAllocation>,
    pub bath_type: BathCleaningType,
}

impl StaffAssignment {
    pub fn new(staff_id: StaffId, bath_type: BathCleaningType) -> Self {
        Self {
            staff_id,
            main_assignments: BTreeMap::new(),
            annex_assignments: BTreeMap::new(),
            bath_type,
        }
    }

    pub fn assignments(&self, building: Building) -> &BTreeMap<i32, RoomAllocation> {
        match building {
            Building::Main => &self.main_assignments,
            Building::Annex => &self.annex_assignments,
        }
    }

    pub fn assignments_mut(&mut self, building: Building) -> &mut BTreeMap<i32, RoomAllocation> {
        match building {
            Building::Main => &mut self.main_assignments,
            Building::Annex => &mut self.annex_assignments,
        }
    }

    /// Union of occupied floors across both buildings, as `(building,
    /// floor)`. A map entry whose allocation has gone to zero (e.g. after a
    /// reassigned room) is not coverage and is excluded.
    pub fn floors(&self) -> Vec<(Building, i32)> {
        let mut out: Vec<(Building, i32)> = self
            .main_assignments
            .iter()
            .filter(|(_, a)| a.is_occupied())
            .map(|(&f, _)| (Building::Main, f))
            .chain(
                self.annex_assignments
                    .iter()
                    .filter(|(_, a)| a.is_occupied())
                    .map(|(&f, _)| (Building::Annex, f)),
            )
            .collect();
        out.sort();
        out
    }

    pub fn floor_count(&self) -> usize {
        self.floors().len()
    }

    /// Number of occupied floors in one building.
    pub fn floor_count_in(&self, building: Building) -> usize {
        self.assignments(building).values().filter(|a| a.is_occupied()).count()
    }

    /// Whether this staff member already covers `floor` in `building`.
    pub fn is_present(&self, building: Building, floor: i32) -> bool {
        self.assignments(building).get(&floor).is_some_and(RoomAllocation::is_occupied)
    }

    pub fn total_rooms(&self) -> u32 {
        self.main_assignments.values().map(RoomAllocation::total_rooms).sum::<u32>()
            + self.annex_assignments.values().map(RoomAllocation::total_rooms).sum::<u32>()
    }
}

/// Rooms left unassigned on one floor.
#[derive(Debug, Clone)]
pub struct FloorUnassigned {
    pub floor: i32,
    pub normal: BTreeMap<RoomType, u32>,
    pub eco: u32,
}

impl FloorUnassigned {
    pub fn total(&self) -> u32 {
        self.normal.values().sum::<u32>() + self.eco
    }
}

/// Per-building unassigned-room report.
#[derive(Debug, Clone, Default)]
pub struct UnassignedRooms {
    pub main_building: Vec<FloorUnassigned>,
    pub annex_building: Vec<FloorUnassigned>,
}

impl UnassignedRooms {
    pub fn total(&self) -> u32 {
        self.main_building.iter().map(FloorUnassigned::total).sum::<u32>()
            + self.annex_building.iter().map(FloorUnassigned::total).sum::<u32>()
    }

    pub fn is_complete(&self) -> bool {
        self.total() == 0
    }
}

/// Output of one solver stage before shortages are known to be zero.
#[derive(Debug, Clone)]
pub struct PartialSolutionResult {
    pub assignments: Vec<StaffAssignment>,
    pub total_assigned: u32,
    pub total_target: u32,
    pub per_staff_shortage: BTreeMap<StaffId, u32>,
}

impl PartialSolutionResult {
    pub fn shortage(&self) -> u32 {
        self.total_target.saturating_sub(self.total_assigned)
    }

    pub fn is_complete(&self) -> bool {
        self.shortage() == 0
    }
}

/// One of up to `k` results returned by `optimize`.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub assignments: Vec<StaffAssignment>,
    pub unassigned_rooms: UnassignedRooms,
    pub is_complete: bool,
}
