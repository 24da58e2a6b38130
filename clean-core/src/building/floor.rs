//! Per-floor room composition.

use std::collections::BTreeMap;

use crate::types::{Building, RoomType};

/// Immutable room composition for one floor of one building.
///
/// Invariants: all counts non-negative (enforced by construction through
/// `u32`); total floor rooms = sum of `room_counts` + `eco_rooms`.
#[derive(Debug, Clone)]
pub struct FloorInfo {
    pub floor_number: i32,
    pub building: Building,
    /// code -> count, covering both single-like and twin codes.
    room_counts: BTreeMap<RoomType, u32>,
    pub eco_rooms: u32,
}

impl FloorInfo {
    pub fn new(
        floor_number: i32,
        building: Building,
        room_counts: impl IntoIterator<Item = (RoomType, u32)>,
        eco_rooms: u32,
    ) -> Self {
        Self {
            floor_number,
            building,
            room_counts: room_counts.into_iter().collect(),
            eco_rooms,
        }
    }

    pub fn room_counts(&self) -> &BTreeMap<RoomType, u32> {
        &self.room_counts
    }

    pub fn count_of(&self, code: &RoomType) -> u32 {
        self.room_counts.get(code).copied().unwrap_or(0)
    }

    /// Total rooms on this floor, including eco.
    pub fn total_rooms(&self) -> u32 {
        self.room_counts.values().sum::<u32>() + self.eco_rooms
    }

    /// Total rooms excluding eco (used by the bath pre-placer's
    /// "total room count" sizing heuristic).
    pub fn total_normal_rooms(&self) -> u32 {
        self.room_counts.values().sum()
    }
}
