//! Mutable per-floor remaining-room counts.

use std::collections::BTreeMap;

use crate::building::BuildingData;
use crate::types::{Building, RoomType};

/// Mutable draw-down state for one floor.
#[derive(Debug, Clone)]
pub struct FloorPoolState {
    normal_remaining: BTreeMap<RoomType, u32>,
    eco_remaining: u32,
}

impl FloorPoolState {
    pub fn new(room_counts: &BTreeMap<RoomType, u32>, eco_rooms: u32) -> Self {
        Self {
            normal_remaining: room_counts.clone(),
            eco_remaining: eco_rooms,
        }
    }

    /// Draws up to `count` non-twin-or-twin rooms, draining the codes with
    /// the largest remaining count first. If `count` exceeds what remains,
    /// draws everything that remains and logs a warning rather than raising.
    pub fn allocate_normal(&mut self, count: u32) -> BTreeMap<RoomType, u32> {
        self.allocate_normal_matching(count, |_| true)
    }

    /// As [`Self::allocate_normal`], but restricted to codes for which
    /// `matches` returns true (used by the bath pre-placer to draw twin
    /// codes and non-twin codes in separate passes).
    pub fn allocate_normal_matching(
        &mut self,
        count: u32,
        matches: impl Fn(&RoomType) -> bool,
    ) -> BTreeMap<RoomType, u32> {
        let mut taken = BTreeMap::new();
        let mut remaining_to_draw = count;

        while remaining_to_draw > 0 {
            let Some((code, available)) = self
                .normal_remaining
                .iter()
                .filter(|(code, &n)| n > 0 && matches(code))
                .max_by_key(|(code, &n)| (n, std::cmp::Reverse((*code).clone())))
                .map(|(code, &n)| (code.clone(), n))
            else {
                break;
            };

            let draw = remaining_to_draw.min(available);
            *self.normal_remaining.get_mut(&code).unwrap() -= draw;
            *taken.entry(code).or_insert(0) += draw;
            remaining_to_draw -= draw;
        }

        if remaining_to_draw > 0 {
            #[cfg(feature = "trace")]
            tracing::warn!(
                target: "floor_pool",
                requested = count,
                shortfall = remaining_to_draw,
                "floor pool exhausted before request satisfied"
            );
        }

        taken
    }

    /// Draws up to `count` eco rooms, capped at what remains.
    pub fn allocate_eco(&mut self, count: u32) -> u32 {
        let taken = count.min(self.eco_remaining);
        self.eco_remaining -= taken;
        if taken < count {
            #[cfg(feature = "trace")]
            tracing::warn!(
                target: "floor_pool",
                requested = count,
                shortfall = count - taken,
                "eco pool exhausted before request satisfied"
            );
        }
        taken
    }

    pub fn normal_remaining(&self) -> &BTreeMap<RoomType, u32> {
        &self.normal_remaining
    }

    pub fn normal_remaining_total(&self) -> u32 {
        self.normal_remaining.values().sum()
    }

    pub fn eco_remaining(&self) -> u32 {
        self.eco_remaining
    }
}

/// Per-optimization, per-floor pool state for both buildings.
#[derive(Debug, Clone, Default)]
pub struct FloorPools {
    main: BTreeMap<i32, FloorPoolState>,
    annex: BTreeMap<i32, FloorPoolState>,
}

impl FloorPools {
    pub fn from_building_data(data: &BuildingData) -> Self {
        let mut main = BTreeMap::new();
        let mut annex = BTreeMap::new();

        for floor in data.floors(Building::Main) {
            main.insert(
                floor.floor_number,
                FloorPoolState::new(floor.room_counts(), floor.eco_rooms),
            );
        }
        for floor in data.floors(Building::Annex) {
            annex.insert(
                floor.floor_number,
                FloorPoolState::new(floor.room_counts(), floor.eco_rooms),
            );
        }

        Self { main, annex }
    }

    pub fn get_mut(&mut self, building: Building, floor: i32) -> Option<&mut FloorPoolState> {
        match building {
            Building::Main => self.main.get_mut(&floor),
            Building::Annex => self.annex.get_mut(&floor),
        }
    }

    pub fn get(&self, building: Building, floor: i32) -> Option<&FloorPoolState> {
        match building {
            Building::Main => self.main.get(&floor),
            Building::Annex => self.annex.get(&floor),
        }
    }
}
