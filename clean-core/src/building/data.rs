//! Ordered per-building floor collections.

use super::floor::FloorInfo;
use crate::types::Building;

/// Ordered sequences of floors for both buildings, plus cached totals.
///
/// Floor numbers are unique within a building but may repeat across
/// buildings (e.g. main 2F and annex 2F are distinct floors).
#[derive(Debug, Clone, Default)]
pub struct BuildingData {
    /// Ascending by `floor_number`.
    main_floors: Vec<FloorInfo>,
    /// Ascending by `floor_number`.
    annex_floors: Vec<FloorInfo>,
    main_room_count: u32,
    annex_room_count: u32,
}

impl BuildingData {
    /// Builds from an unordered floor list, sorting each building's floors
    /// ascending and rejecting duplicate floor numbers within one building.
    pub fn new(floors: impl IntoIterator<Item = FloorInfo>) -> Self {
        let mut main_floors = Vec::new();
        let mut annex_floors = Vec::new();

        for floor in floors {
            match floor.building {
                Building::Main => main_floors.push(floor),
                Building::Annex => annex_floors.push(floor),
            }
        }

        main_floors.sort_by_key(|f| f.floor_number);
        annex_floors.sort_by_key(|f| f.floor_number);
        assert!(
            main_floors.windows(2).all(|w| w[0].floor_number != w[1].floor_number),
            "duplicate main floor number"
        );
        assert!(
            annex_floors.windows(2).all(|w| w[0].floor_number != w[1].floor_number),
            "duplicate annex floor number"
        );

        let main_room_count = main_floors.iter().map(|f| f.total_normal_rooms()).sum();
        let annex_room_count = annex_floors.iter().map(|f| f.total_normal_rooms()).sum();

        Self {
            main_floors,
            annex_floors,
            main_room_count,
            annex_room_count,
        }
    }

    pub fn floors(&self, building: Building) -> &[FloorInfo] {
        match building {
            Building::Main => &self.main_floors,
            Building::Annex => &self.annex_floors,
        }
    }

    pub fn floor(&self, building: Building, floor_number: i32) -> Option<&FloorInfo> {
        self.floors(building)
            .iter()
            .find(|f| f.floor_number == floor_number)
    }

    /// Total non-eco rooms in a building, cached at construction.
    pub fn room_count(&self, building: Building) -> u32 {
        match building {
            Building::Main => self.main_room_count,
            Building::Annex => self.annex_room_count,
        }
    }

    pub fn floor_count(&self, building: Building) -> usize {
        self.floors(building).len()
    }

    pub fn total_rooms(&self) -> u32 {
        self.main_floors.iter().map(|f| f.total_rooms()).sum::<u32>()
            + self.annex_floors.iter().map(|f| f.total_rooms()).sum::<u32>()
    }

    pub fn is_empty(&self) -> bool {
        self.main_floors.is_empty() && self.annex_floors.is_empty()
    }
}
