use std::collections::BTreeMap;

use clean_core::{
    Building, BuildingData, FloorInfo, OptimizeConfig, Roster, RoomType, RoomTypeSet, StaffConstraints,
    StaffDistribution, optimize,
};

fn floor(building: Building, number: i32, single: u32, twin: u32, eco: u32) -> FloorInfo {
    let mut counts = BTreeMap::new();
    if single > 0 {
        counts.insert(RoomType::new("S"), single);
    }
    if twin > 0 {
        counts.insert(RoomType::new("T"), twin);
    }
    FloorInfo::new(number, building, counts, eco)
}

#[test]
fn trivial_single_staff_clears_one_floor() {
    let building_data = BuildingData::new([floor(Building::Main, 1, 4, 0, 0)]);

    let mut roster = Roster::new();
    let alice = roster.add("Alice");

    let mut distribution = BTreeMap::new();
    distribution.insert(
        alice,
        StaffDistribution { main_single: 4, ..Default::default() },
    );
    let constraints = BTreeMap::new();

    let results = optimize(
        &building_data,
        &roster,
        &distribution,
        &constraints,
        &RoomTypeSet::default(),
        &OptimizeConfig::default(),
    )
    .expect("single staff, single floor must be trivially feasible");

    let best = &results[0];
    assert!(best.is_complete);
    assert_eq!(best.assignments.len(), 1);
    assert_eq!(best.assignments[0].total_rooms(), 4);
    assert!(best.unassigned_rooms.is_complete());
}

#[test]
fn round_robin_splits_twin_floor_evenly() {
    let building_data = BuildingData::new([floor(Building::Main, 1, 0, 4, 0)]);

    let mut roster = Roster::new();
    let alice = roster.add("Alice");
    let bob = roster.add("Bob");

    let mut distribution = BTreeMap::new();
    distribution.insert(alice, StaffDistribution { main_twin: 2, ..Default::default() });
    distribution.insert(bob, StaffDistribution { main_twin: 2, ..Default::default() });
    let constraints = BTreeMap::new();

    let results = optimize(
        &building_data,
        &roster,
        &distribution,
        &constraints,
        &RoomTypeSet::default(),
        &OptimizeConfig::default(),
    )
    .expect("even twin split must be feasible");

    let best = &results[0];
    assert!(best.is_complete);
    for assignment in &best.assignments {
        assert_eq!(assignment.total_rooms(), 2);
        assert_eq!(assignment.floor_count(), 1);
    }
}

#[test]
fn bath_cleaner_is_confined_to_one_floor() {
    let building_data = BuildingData::new([
        floor(Building::Main, 1, 3, 0, 0),
        floor(Building::Main, 2, 5, 0, 0),
    ]);

    let mut roster = Roster::new();
    let bath = roster.add("Bath Cleaner");

    let mut distribution = BTreeMap::new();
    distribution.insert(bath, StaffDistribution { main_single: 3, ..Default::default() });

    let mut constraints = BTreeMap::new();
    constraints.insert(
        bath,
        StaffConstraints { bath_type: clean_core::BathCleaningType::Normal, ..Default::default() },
    );

    let results = optimize(
        &building_data,
        &roster,
        &distribution,
        &constraints,
        &RoomTypeSet::default(),
        &OptimizeConfig::default(),
    )
    .expect("bath cleaner pre-placement must succeed");

    let best = &results[0];
    let assignment = &best.assignments[0];
    assert_eq!(assignment.floor_count(), 1, "bath cleaner must stay on one floor");
    // Placed on floor 1: the smallest floor that still fits their quota.
    assert!(assignment.assignments(Building::Main).contains_key(&1));
}

#[test]
fn eco_rooms_only_go_to_staff_already_on_the_floor() {
    let building_data = BuildingData::new([floor(Building::Main, 1, 4, 0, 2)]);

    let mut roster = Roster::new();
    let alice = roster.add("Alice");

    let mut distribution = BTreeMap::new();
    distribution.insert(
        alice,
        StaffDistribution { main_single: 4, main_eco: 2, ..Default::default() },
    );
    let constraints = BTreeMap::new();

    let results = optimize(
        &building_data,
        &roster,
        &distribution,
        &constraints,
        &RoomTypeSet::default(),
        &OptimizeConfig::default(),
    )
    .expect("eco rooms on an already-covered floor must be assignable");

    let best = &results[0];
    assert!(best.is_complete);
    let allocation = &best.assignments[0].assignments(Building::Main)[&1];
    assert_eq!(allocation.eco_rooms, 2);
}

/// Two staff already covering adjacent floors, with every eco room sitting
/// on just one of those floors, still end up with an even eco split: the
/// floor-cap budget and the adjacent-floor exception both let the
/// off-floor staff member pick up their share instead of leaving it
/// stranded on the floor they don't otherwise cover.
#[test]
fn eco_spreads_evenly_across_two_adjacent_floors() {
    let building_data = BuildingData::new([
        floor(Building::Main, 2, 3, 0, 4),
        floor(Building::Main, 3, 3, 0, 0),
    ]);

    let mut roster = Roster::new();
    let alice = roster.add("Alice");
    let bob = roster.add("Bob");

    let mut distribution = BTreeMap::new();
    distribution.insert(alice, StaffDistribution { main_single: 3, main_eco: 2, ..Default::default() });
    distribution.insert(bob, StaffDistribution { main_single: 3, main_eco: 2, ..Default::default() });
    let constraints = BTreeMap::new();

    let results = optimize(
        &building_data,
        &roster,
        &distribution,
        &constraints,
        &RoomTypeSet::default(),
        &OptimizeConfig::default(),
    )
    .expect("adjacent-floor eco split must be feasible");

    let best = &results[0];
    assert!(best.is_complete);
    let total_eco: u32 = best
        .assignments
        .iter()
        .map(|a| a.assignments(Building::Main).values().map(|r| r.eco_rooms).sum::<u32>())
        .sum();
    assert_eq!(total_eco, 4);
    for assignment in &best.assignments {
        let eco: u32 = assignment.assignments(Building::Main).values().map(|r| r.eco_rooms).sum();
        assert_eq!(eco, 2, "each staff member ends up with their full eco quota");
    }
}

#[test]
fn overcommitted_quota_produces_partial_solution_with_shortage() {
    let building_data = BuildingData::new([floor(Building::Main, 1, 4, 0, 0)]);

    let mut roster = Roster::new();
    let alice = roster.add("Alice");

    let mut distribution = BTreeMap::new();
    // Quota exceeds the building's actual rooms: always-infeasible by design.
    distribution.insert(
        alice,
        StaffDistribution { main_single: 10, ..Default::default() },
    );
    let constraints = BTreeMap::new();

    let results = optimize(
        &building_data,
        &roster,
        &distribution,
        &constraints,
        &RoomTypeSet::default(),
        &OptimizeConfig::default(),
    )
    .expect("overcommitted quota still returns a best-effort partial result");

    let best = &results[0];
    assert!(!best.is_complete);
    assert_eq!(best.assignments[0].total_rooms(), 4, "all 4 existing rooms get cleaned anyway");
}

#[test]
fn k_solutions_enumerate_distinct_candidates() {
    let building_data = BuildingData::new([floor(Building::Main, 1, 0, 6, 0)]);

    let mut roster = Roster::new();
    let alice = roster.add("Alice");
    let bob = roster.add("Bob");
    let carol = roster.add("Carol");

    let mut distribution = BTreeMap::new();
    distribution.insert(alice, StaffDistribution { main_twin: 2, ..Default::default() });
    distribution.insert(bob, StaffDistribution { main_twin: 2, ..Default::default() });
    distribution.insert(carol, StaffDistribution { main_twin: 2, ..Default::default() });
    let constraints = BTreeMap::new();

    let config = OptimizeConfig::default().with_k(3);

    let results = optimize(
        &building_data,
        &roster,
        &distribution,
        &constraints,
        &RoomTypeSet::default(),
        &config,
    )
    .expect("three-way even split must be feasible");

    assert!(!results.is_empty());
    assert!(results.len() <= 3);
    assert!(results[0].is_complete);
}

#[test]
fn empty_roster_is_a_successful_empty_result() {
    let building_data = BuildingData::new([floor(Building::Main, 1, 4, 0, 0)]);
    let roster = Roster::new();
    let distribution = BTreeMap::new();
    let constraints = BTreeMap::new();

    let results = optimize(
        &building_data,
        &roster,
        &distribution,
        &constraints,
        &RoomTypeSet::default(),
        &OptimizeConfig::default(),
    )
    .expect("an empty roster is success, not an error");

    assert_eq!(results.len(), 1);
    assert!(results[0].is_complete);
    assert!(results[0].assignments.is_empty());
}

#[test]
fn missing_distribution_for_nonempty_roster_is_an_error() {
    let building_data = BuildingData::new([floor(Building::Main, 1, 4, 0, 0)]);
    let mut roster = Roster::new();
    roster.add("Alice");
    let distribution = BTreeMap::new();
    let constraints = BTreeMap::new();

    let err = optimize(
        &building_data,
        &roster,
        &distribution,
        &constraints,
        &RoomTypeSet::default(),
        &OptimizeConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(err, clean_core::OptimizeError::MissingDistribution));
}
