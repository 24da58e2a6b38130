//! Property-style checks that should hold for any feasible optimization,
//! built from hand-constructed scenarios rather than generated inputs.

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

/// Every room accounted for is either assigned exactly once or reported
/// unassigned; nothing is double-counted or silently dropped.
#[test]
fn floor_accounting_law_holds() {
    let building_data = BuildingData::new([
        floor(Building::Main, 1, 4, 2, 1),
        floor(Building::Main, 2, 3, 0, 0),
        floor(Building::Annex, 1, 2, 2, 0),
    ]);

    let mut roster = Roster::new();
    let alice = roster.add("Alice");
    let bob = roster.add("Bob");

    let mut distribution = BTreeMap::new();
    distribution.insert(
        alice,
        StaffDistribution { main_single: 4, main_twin: 1, main_eco: 1, ..Default::default() },
    );
    distribution.insert(
        bob,
        StaffDistribution { main_single: 3, main_twin: 1, annex_single: 2, annex_twin: 2, ..Default::default() },
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
    .unwrap();

    for result in &results {
        let total_original = building_data.total_rooms();
        let assigned: u32 = result.assignments.iter().map(|a| a.total_rooms()).sum();
        let unassigned = result.unassigned_rooms.total();
        assert_eq!(assigned + unassigned, total_original);
    }
}

/// A plain staff member (no contractor/bath exemption) never exceeds the
/// two-floor cap, and never two floors in the same building when both
/// buildings carry a non-zero quota for them.
#[test]
fn plain_staff_never_exceeds_floor_caps() {
    let building_data = BuildingData::new([
        floor(Building::Main, 1, 2, 0, 0),
        floor(Building::Main, 2, 2, 0, 0),
        floor(Building::Main, 3, 2, 0, 0),
        floor(Building::Annex, 1, 2, 0, 0),
        floor(Building::Annex, 2, 2, 0, 0),
    ]);

    let mut roster = Roster::new();
    let alice = roster.add("Alice");

    let mut distribution = BTreeMap::new();
    distribution.insert(
        alice,
        StaffDistribution { main_single: 4, annex_single: 2, ..Default::default() },
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
    .unwrap();

    for result in &results {
        let assignment = &result.assignments[0];
        assert!(assignment.floor_count() <= 2);
        assert!(assignment.assignments(Building::Main).len() <= 1);
        assert!(assignment.assignments(Building::Annex).len() <= 1);
    }
}

/// A bath cleaner's eco target on a floor they don't already cover goes
/// unassigned rather than opening a second floor for them: a bath cleaner's
/// floor cap is 1, there is no adjacent floor to ride on, and a bath
/// cleaner is never exempt as a contractor would be.
#[test]
fn bath_cleaner_eco_never_opens_a_second_floor() {
    let building_data = BuildingData::new([
        floor(Building::Main, 1, 2, 0, 2),
        floor(Building::Main, 5, 5, 0, 0),
    ]);

    let mut roster = Roster::new();
    let bath = roster.add("Bath Cleaner");

    let mut distribution = BTreeMap::new();
    distribution.insert(
        bath,
        StaffDistribution { main_single: 5, main_eco: 2, ..Default::default() },
    );
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
    .unwrap();

    let best = &results[0];
    let assignment = &best.assignments[0];
    assert_eq!(assignment.floor_count(), 1, "bath cleaner stays on their one pre-placed floor");
    assert!(!assignment.assignments(Building::Main).contains_key(&1));
    assert_eq!(best.unassigned_rooms.main_building[0].eco, 2, "eco on the uncovered floor is left unassigned");
}

/// A plain staff member (floor cap 2) may open a *second* floor purely for
/// eco rooms, as long as they are still within their floor-cap budget, even
/// when that floor is nowhere near the floor they already cover.
#[test]
fn eco_may_open_a_new_floor_within_the_staff_floor_cap() {
    let building_data = BuildingData::new([
        floor(Building::Main, 1, 2, 0, 0),
        floor(Building::Main, 10, 0, 0, 3),
    ]);

    let mut roster = Roster::new();
    let alice = roster.add("Alice");

    let mut distribution = BTreeMap::new();
    distribution.insert(
        alice,
        StaffDistribution { main_single: 2, main_eco: 3, ..Default::default() },
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
    .unwrap();

    let best = &results[0];
    assert!(best.is_complete);
    let assignment = &best.assignments[0];
    assert_eq!(assignment.floor_count(), 2, "floor 10 opened purely for eco, within the cap of 2");
    assert_eq!(assignment.assignments(Building::Main)[&10].eco_rooms, 3);
}

/// A contractor (`LowerRange`) is exempt from the floor cap entirely.
#[test]
fn contractor_is_exempt_from_floor_cap() {
    let building_data = BuildingData::new([
        floor(Building::Main, 1, 2, 0, 0),
        floor(Building::Main, 2, 2, 0, 0),
        floor(Building::Main, 3, 2, 0, 0),
        floor(Building::Main, 4, 2, 0, 0),
    ]);

    let mut roster = Roster::new();
    let contractor = roster.add("Contractor");

    let mut distribution = BTreeMap::new();
    distribution.insert(
        contractor,
        StaffDistribution { main_single: 8, ..Default::default() },
    );
    let mut constraints = BTreeMap::new();
    constraints.insert(
        contractor,
        StaffConstraints {
            kind: clean_core::ConstraintKind::LowerRange { min: 4, max: 12 },
            ..Default::default()
        },
    );

    let results = optimize(
        &building_data,
        &roster,
        &distribution,
        &constraints,
        &RoomTypeSet::default(),
        &OptimizeConfig::default(),
    )
    .unwrap();

    let best = &results[0];
    assert!(best.is_complete);
    assert_eq!(best.assignments[0].floor_count(), 4, "contractor may cover every floor");
}

/// Requesting `k` solutions never returns duplicate (by room-for-room
/// fingerprint) candidates.
#[test]
fn k_solutions_are_never_duplicates() {
    let building_data = BuildingData::new([floor(Building::Main, 1, 0, 8, 0)]);

    let mut roster = Roster::new();
    let alice = roster.add("Alice");
    let bob = roster.add("Bob");

    let mut distribution = BTreeMap::new();
    distribution.insert(alice, StaffDistribution { main_twin: 4, ..Default::default() });
    distribution.insert(bob, StaffDistribution { main_twin: 4, ..Default::default() });
    let constraints = BTreeMap::new();

    let config = OptimizeConfig::default().with_k(5);

    let results = optimize(
        &building_data,
        &roster,
        &distribution,
        &constraints,
        &RoomTypeSet::default(),
        &config,
    )
    .unwrap();

    let fingerprints: Vec<_> = results
        .iter()
        .map(|r| clean_core::fingerprint::fingerprint(&r.assignments, &roster))
        .collect();
    for i in 0..fingerprints.len() {
        for j in (i + 1)..fingerprints.len() {
            assert_ne!(fingerprints[i], fingerprints[j], "candidates {i} and {j} are identical");
        }
    }
}
