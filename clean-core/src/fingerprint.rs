//! Candidate de-duplication.
//!
//! Two candidate solutions that give the same staff the same *set of
//! floors* count as the same solution even if they arrived via different
//! twin patterns or floor-cap relaxations, and even if the exact room-type
//! breakdown on a shared floor differs; we only want to surface each
//! distinct floor pattern once. This mirrors spec.md's canonical
//! `name:f1,f2,...;` string built from each staff's sorted `(building,
//! floor)` list, with staff themselves sorted by name — keeping the
//! building tagged alongside the floor number rather than folding both
//! into one offset integer space, since `BuildingData` never bounds floor
//! numbers and an offset can collide.

use crate::allocation::StaffAssignment;
use crate::staff::Roster;
use crate::types::Building;

/// A canonical, order-independent summary of one candidate solution: for
/// each staff (sorted by [`crate::staff::Staff::name`], the caller-facing
/// identity key), the sorted list of floors (across both buildings) they
/// cover at all, regardless of what is on those floors.
pub type Fingerprint = Vec<(String, Vec<(Building, i32)>)>;

pub fn fingerprint(assignments: &[StaffAssignment], roster: &Roster) -> Fingerprint {
    let mut out: Fingerprint = assignments
        .iter()
        .map(|assignment| {
            let name = roster
                .get(assignment.staff_id)
                .map(|s| s.name.clone())
                .unwrap_or_default();

            let mut floors: Vec<(Building, i32)> = Vec::new();
            for building in [Building::Main, Building::Annex] {
                for (&floor, allocation) in assignment.assignments(building) {
                    if !allocation.is_occupied() {
                        continue;
                    }
                    floors.push((building, floor));
                }
            }
            floors.sort_unstable();

            (name, floors)
        })
        .collect();

    // spec.md's canonical string sorts staff by name before emitting
    // `name:f1,f2,...;` for each; this is the same ordering, without
    // actually building the string.
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

/// Keeps only the first occurrence of each distinct fingerprint, in input
/// order, so earlier (generally lower-shortage) candidates win ties.
pub fn dedup_by_fingerprint<T>(items: Vec<T>, key: impl Fn(&T) -> Fingerprint) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let fp = key(&item);
        if seen.insert(fp) {
            out.push(item);
        }
    }
    out
}
