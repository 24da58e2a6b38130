//! Staff identity, per-staff constraints, and the floor-cap policy.

use slotmap::SlotMap;

use super::constraint::{BathCleaningType, BuildingAssignment, ConstraintKind};
use super::distribution::StaffDistribution;
use crate::types::StaffId;

/// A staff member available on the target date. No lifecycle beyond a
/// single `optimize` call.
#[derive(Debug, Clone)]
pub struct Staff {
    pub id: StaffId,
    /// Identity key used for fingerprinting and stable ordering.
    pub name: String,
}

/// Constraint kind, building assignment, and bath-cleaner role for one
/// staff member.
///
/// Room-count distribution, building assignment, and bath-cleaner role can
/// each be described in more than one place upstream; this crate keeps a
/// single source of truth here to avoid the two disagreeing (see DESIGN.md).
#[derive(Debug, Clone, Copy)]
pub struct StaffConstraints {
    pub kind: ConstraintKind,
    pub building_assignment: BuildingAssignment,
    pub bath_type: BathCleaningType,
}

impl Default for StaffConstraints {
    fn default() -> Self {
        Self {
            kind: ConstraintKind::None,
            building_assignment: BuildingAssignment::Both,
            bath_type: BathCleaningType::None,
        }
    }
}

impl StaffConstraints {
    pub fn is_bath_cleaner(&self) -> bool {
        self.bath_type.is_bath_cleaner()
    }

    pub fn is_contractor(&self) -> bool {
        self.kind.is_contractor()
    }
}

/// The floor-cap policy:
///
/// - Bath cleaner: 1 (enforced by the pre-placer; the solver's cap is also
///   1, pinned hard throughout).
/// - Contractor (`LowerRange`): 99 (effectively unlimited).
/// - Otherwise: 2 total, with each building capped at 1 when the staff has
///   non-zero quota in both buildings (resolved as the stricter
///   interpretation: each building <= 1, total <= 2).
pub fn max_floors(constraints: &StaffConstraints) -> u32 {
    if constraints.is_bath_cleaner() {
        1
    } else if constraints.is_contractor() {
        99
    } else {
        2
    }
}

/// Per-building sub-cap implied by `max_floors`: when a staff member has
/// non-zero quota in both buildings, each building individually is capped
/// at 1 floor (so the total cap of 2 is reached by exactly one floor per
/// building, never two floors in one building and zero in the other).
pub fn max_floors_per_building(
    constraints: &StaffConstraints,
    distribution: &StaffDistribution,
) -> u32 {
    let total_cap = max_floors(constraints);
    let both_buildings_active = distribution.main_total() > 0 && distribution.annex_total() > 0;
    if both_buildings_active && total_cap == 2 {
        1
    } else {
        total_cap
    }
}

/// Owns stable [`StaffId`] keys for one `optimize` call, minting
/// generational entity ids via a `SlotMap`.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    staff: SlotMap<StaffId, Staff>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds staff in shift-sheet order; order affects round-robin fairness.
    pub fn add(&mut self, name: impl Into<String>) -> StaffId {
        self.staff.insert_with_key(|id| Staff {
            id,
            name: name.into(),
        })
    }

    pub fn get(&self, id: StaffId) -> Option<&Staff> {
        self.staff.get(id)
    }

    /// Iterates in insertion order (shift-sheet order).
    pub fn iter(&self) -> impl Iterator<Item = &Staff> {
        self.staff.values()
    }

    pub fn len(&self) -> usize {
        self.staff.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staff.is_empty()
    }
}
