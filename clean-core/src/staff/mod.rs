pub mod constraint;
pub mod distribution;
#[allow(clippy::module_inception)]
pub mod staff;

pub use constraint::{BathCleaningType, BuildingAssignment, ConstraintKind};
pub use distribution::StaffDistribution;
pub use staff::{Roster, Staff, StaffConstraints, max_floors, max_floors_per_building};
