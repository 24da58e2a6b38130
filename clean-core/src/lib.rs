//! Housekeeping room-assignment engine.
//!
//! Given a day's building layout, an available staff roster, and a
//! pre-computed per-staff quota of rooms by building/type (the
//! [`StaffDistribution`]), [`optimize`] produces up to `k` candidate ways to
//! assign every room on every floor to a staff member, each staying inside
//! the floor-count, floor-sharing, and bath/eco carve-out rules described
//! below.
//!
//! ## Pipeline
//!
//! - `types`      Core identifiers and room-type classification
//! - `building`    Floor and building room composition
//! - `staff`       Staff identity, constraints, and quota distribution
//! - `floor_pool`  Mutable per-floor draw-down state shared by every stage
//! - `bath`        Bath-cleaner pre-placement (runs once, ahead of everything else)
//! - `pattern`     Twin-quota pattern generation for the search
//! - `twin`        Round-robin twin-room distribution for one pattern
//! - `single_solver` Single-room assignment with bounded shortage enumeration
//! - `eco_solver`  Eco-room balancing across staff already covering a floor
//! - `fingerprint` Candidate de-duplication
//! - `unassigned`  Post-hoc unassigned-room accounting
//! - `orchestrator` Ties every stage together behind [`optimize`]
//! - `config`      Tuning knobs ([`OptimizeConfig`])
//! - `error`       [`OptimizeError`]
//!
//! Every stage is deterministic: the same inputs always produce the same
//! `k` candidates in the same order, which lets callers retry or compare
//! runs without worrying about nondeterministic solver internals.

pub mod allocation;
pub mod bath;
pub mod building;
pub mod config;
pub mod eco_solver;
pub mod error;
pub mod fingerprint;
pub mod floor_pool;
pub mod orchestrator;
pub mod pattern;
pub mod single_solver;
pub mod staff;
pub mod twin;
pub mod types;
pub mod unassigned;

#[cfg(feature = "trace")]
pub use clean_trace;

// Core types
pub use types::{Building, RoomType, RoomTypeSet, StaffId};

// Building data
pub use building::{BuildingData, FloorInfo};

// Staff
pub use staff::{
    BathCleaningType, BuildingAssignment, ConstraintKind, Roster, Staff, StaffConstraints,
    StaffDistribution, max_floors, max_floors_per_building,
};

// Allocation / output types
pub use allocation::{
    FloorUnassigned, OptimizationResult, PartialSolutionResult, RoomAllocation, StaffAssignment,
    UnassignedRooms,
};

// Config and errors
pub use config::OptimizeConfig;
pub use error::OptimizeError;

// Entry point
pub use orchestrator::optimize;
