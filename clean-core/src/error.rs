//! Error kinds the caller of [`crate::orchestrator::optimize`] sees.
//!
//! An empty roster or empty building is deliberately not an error variant
//! here: it is a successful empty [`crate::allocation::OptimizationResult`]
//! (see orchestrator.rs).

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum OptimizeError {
    /// `StaffDistribution` is null/empty while staff is non-empty. The
    /// operator is expected to configure distribution before a call.
    #[error("no staff distribution configured for a non-empty staff roster")]
    MissingDistribution,

    /// Every pattern and every `max_staff_per_floor` value explored yielded
    /// neither a complete nor a partial candidate.
    #[error("no feasible or partial assignment found: {diagnostic}")]
    Infeasible { diagnostic: String },
}
