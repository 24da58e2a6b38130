//! Tuning knobs for the orchestrator and its solver phases.
//!
//! A plain `Default`-able config struct threaded explicitly through the
//! call rather than read from process-wide state.

use std::ops::RangeInclusive;
use std::time::Duration;

/// Tuning parameters for one `optimize` call.
#[derive(Debug, Clone)]
pub struct OptimizeConfig {
    /// Requested number of distinct solutions. Default 7.
    pub k: usize,
    /// Cap on single-solver neighbour-move enumeration per pattern/floor-cap
    /// combination. Default 5.
    pub single_enumeration_cap: usize,
    /// How many best partial candidates the orchestrator retains across the
    /// whole relaxation loop. Default 10.
    pub best_partial_pool_size: usize,
    /// The max-staff-per-floor relaxation range the orchestrator walks,
    /// ascending, stopping at the first value with >= 1 complete candidate.
    /// Default `2..=7`.
    pub max_staff_per_floor_range: RangeInclusive<u32>,
    /// Wall-clock time limits handed straight to `highs` via
    /// `SolverModel::set_time_limit` for the single and eco MILPs,
    /// respectively. A solve that hits its limit returns `highs`'s best
    /// incumbent rather than the true optimum.
    pub single_solver_timeout: Duration,
    pub eco_solver_timeout: Duration,
    pub fallback_timeout: Duration,
    /// Optional caller-supplied wall-clock deadline for the whole call. The
    /// orchestrator checks it between patterns and between floor-cap values
    /// and returns the best-so-far partial if exceeded.
    pub deadline: Option<std::time::Instant>,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            k: 7,
            single_enumeration_cap: 5,
            best_partial_pool_size: 10,
            max_staff_per_floor_range: 2..=7,
            single_solver_timeout: Duration::from_secs(2),
            eco_solver_timeout: Duration::from_secs(10),
            fallback_timeout: Duration::from_secs(30),
            deadline: None,
        }
    }
}

impl OptimizeConfig {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_deadline(mut self, deadline: std::time::Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// True once `deadline` has passed, if one was set.
    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| std::time::Instant::now() >= d)
    }
}
