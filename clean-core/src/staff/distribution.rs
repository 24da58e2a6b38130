//! Per-staff quota vector.

/// Six integer quota bins, pre-computed by an operator outside this crate.
///
/// Invariants: all bins non-negative (`u32`). The sum over all staff of
/// each bin *should* equal the corresponding building/type total, but the
/// solver is tolerant of shortfall; overflow is not expected but if present
/// is treated as a shortage elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaffDistribution {
    pub main_single: u32,
    pub main_twin: u32,
    pub main_eco: u32,
    pub annex_single: u32,
    pub annex_twin: u32,
    pub annex_eco: u32,
}

impl StaffDistribution {
    pub fn total(&self) -> u32 {
        self.main_single
            + self.main_twin
            + self.main_eco
            + self.annex_single
            + self.annex_twin
            + self.annex_eco
    }

    pub fn main_total(&self) -> u32 {
        self.main_single + self.main_twin + self.main_eco
    }

    pub fn annex_total(&self) -> u32 {
        self.annex_single + self.annex_twin + self.annex_eco
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn single(&self, building: crate::types::Building) -> u32 {
        match building {
            crate::types::Building::Main => self.main_single,
            crate::types::Building::Annex => self.annex_single,
        }
    }

    pub fn twin(&self, building: crate::types::Building) -> u32 {
        match building {
            crate::types::Building::Main => self.main_twin,
            crate::types::Building::Annex => self.annex_twin,
        }
    }

    pub fn eco(&self, building: crate::types::Building) -> u32 {
        match building {
            crate::types::Building::Main => self.main_eco,
            crate::types::Building::Annex => self.annex_eco,
        }
    }
}
