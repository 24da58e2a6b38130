//! Core type definitions shared across the assignment engine.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Generational key minted by [`crate::staff::Roster`] for one `optimize` call.
    pub struct StaffId;
}

/// The two buildings the hotel comprises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Building {
    Main,
    Annex,
}

impl Building {
    pub fn as_str(self) -> &'static str {
        match self {
            Building::Main => "main",
            Building::Annex => "annex",
        }
    }
}

/// A symbolic room-type code, e.g. `"S"`, `"T"`, `"ANT"`.
///
/// Classification into twin / single-like is delegated to [`RoomTypeSet`]
/// rather than baked into the type itself, since the twin set is
/// configurable at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomType(pub String);

impl RoomType {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomType {
    fn from(s: &str) -> Self {
        RoomType::new(s)
    }
}

/// The configurable set of room-type codes classified as "twin".
///
/// Defaults to `{T, TW, ANT, ADT}`. Anything not in the set is single-like,
/// including unrecognized codes.
#[derive(Debug, Clone)]
pub struct RoomTypeSet {
    twin_codes: std::collections::HashSet<String>,
}

impl Default for RoomTypeSet {
    fn default() -> Self {
        Self::new(["T", "TW", "ANT", "ADT"])
    }
}

impl RoomTypeSet {
    pub fn new<I, S>(twin_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            twin_codes: twin_codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_twin(&self, code: &RoomType) -> bool {
        self.twin_codes.contains(&code.0)
    }

    pub fn is_single_like(&self, code: &RoomType) -> bool {
        !self.is_twin(code)
    }
}
