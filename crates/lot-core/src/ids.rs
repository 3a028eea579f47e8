//! Strongly typed agent identifier.
//!
//! `AgentId` is `Copy + Ord + Hash` so it can be used as a map key and sorted
//! without ceremony.  The inner integer is `pub` for direct construction in
//! drivers and tests.

use std::fmt;

/// Unique identity of one vehicle for the whole run.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentId(pub u32);

impl AgentId {
    /// Cast to `usize` for direct use as a `Vec` index.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Single-character label used by text renderers: cycling `A` to `Z`.
    pub fn glyph(self) -> char {
        (b'A' + (self.0 % 26) as u8) as char
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.0)
    }
}
