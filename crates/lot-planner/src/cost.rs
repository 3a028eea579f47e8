//! Heuristic and edge cost.
//!
//! Moves are unit-cost cardinal steps, so the Manhattan distance is an
//! admissible heuristic.  On top of the unit step, a privileged agent in
//! congestion-aware mode pays for the part of a neighbour's published wait
//! time that outlasts its own arrival there:
//!
//! ```text
//! cost(g → n) = 1 + max(n.wait - (g + 1), 0)
//! ```

use lot_core::{AgentClass, CostMode, Pos};

/// Edge cost function, parameterised by the run's [`CostMode`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CostModel {
    pub mode: CostMode,
}

impl CostModel {
    pub fn new(mode: CostMode) -> Self {
        Self { mode }
    }

    /// Manhattan distance to `target`.
    #[inline]
    pub fn heuristic(&self, from: Pos, target: Pos) -> u32 {
        from.manhattan(target)
    }

    /// Cost of stepping into a neighbour whose published wait time is
    /// `neighbor_wait`, from a cell reached at accumulated cost `g`.
    #[inline]
    pub fn edge_cost(&self, class: AgentClass, g: u32, neighbor_wait: u32) -> u32 {
        let arrival = g.saturating_add(1);
        1 + self.wait_penalty(class, arrival, neighbor_wait)
    }

    /// The residual block beyond `arrival`, or zero when this agent does not
    /// account for congestion.
    #[inline]
    pub fn wait_penalty(&self, class: AgentClass, arrival: u32, neighbor_wait: u32) -> u32 {
        let charged = self.mode == CostMode::CongestionAware && class.sees_congestion();
        if charged && neighbor_wait > 0 {
            neighbor_wait.saturating_sub(arrival)
        } else {
            0
        }
    }
}
