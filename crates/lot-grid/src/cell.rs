//! Cell kinds and per-cell state.

use lot_core::{AgentId, Pos};

/// What occupies or makes up a grid cell.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellKind {
    Entrance,
    #[default]
    Aisle,
    Wall,
    ParkingSpace,
    /// Held by an agent; the underlying kind is kept in [`Cell::surface`].
    Vehicle,
    /// An aisle closed by an obstruction event.
    ClosedAisle,
}

impl CellKind {
    /// `true` for the kinds agents drive over.
    #[inline]
    pub fn is_roadway(self) -> bool {
        matches!(self, CellKind::Entrance | CellKind::Aisle)
    }
}

/// The state of one grid cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub pos: Pos,

    /// Current kind.  `Vehicle` while an agent holds the cell.
    pub kind: CellKind,

    /// The kind to restore when the occupant leaves.  Equals `kind` for
    /// unoccupied cells.
    pub surface: CellKind,

    /// Predicted ticks before the cell becomes free.  Never understated.
    pub wait_time: u32,

    /// Agent whose estimate `wait_time` currently carries.
    pub wait_owner: Option<AgentId>,

    pub occupant: Option<AgentId>,

    /// Whether the occupant is mid-transit.  Meaningless when unoccupied.
    pub is_moving: bool,
}

impl Cell {
    pub fn new(pos: Pos, kind: CellKind) -> Self {
        Self {
            pos,
            kind,
            surface: kind,
            wait_time: 0,
            wait_owner: None,
            occupant: None,
            is_moving: false,
        }
    }

    /// Whether a planner may expand this cell.
    ///
    /// Walls, parking spaces and closed aisles never are.  A `Vehicle` cell
    /// is, as long as the vehicle sits on roadway (a reserved parking space
    /// stays out of bounds for routing).
    #[inline]
    pub fn is_traversable(&self) -> bool {
        match self.kind {
            CellKind::Entrance | CellKind::Aisle => true,
            CellKind::Vehicle => self.surface.is_roadway(),
            CellKind::Wall | CellKind::ParkingSpace | CellKind::ClosedAisle => false,
        }
    }

    /// Roadway, or a moving vehicle on roadway.
    #[inline]
    pub fn is_passable(&self) -> bool {
        match self.kind {
            CellKind::Entrance | CellKind::Aisle => true,
            CellKind::Vehicle => self.is_moving && self.surface.is_roadway(),
            _ => false,
        }
    }

    /// Can `agent` take this cell right now?  Unoccupied roadway, or a cell
    /// the agent already holds.
    #[inline]
    pub fn is_free_for(&self, agent: AgentId) -> bool {
        match self.occupant {
            Some(holder) => holder == agent,
            None => self.kind.is_roadway(),
        }
    }
}
