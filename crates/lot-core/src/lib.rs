//! `lot-core`: foundational types for the `lotsim` parking-grid simulator.
//!
//! This crate is a dependency of every other `lot-*` crate.  It has no
//! `lot-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                 |
//! |-------------|----------------------------------------------------------|
//! | [`ids`]     | `AgentId`                                                |
//! | [`pos`]     | `Pos` grid coordinate, cardinal neighbours, Manhattan    |
//! | [`class`]   | `AgentClass`, `CostMode`                                 |
//! | [`time`]    | `SimConfig`, `ObstructionSpec`                           |
//! | [`rng`]     | `SimRng` (seeded, deterministic)                         |
//! | [`error`]   | `LotError`, `LotResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod class;
pub mod error;
pub mod ids;
pub mod pos;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use class::{AgentClass, CostMode};
pub use error::{LotError, LotResult};
pub use ids::AgentId;
pub use pos::Pos;
pub use rng::SimRng;
pub use time::{ObstructionSpec, SimConfig};
