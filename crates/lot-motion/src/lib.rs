//! `lot-motion`: driving agents along granted routes on the shared grid.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                      |
//! |-----------------|---------------------------------------------------------------|
//! | [`context`]     | `SimulationContext`: everything one run shares               |
//! | [`obstruction`] | `ObstructionBoard`: closed cells + the raised flag           |
//! | [`queue`]       | `AffectedQueue`, `AffectedAgentInfo`: hand-off to replanning |
//! | [`ledger`]      | `Ledger`: profiles, fates, travel records, replan reports    |
//! | [`executor`]    | `MotionExecutor`, `Leg`, `MotionState`, `MotionOutcome`       |
//! | [`supervisor`]  | `Supervisor`: named worker threads, idle wait, join          |
//! | [`observer`]    | `LotObserver` hooks, `NoopObserver`                           |
//! | [`error`]       | `MotionError`, `MotionResult<T>`                              |
//!
//! # Movement model
//!
//! One thread per active leg.  Each tick an executor either performs the
//! occupancy handshake into the next cell of its route or counts a delay
//! tick, then republishes the wait estimate on its destination and sleeps
//! one tick quantum.  When an obstruction closes a cell still ahead of it,
//! the executor stops, packages an [`AffectedAgentInfo`] and hands it to the
//! [`AffectedQueue`]; from then on the replan coordinator owns the agent.

pub mod context;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod observer;
pub mod obstruction;
pub mod queue;
pub mod supervisor;


pub use context::SimulationContext;
pub use error::{MotionError, MotionResult};
pub use executor::{Leg, LegKind, MotionExecutor, MotionOutcome, MotionState};
pub use ledger::{AgentFate, AgentProfile, Ledger, ReplanOutcome, ReplanReport, TravelRecord};
pub use observer::{LotObserver, NoopObserver};
pub use obstruction::ObstructionBoard;
pub use queue::{AffectedAgentInfo, AffectedQueue};
pub use supervisor::Supervisor;
