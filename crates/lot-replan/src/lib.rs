//! `lot-replan`: reacting to closures while agents are in flight.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                     |
//! |-----------------|--------------------------------------------------------------|
//! | [`monitor`]     | `EventMonitor`: injects configured closures into a run      |
//! | [`coordinator`] | `ReplanCoordinator`: drains the affected queue and reroutes |
//!
//! Executors detect that a closure invalidates their own route and hand
//! themselves over; nothing here scans agents.  The coordinator only ever
//! sees agents whose remaining route crosses a closed cell.

pub mod coordinator;
pub mod monitor;

#[cfg(test)]
mod tests;

pub use coordinator::ReplanCoordinator;
pub use monitor::{EventMonitor, random_closable_cell};
