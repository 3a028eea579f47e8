//! `lot-grid`: the shared grid every agent drives on.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                      |
//! |------------|---------------------------------------------------------------|
//! | [`cell`]   | `CellKind`, `Cell`: type, occupancy, residual wait time      |
//! | [`grid`]   | `GridMap`: row-major cell storage + atomic compound updates  |
//! | [`layout`] | `GridBuilder` and the two reference parking-lot maps          |
//! | [`shared`] | `SharedGrid`: the lock discipline around one `GridMap`       |
//!
//! # Locking
//!
//! `GridMap` itself is a plain value with no interior mutability.  Runtime
//! components only ever see it through [`SharedGrid`], which serialises every
//! mutation behind one `parking_lot::Mutex`.  Compound updates (the
//! occupancy handshake, closure of a cell) run inside a single
//! [`SharedGrid::with`] call so no observer sees an intermediate state.

pub mod cell;
pub mod grid;
pub mod layout;
pub mod shared;


pub use cell::{Cell, CellKind};
pub use grid::GridMap;
pub use layout::GridBuilder;
pub use shared::SharedGrid;
