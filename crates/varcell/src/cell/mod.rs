#![forbid(unsafe_code)]

//! Change-detecting value cells.
//!
//! - [`ValueCell`]: holds source and result snapshots and recomputes the
//!   result only when a freshly copied snapshot differs from the stored one.
//! - [`WorkValueCell`]: a `ValueCell` whose result is mirrored into a work
//!   value that can also be published through its own path.
//! - [`Apply`]: the strategy deciding which [`Slot`]s a recomputation fills.
//!
//! # Architecture
//!
//! Cells own their state directly and take `&mut self` for every update, so
//! a cell has exactly one driver at a time. The owner supplies snapshot
//! accessors and producers as closures; the cell performs no I/O of its own.
//!
//! # Invariants
//!
//! 1. A producer is never called when the new snapshot equals the last one.
//! 2. The notification callback runs exactly once per update call, after
//!    every slot has been written.
//! 3. Under [`Produce::Once`](crate::Produce::Once), all slots hold equal
//!    values after every update.

pub mod apply;
pub mod value;
pub mod work;

pub use apply::{Apply, ResultOnly, Slot, WorkMirror};
pub use value::ValueCell;
pub use work::WorkValueCell;
