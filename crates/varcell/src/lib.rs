#![forbid(unsafe_code)]

//! Value cells with change detection and memoized derivation.
//!
//! A cell holds an externally supplied source, compares a fresh copy of it
//! with the last observed snapshot, and recomputes its derived result only
//! when the two differ.
//!
//! # Example
//!
//! ```
//! use varcell::{Outcome, ValueCell, WorkValueCell};
//!
//! let mut cell = ValueCell::new(0);
//!
//! let outcome = cell.apply_source_change_with(
//!     || 5,
//!     |x| x * 2,
//!     |old, new| assert_eq!((old, *new), (None, 5)),
//! );
//! assert_eq!(outcome, Outcome::Changed);
//! assert_eq!(*cell.result(), 10);
//!
//! // Same snapshot: the converter does not run.
//! let outcome = cell.apply_source_change(|| 5, |_| unreachable!());
//! assert_eq!(outcome, Outcome::Unchanged);
//! assert_eq!(*cell.result(), 10);
//!
//! // A work cell mirrors every result into an editable work value.
//! let mut form: WorkValueCell<(), String> = WorkValueCell::mirrored(String::new());
//! form.work_mut().push_str("draft");
//! let edited = form.work().clone();
//! form.apply_work_change(|| edited.clone());
//! assert_eq!(form.result(), "draft");
//! ```
//!
//! # Feature flags
//!
//! - `tracing`: emit `varcell.changed`, `varcell.unchanged` and
//!   `varcell.produce.failed` events through the `tracing` crate.

pub mod cell;
pub mod config;
pub mod error;
mod logging;
pub mod outcome;

pub use cell::{Apply, ResultOnly, Slot, ValueCell, WorkMirror, WorkValueCell};
pub use config::{CellConfig, Commit, Produce};
pub use error::CellError;
pub use outcome::Outcome;
