#![forbid(unsafe_code)]

//! Logging macros for cell internals.
//!
//! With the `tracing` feature these are the `tracing` macros. Without it they
//! expand to nothing, so call sites never need their own `cfg` gates. The
//! `log_` prefix keeps them clear of the built-in `warn` lint attribute.

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug as log_debug, trace as log_trace, warn as log_warn};

#[cfg(not(feature = "tracing"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use log_debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use log_trace;
#[cfg(not(feature = "tracing"))]
pub(crate) use log_warn;
