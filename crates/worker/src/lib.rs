//! Thread runtime primitives shared by the parser pipeline.
//!
//! The pipeline has exactly two thread roles: the dedicated engine thread
//! that drives the parser, and the host's own thread that runs idle
//! callbacks. [`TaskClass`] labels work with its role for tracing, and the
//! spawn and panic helpers give both roles the same fail-stop reporting.

mod class;
mod panic;
mod spawn;

pub use class::TaskClass;
pub use panic::{catch_panic, panic_message};
pub use spawn::{join_thread, spawn_named_thread};
