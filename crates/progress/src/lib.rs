//! Disposable progress tree.
//!
//! Every component of the parsing pipeline reports its work through
//! [`TaskReport`] nodes. A root node owns a sink callback; phase transitions
//! and notifications anywhere in its subtree are delivered to that sink as
//! immutable [`TaskSnapshot`]s.
//!
//! Nodes of one tree live in a single arena. Each node keeps its own `closed`
//! flag, and closing walks the subtree top-down checking that flag, so a child
//! closed out of order is never closed (or announced) twice.

mod report;
mod snapshot;

pub use report::{ProgressSink, TaskReport};
pub use snapshot::{TaskPhase, TaskSnapshot};
