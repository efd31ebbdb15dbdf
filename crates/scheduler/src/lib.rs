//! Asynchronous parse scheduling for a single, non-reentrant parsing engine.
//!
//! Three rates meet here:
//! * bursty reparse requests from many callers at different [`Priority`] levels,
//! * one serial engine ([`Parser`]) that must never be re-entered,
//! * a host-owned [`LexiconStore`] that may only be mutated from the host's
//!   own thread during idle windows ([`IdleHost`]).
//!
//! # Architecture
//!
//! ```text
//! caller ──► Scheduler::enqueue ──► priority lanes ──► engine thread ──► ParseWorker ──► Parser
//!                                                                            │
//!                                                 ResultFiler ◄──────────────┘
//!                                                      │ schedule_on_idle
//!                                                      ▼
//!                                    host thread: one non-undoable transaction
//!                                                      │
//!                                WorkTicket::filed ────┴──► WordformFiled subscribers
//! ```
//!
//! Every enqueued item owns one [`WorkTicket`]; the ticket's single release is
//! what keeps [`Scheduler::queue_depth`] honest.

pub mod config;
pub mod engine;
pub mod error;
pub mod filer;
pub mod host;
pub mod item;
pub mod ledger;
pub mod scheduler;
pub mod stale;
pub mod store;
pub mod worker;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::{ConfigError, Normalization, SchedulerConfig};
pub use engine::Parser;
pub use error::{EngineError, SchedulerError, SchedulerFailure};
pub use filer::{FilerStats, ResultFiler};
pub use host::{IdleCallback, IdleHost, IdleQueue, IdleStatus, IdleTier, TransactionGuard};
pub use item::{WordformFiled, WorkItem};
pub use ledger::{LedgerSnapshot, OutstandingCounts, TicketState, WorkTicket};
pub use lexa_primitives::{
	Agent, AnalysisId, FormId, InflTypeId, MsaId, Opinion, ParseAnalysis, ParseMorph, ParseResult, Priority, ProblemId, RecordClass,
	WordformId,
};
pub use lexa_progress::{ProgressSink, TaskPhase, TaskReport, TaskSnapshot};
pub use scheduler::{Scheduler, SchedulerBuilder};
pub use stale::StaleModelDetector;
pub use store::{AnalysisView, LexiconStore, MemoryStore, StoreEdit};
pub use worker::{ParseWorker, SkipReason, UpdateOutcome};
