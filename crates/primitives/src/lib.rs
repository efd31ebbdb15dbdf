//! Value types shared by the parser scheduling pipeline: entity references,
//! priorities, parse results and opinion flags.

/// Stable identifiers for records owned by the lexicon store.
pub mod ids;
/// Approval flags attached to analyses.
pub mod opinion;
/// Immutable parse output.
pub mod parse;
/// Work priorities.
pub mod priority;
/// Record classes reported by store change notifications.
pub mod record;

pub use ids::{AnalysisId, FormId, InflTypeId, MsaId, ProblemId, WordformId};
pub use opinion::{Agent, Opinion};
pub use parse::{ParseAnalysis, ParseMorph, ParseResult};
pub use priority::Priority;
pub use record::RecordClass;
