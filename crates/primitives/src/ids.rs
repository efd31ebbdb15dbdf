use std::fmt;

macro_rules! define_id {
	($(#[$meta:meta])* $name:ident, $prefix:literal) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub struct $name(pub u64);

		impl $name {
			/// Returns the raw identifier value.
			#[inline]
			pub const fn get(self) -> u64 {
				self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, concat!($prefix, "#{}"), self.0)
			}
		}

		impl From<u64> for $name {
			fn from(raw: u64) -> Self {
				Self(raw)
			}
		}
	};
}

define_id!(
	/// A wordform record: one orthographic word awaiting or holding analyses.
	WordformId,
	"wordform"
);
define_id!(
	/// A morph form (allomorph) record.
	FormId,
	"form"
);
define_id!(
	/// A morpho-syntactic analysis record.
	MsaId,
	"msa"
);
define_id!(
	/// An inflection type (irregularly inflected form variant) record.
	InflTypeId,
	"infl_type"
);
define_id!(
	/// An analysis owned by a wordform.
	AnalysisId,
	"analysis"
);
define_id!(
	/// A diagnostic record the parser attached to a wordform.
	ProblemId,
	"problem"
);
