use serde::{Deserialize, Serialize};

/// Who holds an opinion about an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Agent {
	/// The automated parser.
	Parser,
	/// A human user.
	User,
}

/// Approval flag one agent attaches to one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opinion {
	Approves,
	Disapproves,
	#[default]
	NoOpinion,
}

impl Opinion {
	#[inline]
	pub const fn is_some(self) -> bool {
		!matches!(self, Self::NoOpinion)
	}
}
