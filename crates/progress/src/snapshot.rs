use std::time::Instant;

/// Lifecycle phase of a [`crate::TaskReport`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskPhase {
	Started,
	Working,
	Finished,
	ErrorEncountered,
}

impl TaskPhase {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Started => "started",
			Self::Working => "working",
			Self::Finished => "finished",
			Self::ErrorEncountered => "error",
		}
	}
}

/// Immutable view of one node and its subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
	pub description: String,
	pub phase: TaskPhase,
	pub started_at: Instant,
	pub finished_at: Option<Instant>,
	pub notification: Option<String>,
	pub details: Option<String>,
	/// Distance from the root; the root is at depth 0.
	pub depth: usize,
	pub children: Vec<TaskSnapshot>,
}

impl TaskSnapshot {
	/// Returns true once the node was closed.
	pub fn is_closed(&self) -> bool {
		self.finished_at.is_some()
	}

	/// Finds the first node in this subtree with the given description.
	pub fn find(&self, description: &str) -> Option<&TaskSnapshot> {
		if self.description == description {
			return Some(self);
		}
		self.children.iter().find_map(|child| child.find(description))
	}
}
