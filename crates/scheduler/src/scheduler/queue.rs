use std::collections::VecDeque;

use lexa_primitives::Priority;

use crate::item::WorkItem;
use crate::ledger::WorkTicket;

/// A queued item with the ticket that accounts for it.
pub(crate) struct Job {
	pub item: WorkItem,
	pub ticket: WorkTicket,
}

impl Job {
	pub fn priority(&self) -> Priority {
		self.ticket.priority()
	}

	/// Updates wait while exclusive mode is active; everything else runs.
	fn is_eligible(&self, exclusive: bool) -> bool {
		!(exclusive && matches!(self.item, WorkItem::UpdateWordform { .. }))
	}
}

/// One FIFO lane per priority.
#[derive(Default)]
pub(crate) struct PriorityQueues {
	lanes: [VecDeque<Job>; Priority::COUNT],
}

impl PriorityQueues {
	pub fn push(&mut self, job: Job) {
		self.lanes[job.priority().index()].push_back(job);
	}

	/// Pops the oldest runnable job of the most urgent lane that has one.
	///
	/// Held-back updates are passed over, never reordered among themselves,
	/// so a reload or try-a-word queued behind one still runs.
	pub fn pop_eligible(&mut self, exclusive: bool) -> Option<Job> {
		self.lanes.iter_mut().find_map(|lane| {
			let position = lane.iter().position(|job| job.is_eligible(exclusive))?;
			lane.remove(position)
		})
	}

	pub fn len(&self) -> usize {
		self.lanes.iter().map(VecDeque::len).sum()
	}

	pub fn lane_len(&self, priority: Priority) -> usize {
		self.lanes[priority.index()].len()
	}
}
