use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use slab::Slab;

use crate::snapshot::{TaskPhase, TaskSnapshot};

/// Callback registered on a root node; receives every phase transition and
/// notification raised in the root's subtree.
pub type ProgressSink = Arc<dyn Fn(&TaskSnapshot) + Send + Sync>;

struct Node {
	description: String,
	phase: TaskPhase,
	started_at: Instant,
	finished_at: Option<Instant>,
	notification: Option<String>,
	details: Option<String>,
	parent: Option<usize>,
	children: Vec<usize>,
	closed: bool,
}

impl Node {
	fn new(description: String, parent: Option<usize>) -> Self {
		Self {
			description,
			phase: TaskPhase::Started,
			started_at: Instant::now(),
			finished_at: None,
			notification: None,
			details: None,
			parent,
			children: Vec::new(),
			closed: false,
		}
	}
}

/// Arena holding every node of one root's tree.
struct Tree {
	nodes: Slab<Node>,
	sink: Option<ProgressSink>,
}

impl Tree {
	fn depth(&self, mut key: usize) -> usize {
		let mut depth = 0;
		while let Some(parent) = self.nodes[key].parent {
			depth += 1;
			key = parent;
		}
		depth
	}

	fn root_of(&self, mut key: usize) -> usize {
		while let Some(parent) = self.nodes[key].parent {
			key = parent;
		}
		key
	}

	fn snapshot(&self, key: usize) -> TaskSnapshot {
		self.snapshot_at(key, self.depth(key))
	}

	fn snapshot_at(&self, key: usize, depth: usize) -> TaskSnapshot {
		let node = &self.nodes[key];
		TaskSnapshot {
			description: node.description.clone(),
			phase: node.phase,
			started_at: node.started_at,
			finished_at: node.finished_at,
			notification: node.notification.clone(),
			details: node.details.clone(),
			depth,
			children: node.children.iter().map(|&child| self.snapshot_at(child, depth + 1)).collect(),
		}
	}

	/// Closes `key` and every still-open descendant, recording each node that
	/// actually changed so it is announced exactly once.
	fn close_subtree(&mut self, key: usize, now: Instant, changed: &mut Vec<usize>) {
		if self.nodes[key].closed {
			return;
		}
		self.nodes[key].closed = true;

		let children = self.nodes[key].children.clone();
		for child in children {
			self.close_subtree(child, now, changed);
		}

		let node = &mut self.nodes[key];
		if node.phase != TaskPhase::ErrorEncountered {
			node.phase = TaskPhase::Finished;
		}
		node.finished_at = Some(now);
		tracing::trace!(
			task = %node.description,
			phase = node.phase.as_str(),
			elapsed_ms = now.saturating_duration_since(node.started_at).as_millis() as u64,
			"progress.close"
		);
		changed.push(key);
	}
}

/// Handle to one node of a progress tree.
///
/// A node created with [`TaskReport::root`] owns the tree's sink; nodes
/// created with [`TaskReport::child`] route their notifications to that root.
/// Dropping a handle closes its node.
pub struct TaskReport {
	tree: Arc<Mutex<Tree>>,
	key: usize,
}

impl TaskReport {
	/// Opens a root node, announcing it to `sink` if one is given.
	pub fn root(description: impl Into<String>, sink: Option<ProgressSink>) -> Self {
		let mut nodes = Slab::new();
		let key = nodes.insert(Node::new(description.into(), None));
		let report = Self {
			tree: Arc::new(Mutex::new(Tree { nodes, sink })),
			key,
		};
		report.announce(&[key]);
		report
	}

	/// Opens a child node under this one.
	pub fn child(&self, description: impl Into<String>) -> TaskReport {
		let key = {
			let mut tree = self.tree.lock();
			let key = tree.nodes.insert(Node::new(description.into(), Some(self.key)));
			tree.nodes[self.key].children.push(key);
			key
		};
		let child = TaskReport {
			tree: Arc::clone(&self.tree),
			key,
		};
		child.announce(&[key]);
		child
	}

	/// Moves an open node from `Started` to `Working`.
	pub fn set_working(&self) {
		let changed = {
			let mut tree = self.tree.lock();
			let node = &mut tree.nodes[self.key];
			if node.closed || node.phase != TaskPhase::Started {
				false
			} else {
				node.phase = TaskPhase::Working;
				true
			}
		};
		if changed {
			self.announce(&[self.key]);
		}
	}

	/// Attaches a non-fatal, user-facing note and notifies without closing.
	pub fn set_notification(&self, message: impl Into<String>) {
		self.tree.lock().nodes[self.key].notification = Some(message.into());
		self.announce(&[self.key]);
	}

	/// Records a failure; the node keeps the `ErrorEncountered` phase when closed.
	pub fn record_error(&self, message: impl Into<String>) {
		{
			let mut tree = self.tree.lock();
			let node = &mut tree.nodes[self.key];
			node.phase = TaskPhase::ErrorEncountered;
			node.notification = Some(message.into());
		}
		self.announce(&[self.key]);
	}

	/// Stores a detail payload (trace document, result rendering) on this node.
	pub fn set_details(&self, details: impl Into<String>) {
		self.tree.lock().nodes[self.key].details = Some(details.into());
	}

	/// Closes this node and any still-open descendants. Idempotent.
	pub fn close(&self) {
		let changed = {
			let mut tree = self.tree.lock();
			let mut changed = Vec::new();
			tree.close_subtree(self.key, Instant::now(), &mut changed);
			changed
		};
		if !changed.is_empty() {
			self.announce(&changed);
		}
	}

	pub fn is_closed(&self) -> bool {
		self.tree.lock().nodes[self.key].closed
	}

	pub fn phase(&self) -> TaskPhase {
		self.tree.lock().nodes[self.key].phase
	}

	/// Snapshot of this node and its subtree.
	pub fn snapshot(&self) -> TaskSnapshot {
		self.tree.lock().snapshot(self.key)
	}

	/// Snapshot of the whole tree this node belongs to.
	pub fn root_snapshot(&self) -> TaskSnapshot {
		let tree = self.tree.lock();
		let root = tree.root_of(self.key);
		tree.snapshot_at(root, 0)
	}

	/// Walks to the deepest, most recently opened node that is still open,
	/// falling back to this node.
	pub fn most_recent_open_descendant(&self) -> TaskSnapshot {
		let tree = self.tree.lock();
		let mut key = self.key;
		while let Some(&next) = tree.nodes[key].children.iter().rev().find(|&&child| !tree.nodes[child].closed) {
			key = next;
		}
		tree.snapshot(key)
	}

	/// Delivers snapshots of `keys` to the root's sink, outside the lock.
	fn announce(&self, keys: &[usize]) {
		let (sink, snapshots) = {
			let tree = self.tree.lock();
			let Some(sink) = tree.sink.clone() else {
				return;
			};
			let snapshots: Vec<_> = keys.iter().map(|&key| tree.snapshot(key)).collect();
			(sink, snapshots)
		};
		for snapshot in &snapshots {
			sink(snapshot);
		}
	}
}

impl Drop for TaskReport {
	fn drop(&mut self) {
		self.close();
	}
}

impl std::fmt::Debug for TaskReport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let tree = self.tree.lock();
		let node = &tree.nodes[self.key];
		f.debug_struct("TaskReport")
			.field("description", &node.description)
			.field("phase", &node.phase)
			.field("closed", &node.closed)
			.finish()
	}
}
