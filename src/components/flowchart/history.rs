//! Undo history: an oldest-first stack of graph snapshots.

use std::collections::VecDeque;

use log::debug;

use super::types::GraphSnapshot;

/// History sizing. `limit: None` keeps every snapshot for the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HistoryConfig {
	/// Maximum number of snapshots kept.
	pub limit: Option<usize>,
}

/// Snapshots in push order; the last one is the undo target.
#[derive(Clone, Debug, Default)]
pub struct HistoryStack {
	entries: VecDeque<GraphSnapshot>,
	config: HistoryConfig,
}

impl HistoryStack {
	/// Empty stack sized by `config`.
	pub fn new(config: HistoryConfig) -> Self {
		Self {
			entries: VecDeque::new(),
			config,
		}
	}

	/// Append a snapshot. When a limit is set and the stack is full, the
	/// oldest entry is dropped first.
	pub fn push(&mut self, snapshot: GraphSnapshot) {
		if let Some(limit) = self.config.limit {
			if limit == 0 {
				return;
			}
			while self.entries.len() >= limit {
				self.entries.pop_front();
				debug!("history full ({}), dropped oldest snapshot", limit);
			}
		}
		self.entries.push_back(snapshot);
	}

	/// Remove and return the most recent snapshot. Empty stacks stay empty.
	pub fn pop(&mut self) -> Option<GraphSnapshot> {
		self.entries.pop_back()
	}

	/// Number of undo steps available.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// True when undo has nothing to restore.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
