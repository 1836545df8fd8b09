//! Graph state store: the node/edge collections, the id counter and the
//! undo history. Every operation that changes the graph records the
//! pre-mutation snapshot first.

use log::{debug, warn};

use super::history::{HistoryConfig, HistoryStack};
use super::types::{
	Connection, Edge, EdgeChange, GraphSnapshot, Node, NodeChange, NodeKind, Position,
};

/// Id of the node every new store starts with.
pub const START_NODE_ID: &str = "1";
/// Label of the start node.
pub const START_LABEL: &str = "Start";
/// Column new nodes are placed in.
pub const NEW_NODE_X: f64 = 250.0;
/// Vertical distance between consecutively added nodes.
pub const NEW_NODE_SPACING: f64 = 100.0;

fn start_node() -> Node {
	Node::new(START_NODE_ID, START_LABEL, Position::new(NEW_NODE_X, 0.0)).with_kind(NodeKind::Input)
}

/// Current flowchart plus everything needed to undo changes to it.
#[derive(Clone, Debug)]
pub struct GraphStore {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	history: HistoryStack,
	next_id: u64,
}

impl Default for GraphStore {
	fn default() -> Self {
		Self::new()
	}
}

impl GraphStore {
	/// One start node, no edges, unbounded history.
	pub fn new() -> Self {
		Self::with_config(HistoryConfig::default())
	}

	/// Like [`GraphStore::new`] with a custom history size.
	pub fn with_config(config: HistoryConfig) -> Self {
		Self::from_parts(vec![start_node()], Vec::new(), config)
	}

	/// Build a store around existing collections. The id counter starts
	/// after the highest numeric node id present.
	pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>, config: HistoryConfig) -> Self {
		let next_id = nodes
			.iter()
			.filter_map(|n| n.id.parse::<u64>().ok())
			.max()
			.unwrap_or(0)
			+ 1;
		Self {
			nodes,
			edges,
			history: HistoryStack::new(config),
			next_id,
		}
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Edges in insertion order.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Look a node up by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Whether [`GraphStore::undo`] would change anything.
	pub fn can_undo(&self) -> bool {
		!self.history.is_empty()
	}

	/// Number of recorded undo steps.
	pub fn history_len(&self) -> usize {
		self.history.len()
	}

	/// Copy of the current collections.
	pub fn snapshot(&self) -> GraphSnapshot {
		GraphSnapshot::new(self.nodes.clone(), self.edges.clone())
	}

	/// Replace both collections wholesale. Does not touch the history.
	pub fn replace(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
		self.nodes = nodes;
		self.edges = edges;
	}

	fn record(&mut self) {
		let snapshot = self.snapshot();
		self.history.push(snapshot);
	}

	/// Append a fresh node below the existing ones and return its id.
	pub fn add_node(&mut self) -> String {
		let id = self.next_id.to_string();
		self.next_id += 1;
		let position = Position::new(NEW_NODE_X, self.nodes.len() as f64 * NEW_NODE_SPACING);
		let node = Node::new(id.clone(), format!("Node {}", id), position);

		self.record();
		self.nodes.push(node);
		debug!("added node {} at ({}, {})", id, position.x, position.y);
		id
	}

	/// Append an edge for the connection. Returns `None` without recording
	/// history when the same source/target edge already exists.
	pub fn connect(&mut self, connection: Connection) -> Option<String> {
		let Connection { source, target } = connection;
		if self
			.edges
			.iter()
			.any(|e| e.source == source && e.target == target)
		{
			debug!("edge {} -> {} already exists", source, target);
			return None;
		}
		for end in [&source, &target] {
			if self.node(end).is_none() {
				warn!("connecting unknown node {}", end);
			}
		}

		let edge = Edge::new(source, target);
		let id = edge.id.clone();
		self.record();
		self.edges.push(edge);
		debug!("connected {}", id);
		Some(id)
	}

	/// Merge canvas node changes by id. Records one snapshot for the batch
	/// unless it only changed selection.
	pub fn apply_node_changes(&mut self, changes: impl IntoIterator<Item = NodeChange>) {
		let before = self.snapshot();
		let mut structural = false;

		for change in changes {
			match change {
				NodeChange::Position { id, position } => {
					match self.nodes.iter_mut().find(|n| n.id == id) {
						Some(node) if node.position != position => {
							node.position = position;
							structural = true;
						}
						Some(_) => {}
						None => debug!("position change for unknown node {}", id),
					}
				}
				NodeChange::Select { id, selected } => {
					match self.nodes.iter_mut().find(|n| n.id == id) {
						Some(node) => node.selected = selected,
						None => debug!("selection change for unknown node {}", id),
					}
				}
				NodeChange::Add(node) => {
					// Keep add_node from handing out an id that now exists
					if let Ok(n) = node.id.parse::<u64>() {
						self.next_id = self.next_id.max(n + 1);
					}
					match self.nodes.iter().position(|n| n.id == node.id) {
						Some(idx) => self.nodes[idx] = node,
						None => self.nodes.push(node),
					}
					structural = true;
				}
				NodeChange::Remove { id } => {
					let len = self.nodes.len();
					self.nodes.retain(|n| n.id != id);
					structural |= self.nodes.len() != len;
				}
			}
		}

		if structural {
			self.history.push(before);
		}
	}

	/// Merge canvas edge changes by id, with the same history rule as
	/// [`GraphStore::apply_node_changes`].
	pub fn apply_edge_changes(&mut self, changes: impl IntoIterator<Item = EdgeChange>) {
		let before = self.snapshot();
		let mut structural = false;

		for change in changes {
			match change {
				EdgeChange::Select { id, selected } => {
					match self.edges.iter_mut().find(|e| e.id == id) {
						Some(edge) => edge.selected = selected,
						None => debug!("selection change for unknown edge {}", id),
					}
				}
				EdgeChange::Add(edge) => {
					match self.edges.iter().position(|e| e.id == edge.id) {
						Some(idx) => self.edges[idx] = edge,
						None => self.edges.push(edge),
					}
					structural = true;
				}
				EdgeChange::Remove { id } => {
					let len = self.edges.len();
					self.edges.retain(|e| e.id != id);
					structural |= self.edges.len() != len;
				}
			}
		}

		if structural {
			self.history.push(before);
		}
	}

	/// Delete selected nodes, selected edges and every edge touching a
	/// deleted node as a single undo step.
	pub fn remove_selected(&mut self) -> bool {
		let removed: Vec<String> = self
			.nodes
			.iter()
			.filter(|n| n.selected)
			.map(|n| n.id.clone())
			.collect();
		let touches_removed =
			|e: &Edge| e.selected || removed.contains(&e.source) || removed.contains(&e.target);
		if removed.is_empty() && !self.edges.iter().any(touches_removed) {
			return false;
		}

		self.record();
		self.nodes.retain(|n| !n.selected);
		self.edges.retain(|e| !touches_removed(e));
		debug!("removed nodes {:?}", removed);
		true
	}

	/// Restore the most recent snapshot. Returns `false` when there is
	/// nothing to undo.
	pub fn undo(&mut self) -> bool {
		let Some(snapshot) = self.history.pop() else {
			return false;
		};
		let (nodes, edges) = snapshot.into_parts();
		self.replace(nodes, edges);
		debug!("undo, {} snapshots left", self.history.len());
		true
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use pretty_assertions::assert_eq;

	use super::*;

	fn labels(store: &GraphStore) -> Vec<&str> {
		store.nodes().iter().map(|n| n.label.as_str()).collect()
	}

	fn endpoints(store: &GraphStore) -> Vec<(&str, &str)> {
		store
			.edges()
			.iter()
			.map(|e| (e.source.as_str(), e.target.as_str()))
			.collect()
	}

	#[test]
	fn starts_with_a_single_start_node() {
		let store = GraphStore::new();
		assert_eq!(labels(&store), vec!["Start"]);
		assert_eq!(store.nodes()[0].kind, NodeKind::Input);
		assert_eq!(store.nodes()[0].position, Position::new(250.0, 0.0));
		assert!(store.edges().is_empty());
		assert!(!store.can_undo());
	}

	#[test]
	fn add_node_grows_collection_with_unique_ids() {
		let mut store = GraphStore::new();
		for _ in 0..25 {
			store.add_node();
		}
		assert_eq!(store.nodes().len(), 26);
		let ids: HashSet<&str> = store.nodes().iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids.len(), 26);
	}

	#[test]
	fn add_node_places_nodes_by_count() {
		let mut store = GraphStore::new();
		let id = store.add_node();
		let node = store.node(&id).unwrap();
		assert_eq!(node.label, "Node 2");
		assert_eq!(node.position, Position::new(250.0, 100.0));
		assert_eq!(node.kind, NodeKind::Default);
	}

	#[test]
	fn undo_restores_state_before_each_mutation() {
		let mut store = GraphStore::new();
		store.add_node();
		let before_connect = store.snapshot();
		store.connect(Connection::new("1", "2"));
		let before_add = store.snapshot();
		store.add_node();

		assert!(store.undo());
		assert_eq!(store.snapshot(), before_add);
		assert!(store.undo());
		assert_eq!(store.snapshot(), before_connect);
	}

	#[test]
	fn undo_with_empty_history_changes_nothing() {
		let mut store = GraphStore::new();
		let before = store.snapshot();
		assert!(!store.undo());
		assert_eq!(store.snapshot(), before);
	}

	#[test]
	fn undoing_every_mutation_returns_to_initial_state() {
		let mut store = GraphStore::new();
		let initial = store.snapshot();
		store.add_node();
		store.add_node();
		store.connect(Connection::new("1", "2"));
		store.connect(Connection::new("2", "3"));

		for _ in 0..4 {
			assert!(store.undo());
		}
		assert_eq!(store.snapshot(), initial);
		assert!(!store.undo());
		assert_eq!(store.snapshot(), initial);
	}

	#[test]
	fn undo_after_connect_removes_only_that_edge() {
		let mut store = GraphStore::new();
		store.add_node();
		store.add_node();
		store.connect(Connection::new("1", "2"));
		let nodes = store.nodes().to_vec();

		store.connect(Connection::new("2", "3"));
		store.undo();

		assert_eq!(endpoints(&store), vec![("1", "2")]);
		assert_eq!(store.nodes(), nodes.as_slice());
	}

	#[test]
	fn add_undo_connect_undo_scenario() {
		let mut store = GraphStore::new();
		store.add_node();
		store.add_node();
		assert_eq!(labels(&store), vec!["Start", "Node 2", "Node 3"]);

		store.undo();
		assert_eq!(labels(&store), vec!["Start", "Node 2"]);

		store.connect(Connection::new("1", "2"));
		assert_eq!(endpoints(&store), vec![("1", "2")]);

		store.undo();
		assert!(store.edges().is_empty());
	}

	#[test]
	fn id_counter_does_not_rewind_on_undo() {
		let mut store = GraphStore::new();
		assert_eq!(store.add_node(), "2");
		store.undo();
		assert_eq!(store.add_node(), "3");
		assert_eq!(labels(&store), vec!["Start", "Node 3"]);
	}

	#[test]
	fn ids_stay_unique_after_removal() {
		let mut store = GraphStore::new();
		let second = store.add_node();
		store.add_node();
		store.apply_node_changes([NodeChange::Remove { id: second }]);
		let id = store.add_node();
		assert_eq!(id, "4");
		let ids: HashSet<&str> = store.nodes().iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids.len(), store.nodes().len());
	}

	#[test]
	fn counter_starts_after_highest_numeric_id() {
		let nodes = vec![
			Node::new("7", "Seven", Position::default()),
			Node::new("decision", "Decision", Position::default()),
		];
		let mut store = GraphStore::from_parts(nodes, Vec::new(), HistoryConfig::default());
		assert_eq!(store.add_node(), "8");
	}

	#[test]
	fn duplicate_connection_is_ignored() {
		let mut store = GraphStore::new();
		store.add_node();
		assert_eq!(store.connect(Connection::new("1", "2")).as_deref(), Some("e1-2"));
		let history = store.history_len();

		assert_eq!(store.connect(Connection::new("1", "2")), None);
		assert_eq!(store.edges().len(), 1);
		assert_eq!(store.history_len(), history);
	}

	#[test]
	fn dangling_connection_is_accepted() {
		let mut store = GraphStore::new();
		let id = store.connect(Connection::new("1", "42"));
		assert_eq!(id.as_deref(), Some("e1-42"));
		assert_eq!(endpoints(&store), vec![("1", "42")]);
	}

	#[test]
	fn position_changes_merge_by_id_and_are_undoable() {
		let mut store = GraphStore::new();
		store.apply_node_changes([NodeChange::Position {
			id: "1".into(),
			position: Position::new(10.0, 20.0),
		}]);
		assert_eq!(store.nodes()[0].position, Position::new(10.0, 20.0));
		assert_eq!(store.history_len(), 1);

		store.undo();
		assert_eq!(store.nodes()[0].position, Position::new(250.0, 0.0));
	}

	#[test]
	fn selection_changes_do_not_record_history() {
		let mut store = GraphStore::new();
		store.apply_node_changes([NodeChange::Select {
			id: "1".into(),
			selected: true,
		}]);
		assert!(store.nodes()[0].selected);
		assert!(!store.can_undo());
	}

	#[test]
	fn changes_for_unknown_ids_are_ignored() {
		let mut store = GraphStore::new();
		let before = store.snapshot();
		store.apply_node_changes([
			NodeChange::Position {
				id: "9".into(),
				position: Position::new(1.0, 1.0),
			},
			NodeChange::Remove { id: "9".into() },
		]);
		store.apply_edge_changes([EdgeChange::Remove { id: "e1-9".into() }]);
		assert_eq!(store.snapshot(), before);
		assert!(!store.can_undo());
	}

	#[test]
	fn add_change_inserts_unseen_and_replaces_seen() {
		let mut store = GraphStore::new();
		store.apply_node_changes([
			NodeChange::Add(Node::new("1", "Begin", Position::new(0.0, 0.0))),
			NodeChange::Add(Node::new("x", "Extra", Position::new(5.0, 5.0))),
		]);
		assert_eq!(labels(&store), vec!["Begin", "Extra"]);
		assert_eq!(store.history_len(), 1);

		store.apply_edge_changes([EdgeChange::Add(Edge::new("1", "x"))]);
		store.apply_edge_changes([EdgeChange::Select {
			id: "e1-x".into(),
			selected: true,
		}]);
		assert!(store.edges()[0].selected);
		assert_eq!(store.history_len(), 2);
	}

	#[test]
	fn added_numeric_ids_are_not_handed_out_again() {
		let mut store = GraphStore::new();
		store.apply_node_changes([NodeChange::Add(Node::new(
			"2",
			"Pasted",
			Position::new(0.0, 300.0),
		))]);
		assert_eq!(store.add_node(), "3");

		store.apply_node_changes([NodeChange::Add(Node::new("10", "Far", Position::default()))]);
		assert_eq!(store.add_node(), "11");

		let ids: HashSet<&str> = store.nodes().iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids.len(), store.nodes().len());
	}

	#[test]
	fn lower_added_id_does_not_rewind_counter() {
		let mut store = GraphStore::new();
		store.add_node();
		store.add_node();
		store.apply_node_changes([NodeChange::Add(Node::new("1", "Begin", Position::default()))]);
		assert_eq!(store.add_node(), "4");
	}

	#[test]
	fn removing_an_edge_is_one_undoable_step() {
		let mut store = GraphStore::new();
		store.add_node();
		store.add_node();
		store.connect(Connection::new("1", "2"));
		store.connect(Connection::new("2", "3"));
		let before = store.snapshot();
		let mut fresh = GraphStore::from_parts(
			before.nodes().to_vec(),
			before.edges().to_vec(),
			HistoryConfig::default(),
		);

		fresh.apply_edge_changes([EdgeChange::Remove { id: "e1-2".into() }]);
		assert_eq!(endpoints(&fresh), vec![("2", "3")]);
		assert_eq!(fresh.history_len(), 1);

		assert!(fresh.undo());
		assert_eq!(fresh.snapshot(), before);
		assert!(!fresh.can_undo());
	}

	#[test]
	fn remove_selected_drops_attached_edges_in_one_step() {
		let mut store = GraphStore::new();
		store.add_node();
		store.add_node();
		store.connect(Connection::new("1", "2"));
		store.connect(Connection::new("2", "3"));
		store.connect(Connection::new("1", "3"));
		let before = store.snapshot();

		store.apply_node_changes([NodeChange::Select {
			id: "2".into(),
			selected: true,
		}]);
		assert!(store.remove_selected());
		assert_eq!(labels(&store), vec!["Start", "Node 3"]);
		assert_eq!(endpoints(&store), vec![("1", "3")]);

		store.undo();
		assert_eq!(labels(&store), vec!["Start", "Node 2", "Node 3"]);
		assert_eq!(store.edges(), before.edges());
	}

	#[test]
	fn remove_selected_without_selection_is_a_noop() {
		let mut store = GraphStore::new();
		store.add_node();
		let history = store.history_len();
		assert!(!store.remove_selected());
		assert_eq!(store.history_len(), history);
	}

	#[test]
	fn bounded_history_limits_undo_depth() {
		let mut store = GraphStore::with_config(HistoryConfig { limit: Some(2) });
		store.add_node();
		store.add_node();
		store.add_node();

		assert!(store.undo());
		assert!(store.undo());
		assert!(!store.undo());
		assert_eq!(labels(&store), vec!["Start", "Node 2"]);
	}
}
