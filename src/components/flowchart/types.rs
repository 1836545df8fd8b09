//! Plain data carried between the store, the history and the canvas.

/// Position of a node's top-left corner in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	/// Horizontal offset, growing right.
	pub x: f64,
	/// Vertical offset, growing down.
	pub y: f64,
}

impl Position {
	/// Position at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Distinguishes the start node from ordinary nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeKind {
	/// Start node: only has an outgoing handle.
	Input,
	/// Ordinary node with incoming and outgoing handles.
	#[default]
	Default,
}

/// A flowchart box.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Unique within the store's node collection.
	pub id: String,
	/// Text drawn inside the box.
	pub label: String,
	/// Top-left corner in graph space.
	pub position: Position,
	/// Start node or ordinary node.
	pub kind: NodeKind,
	/// Selection flag toggled by the canvas.
	pub selected: bool,
}

impl Node {
	/// An unselected ordinary node.
	pub fn new(id: impl Into<String>, label: impl Into<String>, position: Position) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			position,
			kind: NodeKind::Default,
			selected: false,
		}
	}

	/// Same node with a different kind.
	pub fn with_kind(mut self, kind: NodeKind) -> Self {
		self.kind = kind;
		self
	}
}

/// A directed edge between two node ids. The ids are not checked against
/// the node collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	/// See [`edge_id`].
	pub id: String,
	/// Id of the node the edge leaves.
	pub source: String,
	/// Id of the node the edge enters.
	pub target: String,
	/// Selection flag toggled by the canvas.
	pub selected: bool,
}

impl Edge {
	/// An unselected edge with a derived id.
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		let (source, target) = (source.into(), target.into());
		Self {
			id: edge_id(&source, &target),
			source,
			target,
			selected: false,
		}
	}
}

/// Derived edge identifier for a source/target pair.
pub fn edge_id(source: &str, target: &str) -> String {
	format!("e{}-{}", source, target)
}

/// A source/target pair proposed by the connection gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
	/// Node the gesture started from.
	pub source: String,
	/// Node the gesture was released over.
	pub target: String,
}

impl Connection {
	/// Connection from `source` to `target`.
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}
}

/// Node change emitted by the canvas, merged into the store by id.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum NodeChange {
	/// Node was dropped somewhere else.
	Position { id: String, position: Position },
	Select { id: String, selected: bool },
	/// Inserted when the id is unseen, replaces the node otherwise.
	Add(Node),
	Remove { id: String },
}

/// Edge change emitted by the canvas, merged into the store by id.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum EdgeChange {
	Select { id: String, selected: bool },
	Add(Edge),
	Remove { id: String },
}

/// Immutable capture of both collections, used as a history entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
}

impl GraphSnapshot {
	/// Freeze the given collections.
	pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
		Self { nodes, edges }
	}

	/// Nodes at capture time.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Edges at capture time.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Give up the snapshot, keeping its collections.
	pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
		(self.nodes, self.edges)
	}
}
