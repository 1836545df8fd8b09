use super::types::{Connection, Edge, EdgeChange, Node, NodeChange, NodeKind, Position};

pub const NODE_WIDTH: f64 = 150.0;
pub const NODE_HEIGHT: f64 = 40.0;
pub const HANDLE_RADIUS: f64 = 4.0;
pub const HANDLE_HIT_RADIUS: f64 = 8.0;
pub const EDGE_HIT_DISTANCE: f64 = 6.0;
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
const FIT_PADDING: f64 = 40.0;
const FIT_MAX_ZOOM: f64 = 2.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node_id: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Position,
	pub current: Position,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// In-progress connection gesture, cursor kept in graph space.
#[derive(Clone, Debug, Default)]
pub struct ConnectState {
	pub source: Option<String>,
	pub cursor: Position,
}

/// What lies under a screen point, topmost first.
#[derive(Clone, Debug, PartialEq)]
pub enum Hit {
	SourceHandle(String),
	Node(String),
	Edge(String),
	Background,
}

pub fn source_handle(position: Position) -> (f64, f64) {
	(position.x + NODE_WIDTH / 2.0, position.y + NODE_HEIGHT)
}

pub fn target_handle(position: Position) -> (f64, f64) {
	(position.x + NODE_WIDTH / 2.0, position.y)
}

fn segment_distance(px: f64, py: f64, (x1, y1): (f64, f64), (x2, y2): (f64, f64)) -> f64 {
	let (dx, dy) = (x2 - x1, y2 - y1);
	let len2 = dx * dx + dy * dy;
	let t = if len2 < 1e-9 {
		0.0
	} else {
		(((px - x1) * dx + (py - y1) * dy) / len2).clamp(0.0, 1.0)
	};
	let (cx, cy) = (x1 + t * dx, y1 + t * dy);
	((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Viewport and gesture state for the flowchart canvas. Graph data lives
/// in the store; this only tracks how it is being looked at and dragged.
pub struct CanvasState {
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub connect: ConnectState,
	pub hover: Option<String>,
	pub width: f64,
	pub height: f64,
}

impl CanvasState {
	pub fn new(nodes: &[Node], width: f64, height: f64) -> Self {
		let mut state = Self {
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			connect: ConnectState::default(),
			hover: None,
			width,
			height,
		};
		state.fit_view(nodes);
		state
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Where a node is drawn, taking an active drag into account.
	pub fn display_position(&self, node: &Node) -> Position {
		match &self.drag.node_id {
			Some(id) if *id == node.id => self.drag.current,
			_ => node.position,
		}
	}

	fn position_of(&self, nodes: &[Node], id: &str) -> Option<Position> {
		nodes
			.iter()
			.find(|n| n.id == id)
			.map(|n| self.display_position(n))
	}

	pub fn node_at_position(&self, nodes: &[Node], sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		// Later nodes are drawn on top
		nodes
			.iter()
			.rev()
			.find(|n| {
				let p = self.display_position(n);
				gx >= p.x && gx <= p.x + NODE_WIDTH && gy >= p.y && gy <= p.y + NODE_HEIGHT
			})
			.map(|n| n.id.clone())
	}

	pub fn hit_test(&self, nodes: &[Node], edges: &[Edge], sx: f64, sy: f64) -> Hit {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let handle_hit = HANDLE_HIT_RADIUS / self.transform.k.min(1.0);
		for node in nodes.iter().rev() {
			let (hx, hy) = source_handle(self.display_position(node));
			if ((gx - hx).powi(2) + (gy - hy).powi(2)).sqrt() <= handle_hit {
				return Hit::SourceHandle(node.id.clone());
			}
		}

		if let Some(id) = self.node_at_position(nodes, sx, sy) {
			return Hit::Node(id);
		}

		let tolerance = EDGE_HIT_DISTANCE / self.transform.k;
		for edge in edges.iter().rev() {
			let (Some(src), Some(tgt)) = (
				self.position_of(nodes, &edge.source),
				self.position_of(nodes, &edge.target),
			) else {
				continue;
			};
			if segment_distance(gx, gy, source_handle(src), target_handle(tgt)) <= tolerance {
				return Hit::Edge(edge.id.clone());
			}
		}
		Hit::Background
	}

	pub fn set_hover(&mut self, node: Option<String>) {
		if self.hover != node {
			self.hover = node;
		}
	}

	pub fn is_hovered(&self, id: &str) -> bool {
		self.hover.as_deref() == Some(id)
	}

	pub fn begin_drag(&mut self, node: &Node, sx: f64, sy: f64) {
		self.drag = DragState {
			node_id: Some(node.id.clone()),
			start_x: sx,
			start_y: sy,
			node_start: node.position,
			current: node.position,
		};
	}

	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		if self.drag.node_id.is_none() {
			return;
		}
		let (dx, dy) = (
			(sx - self.drag.start_x) / self.transform.k,
			(sy - self.drag.start_y) / self.transform.k,
		);
		self.drag.current = Position::new(self.drag.node_start.x + dx, self.drag.node_start.y + dy);
	}

	/// Finish a node drag; yields a position change only if the node moved.
	pub fn end_drag(&mut self) -> Option<NodeChange> {
		let drag = std::mem::take(&mut self.drag);
		let id = drag.node_id?;
		(drag.current != drag.node_start).then_some(NodeChange::Position {
			id,
			position: drag.current,
		})
	}

	pub fn is_dragging(&self) -> bool {
		self.drag.node_id.is_some()
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	pub fn begin_connect(&mut self, source: &str, sx: f64, sy: f64) {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.connect = ConnectState {
			source: Some(source.to_string()),
			cursor: Position::new(gx, gy),
		};
	}

	pub fn connect_to(&mut self, sx: f64, sy: f64) {
		if self.connect.source.is_some() {
			let (gx, gy) = self.screen_to_graph(sx, sy);
			self.connect.cursor = Position::new(gx, gy);
		}
	}

	/// Finish a connection gesture over whatever node is under the cursor.
	/// Start nodes have no incoming handle and a node cannot be dropped
	/// onto itself.
	pub fn end_connect(&mut self, nodes: &[Node], sx: f64, sy: f64) -> Option<Connection> {
		let source = std::mem::take(&mut self.connect).source?;
		let target = self.node_at_position(nodes, sx, sy)?;
		let target_node = nodes.iter().find(|n| n.id == target)?;
		if target == source || target_node.kind == NodeKind::Input {
			return None;
		}
		Some(Connection::new(source, target))
	}

	pub fn is_connecting(&self) -> bool {
		self.connect.source.is_some()
	}

	pub fn cancel_gestures(&mut self) {
		self.drag = DragState::default();
		self.pan.active = false;
		self.connect = ConnectState::default();
		self.hover = None;
	}

	/// Zoom by `factor` keeping the screen point under the cursor fixed.
	pub fn zoom_at(&mut self, factor: f64, sx: f64, sy: f64) {
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn zoom_center(&mut self, factor: f64) {
		self.zoom_at(factor, self.width / 2.0, self.height / 2.0);
	}

	/// Center the nodes' bounding box in the viewport.
	pub fn fit_view(&mut self, nodes: &[Node]) {
		if nodes.is_empty() {
			self.transform = ViewTransform {
				x: self.width / 2.0,
				y: self.height / 2.0,
				k: 1.0,
			};
			return;
		}
		let (mut min_x, mut min_y, mut max_x, mut max_y) =
			(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
		for node in nodes {
			min_x = min_x.min(node.position.x);
			min_y = min_y.min(node.position.y);
			max_x = max_x.max(node.position.x + NODE_WIDTH);
			max_y = max_y.max(node.position.y + NODE_HEIGHT);
		}
		let (bw, bh) = (max_x - min_x, max_y - min_y);
		let (aw, ah) = (
			(self.width - 2.0 * FIT_PADDING).max(1.0),
			(self.height - 2.0 * FIT_PADDING).max(1.0),
		);
		let k = (aw / bw).min(ah / bh).clamp(MIN_ZOOM, FIT_MAX_ZOOM);
		self.transform = ViewTransform {
			x: self.width / 2.0 - (min_x + bw / 2.0) * k,
			y: self.height / 2.0 - (min_y + bh / 2.0) * k,
			k,
		};
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

/// Selection changes making `hit` the only selected element. Only entries
/// whose flag actually flips are produced.
pub fn select_only(nodes: &[Node], edges: &[Edge], hit: &Hit) -> (Vec<NodeChange>, Vec<EdgeChange>) {
	let (node_id, edge_id) = match hit {
		Hit::Node(id) | Hit::SourceHandle(id) => (Some(id.as_str()), None),
		Hit::Edge(id) => (None, Some(id.as_str())),
		Hit::Background => (None, None),
	};
	let node_changes = nodes
		.iter()
		.filter_map(|n| {
			let selected = node_id == Some(n.id.as_str());
			(n.selected != selected).then(|| NodeChange::Select {
				id: n.id.clone(),
				selected,
			})
		})
		.collect();
	let edge_changes = edges
		.iter()
		.filter_map(|e| {
			let selected = edge_id == Some(e.id.as_str());
			(e.selected != selected).then(|| EdgeChange::Select {
				id: e.id.clone(),
				selected,
			})
		})
		.collect();
	(node_changes, edge_changes)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn chart() -> (Vec<Node>, Vec<Edge>) {
		let nodes = vec![
			Node::new("1", "Start", Position::new(0.0, 0.0)).with_kind(NodeKind::Input),
			Node::new("2", "Node 2", Position::new(0.0, 100.0)),
		];
		(nodes, vec![Edge::new("1", "2")])
	}

	fn identity_state(nodes: &[Node]) -> CanvasState {
		let mut state = CanvasState::new(nodes, 800.0, 600.0);
		state.transform = ViewTransform::default();
		state
	}

	#[test]
	fn fit_view_centers_bounding_box() {
		let (nodes, _) = chart();
		let state = CanvasState::new(&nodes, 800.0, 600.0);
		let k = state.transform.k;
		// Box is 150 x 140 graph units, centered at (75, 70)
		assert!((state.transform.x + 75.0 * k - 400.0).abs() < 1e-9);
		assert!((state.transform.y + 70.0 * k - 300.0).abs() < 1e-9);
		assert!(k <= FIT_MAX_ZOOM);
	}

	#[test]
	fn screen_to_graph_inverts_transform() {
		let (nodes, _) = chart();
		let mut state = identity_state(&nodes);
		state.transform = ViewTransform {
			x: 100.0,
			y: 50.0,
			k: 2.0,
		};
		assert_eq!(state.screen_to_graph(300.0, 250.0), (100.0, 100.0));
	}

	#[test]
	fn hit_test_prefers_handles_then_nodes_then_edges() {
		let (nodes, edges) = chart();
		let state = identity_state(&nodes);

		assert_eq!(state.hit_test(&nodes, &edges, 75.0, 40.0), Hit::SourceHandle("1".into()));
		assert_eq!(state.hit_test(&nodes, &edges, 10.0, 10.0), Hit::Node("1".into()));
		assert_eq!(state.hit_test(&nodes, &edges, 76.0, 70.0), Hit::Edge("e1-2".into()));
		assert_eq!(state.hit_test(&nodes, &edges, 500.0, 500.0), Hit::Background);
	}

	#[test]
	fn drag_yields_position_change_on_release() {
		let (nodes, _) = chart();
		let mut state = identity_state(&nodes);
		state.transform.k = 2.0;

		state.begin_drag(&nodes[1], 10.0, 10.0);
		state.drag_to(30.0, 50.0);
		assert_eq!(state.display_position(&nodes[1]), Position::new(10.0, 120.0));
		assert_eq!(
			state.end_drag(),
			Some(NodeChange::Position {
				id: "2".into(),
				position: Position::new(10.0, 120.0),
			})
		);
		assert!(!state.is_dragging());
	}

	#[test]
	fn click_without_movement_yields_no_change() {
		let (nodes, _) = chart();
		let mut state = identity_state(&nodes);
		state.begin_drag(&nodes[0], 10.0, 10.0);
		assert_eq!(state.end_drag(), None);
	}

	#[test]
	fn connection_gesture_targets_node_under_cursor() {
		let (nodes, _) = chart();
		let mut state = identity_state(&nodes);

		state.begin_connect("1", 75.0, 40.0);
		state.connect_to(70.0, 110.0);
		assert!(state.is_connecting());
		assert_eq!(state.connect.cursor, Position::new(70.0, 110.0));
		assert_eq!(state.end_connect(&nodes, 70.0, 110.0), Some(Connection::new("1", "2")));
		assert!(!state.is_connecting());
	}

	#[test]
	fn connection_rejects_self_start_and_empty_space() {
		let (nodes, _) = chart();
		let mut state = identity_state(&nodes);

		state.begin_connect("2", 75.0, 140.0);
		assert_eq!(state.end_connect(&nodes, 70.0, 110.0), None);

		state.begin_connect("2", 75.0, 140.0);
		assert_eq!(state.end_connect(&nodes, 10.0, 10.0), None);

		state.begin_connect("2", 75.0, 140.0);
		assert_eq!(state.end_connect(&nodes, 500.0, 500.0), None);
	}

	#[test]
	fn zoom_keeps_cursor_point_fixed() {
		let (nodes, _) = chart();
		let mut state = identity_state(&nodes);
		let before = state.screen_to_graph(200.0, 100.0);
		state.zoom_at(1.1, 200.0, 100.0);
		let after = state.screen_to_graph(200.0, 100.0);
		assert!((before.0 - after.0).abs() < 1e-9);
		assert!((before.1 - after.1).abs() < 1e-9);

		state.zoom_at(1000.0, 0.0, 0.0);
		assert_eq!(state.transform.k, MAX_ZOOM);
	}

	#[test]
	fn select_only_flips_just_what_differs() {
		let (mut nodes, edges) = chart();
		nodes[0].selected = true;

		let (node_changes, edge_changes) = select_only(&nodes, &edges, &Hit::Edge("e1-2".into()));
		assert_eq!(
			node_changes,
			vec![NodeChange::Select {
				id: "1".into(),
				selected: false,
			}]
		);
		assert_eq!(
			edge_changes,
			vec![EdgeChange::Select {
				id: "e1-2".into(),
				selected: true,
			}]
		);

		let (node_changes, edge_changes) = select_only(&nodes, &edges, &Hit::Node("1".into()));
		assert!(node_changes.is_empty());
		assert!(edge_changes.is_empty());
	}
}
