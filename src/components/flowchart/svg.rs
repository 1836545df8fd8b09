//! Standalone SVG rendering of the flowchart, used by the SVG export.

use std::fmt::Write;

use super::state::{NODE_HEIGHT, NODE_WIDTH, source_handle, target_handle};
use super::types::{Edge, Node, NodeKind};

const MARGIN: f64 = 20.0;

fn escape(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&apos;"),
			_ => out.push(c),
		}
	}
	out
}

/// Render nodes and edges into an SVG document sized to their bounds.
/// Edges whose endpoints are missing are left out.
pub fn render_svg(nodes: &[Node], edges: &[Edge]) -> String {
	let (mut min_x, mut min_y, mut max_x, mut max_y) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
	for (i, node) in nodes.iter().enumerate() {
		let (x, y) = (node.position.x, node.position.y);
		if i == 0 {
			(min_x, min_y, max_x, max_y) = (x, y, x, y);
		}
		min_x = min_x.min(x);
		min_y = min_y.min(y);
		max_x = max_x.max(x + NODE_WIDTH);
		max_y = max_y.max(y + NODE_HEIGHT);
	}
	let (vx, vy) = (min_x - MARGIN, min_y - MARGIN);
	let (w, h) = (max_x - min_x + 2.0 * MARGIN, max_y - min_y + 2.0 * MARGIN);

	let mut svg = String::new();
	let _ = writeln!(
		svg,
		r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="{vx} {vy} {w} {h}">"#
	);
	svg.push_str(
		r##"<defs><marker id="arrow" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="8" markerHeight="8" orient="auto"><path d="M0,0 L10,5 L0,10 z" fill="#8a8f98"/></marker></defs>"##,
	);
	svg.push('\n');
	let _ = writeln!(
		svg,
		r##"<rect x="{vx}" y="{vy}" width="{w}" height="{h}" fill="#ffffff"/>"##
	);

	for edge in edges {
		let find = |id: &str| nodes.iter().find(|n| n.id == id);
		let (Some(src), Some(tgt)) = (find(&edge.source), find(&edge.target)) else {
			continue;
		};
		let ((x1, y1), (x2, y2)) = (source_handle(src.position), target_handle(tgt.position));
		let _ = writeln!(
			svg,
			r##"<line id="{}" x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="#8a8f98" stroke-width="1.5" marker-end="url(#arrow)"/>"##,
			escape(&edge.id)
		);
	}

	for node in nodes {
		let (x, y) = (node.position.x, node.position.y);
		let fill = match node.kind {
			NodeKind::Input => "#e8f0fe",
			NodeKind::Default => "#ffffff",
		};
		let _ = writeln!(
			svg,
			r##"<g id="node-{}"><rect x="{x}" y="{y}" width="{nw}" height="{nh}" rx="4" fill="{fill}" stroke="#1a192b"/><text x="{}" y="{}" font-family="sans-serif" font-size="12" text-anchor="middle" dominant-baseline="middle">{}</text></g>"##,
			escape(&node.id),
			x + NODE_WIDTH / 2.0,
			y + NODE_HEIGHT / 2.0,
			escape(&node.label),
			nw = NODE_WIDTH,
			nh = NODE_HEIGHT,
		);
	}

	svg.push_str("</svg>\n");
	svg
}
