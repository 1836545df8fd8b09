use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{
	CanvasState, HANDLE_RADIUS, NODE_HEIGHT, NODE_WIDTH, source_handle, target_handle,
};
use super::types::{Edge, Node, NodeKind, Position};

const BACKGROUND: &str = "#f8f9fb";
const DOT_COLOR: &str = "#c9ccd3";
const DOT_GAP: f64 = 20.0;
const EDGE_COLOR: &str = "#8a8f98";
const SELECTED_COLOR: &str = "#1a73e8";
const NODE_FILL: &str = "#ffffff";
const INPUT_FILL: &str = "#e8f0fe";
const NODE_BORDER: &str = "#1a192b";
const CORNER_RADIUS: f64 = 4.0;

pub fn render(state: &CanvasState, nodes: &[Node], edges: &[Edge], ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	draw_dots(state, ctx);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, nodes, edges, ctx);
	draw_pending_connection(state, nodes, ctx);
	draw_nodes(state, nodes, ctx);
	ctx.restore();
}

/// Dot grid in screen space, following pan and zoom.
fn draw_dots(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let gap = DOT_GAP * state.transform.k;
	if gap < 4.0 {
		return;
	}
	let (ox, oy) = (state.transform.x.rem_euclid(gap), state.transform.y.rem_euclid(gap));
	let size = (state.transform.k).clamp(0.5, 1.5);
	ctx.set_fill_style_str(DOT_COLOR);
	let mut x = ox;
	while x < state.width {
		let mut y = oy;
		while y < state.height {
			ctx.fill_rect(x - size / 2.0, y - size / 2.0, size, size);
			y += gap;
		}
		x += gap;
	}
}

fn arrow(ctx: &CanvasRenderingContext2d, from: (f64, f64), to: (f64, f64), size: f64) {
	let (dx, dy) = (to.0 - from.0, to.1 - from.1);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	ctx.begin_path();
	ctx.move_to(from.0, from.1);
	ctx.line_to(to.0 - ux * size, to.1 - uy * size);
	ctx.stroke();

	let (back_x, back_y) = (to.0 - ux * size, to.1 - uy * size);
	let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
	ctx.begin_path();
	ctx.move_to(to.0, to.1);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_edges(state: &CanvasState, nodes: &[Node], edges: &[Edge], ctx: &CanvasRenderingContext2d) {
	let find = |id: &str| {
		nodes
			.iter()
			.find(|n| n.id == id)
			.map(|n| state.display_position(n))
	};
	for edge in edges {
		// Dangling edges have nothing to attach to
		let (Some(src), Some(tgt)) = (find(&edge.source), find(&edge.target)) else {
			continue;
		};
		let color = if edge.selected { SELECTED_COLOR } else { EDGE_COLOR };
		ctx.set_stroke_style_str(color);
		ctx.set_fill_style_str(color);
		ctx.set_line_width(if edge.selected { 2.0 } else { 1.5 });
		arrow(ctx, source_handle(src), target_handle(tgt), 8.0);
	}
}

fn draw_pending_connection(state: &CanvasState, nodes: &[Node], ctx: &CanvasRenderingContext2d) {
	let Some(source) = &state.connect.source else {
		return;
	};
	let Some(node) = nodes.iter().find(|n| n.id == *source) else {
		return;
	};
	let (x1, y1) = source_handle(state.display_position(node));
	let Position { x: x2, y: y2 } = state.connect.cursor;

	ctx.set_stroke_style_str(SELECTED_COLOR);
	ctx.set_line_width(1.5);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(5.0),
		&JsValue::from_f64(5.0),
	));
	ctx.begin_path();
	ctx.move_to(x1, y1);
	ctx.line_to(x2, y2);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

fn handle(ctx: &CanvasRenderingContext2d, (x, y): (f64, f64)) {
	ctx.begin_path();
	let _ = ctx.arc(x, y, HANDLE_RADIUS, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(NODE_BORDER);
	ctx.fill();
}

fn draw_nodes(state: &CanvasState, nodes: &[Node], ctx: &CanvasRenderingContext2d) {
	ctx.set_font("12px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	for node in nodes {
		let pos = state.display_position(node);
		let hovered = state.is_hovered(&node.id);

		rounded_rect(ctx, pos.x, pos.y, NODE_WIDTH, NODE_HEIGHT, CORNER_RADIUS);
		ctx.set_fill_style_str(match node.kind {
			NodeKind::Input => INPUT_FILL,
			NodeKind::Default => NODE_FILL,
		});
		ctx.fill();
		ctx.set_stroke_style_str(if node.selected { SELECTED_COLOR } else { NODE_BORDER });
		ctx.set_line_width(if node.selected || hovered { 2.0 } else { 1.0 });
		ctx.stroke();

		ctx.set_fill_style_str(NODE_BORDER);
		let _ = ctx.fill_text(
			&node.label,
			pos.x + NODE_WIDTH / 2.0,
			pos.y + NODE_HEIGHT / 2.0,
		);

		if node.kind != NodeKind::Input {
			handle(ctx, target_handle(pos));
		}
		handle(ctx, source_handle(pos));
	}
}
