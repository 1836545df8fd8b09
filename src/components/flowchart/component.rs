use std::cell::RefCell;
use std::rc::Rc;

use leptos::html::Canvas;
use leptos::prelude::*;
use log::{error, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use super::export::{ExportError, Exporter};
use super::history::HistoryConfig;
use super::render;
use super::state::{CanvasState, Hit, select_only};
use super::store::GraphStore;
use super::svg::render_svg;

const ZOOM_STEP: f64 = 1.2;

fn canvas_point(canvas_ref: NodeRef<Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Flowchart editor: toolbar commands on top of the canvas.
#[component]
pub fn Flowchart(
	#[prop(optional)] history: HistoryConfig,
	#[prop(default = false)] fullscreen: bool,
) -> impl IntoView {
	let store = RwSignal::new(GraphStore::with_config(history));
	let canvas_ref = NodeRef::<Canvas>::new();
	let exporter = Exporter::new();
	let status = RwSignal::new(None::<String>);

	let report = move |result: Result<(), ExportError>| match result {
		Ok(()) => status.set(None),
		Err(err) => {
			warn!("export failed: {}", err);
			status.set(Some(err.to_string()));
		}
	};

	let add_node = move |_| {
		store.update(|g| {
			g.add_node();
		})
	};
	let undo = move |_| {
		store.update(|g| {
			g.undo();
		})
	};
	let can_undo = move || store.with(|g| g.can_undo());

	let png_exporter = exporter.clone();
	let export_png = move |_| match png_exporter.export_png(canvas_ref.get_untracked(), report) {
		Ok(()) => status.set(Some("Exporting…".into())),
		Err(err) => report(Err(err)),
	};
	let export_svg = move |_| {
		let svg = store.with_untracked(|g| render_svg(g.nodes(), g.edges()));
		report(exporter.export_svg(&svg));
	};

	view! {
		<div class="flowchart">
			<div class="flowchart-toolbar">
				<button class="btn" on:click=add_node>"Add Node"</button>
				<button class="btn" on:click=undo disabled=move || !can_undo()>"Undo"</button>
				<button class="btn btn-primary" on:click=export_png>"Export as PNG"</button>
				<button class="btn" on:click=export_svg>"Export as SVG"</button>
				{move || status.get().map(|msg| view! { <span class="flowchart-status">{msg}</span> })}
			</div>
			<FlowchartCanvas store=store canvas_ref=canvas_ref fullscreen=fullscreen />
		</div>
	}
}

/// Canvas renderer for a [`GraphStore`]. Gestures are turned into store
/// changes; the store is redrawn every animation frame.
#[component]
pub fn FlowchartCanvas(
	store: RwSignal<GraphStore>,
	canvas_ref: NodeRef<Canvas>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let state: Rc<RefCell<Option<CanvasState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("no window, flowchart canvas not started");
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("canvas has no 2d context");
			return;
		};
		*state_init.borrow_mut() = Some(store.with_untracked(|g| CanvasState::new(g.nodes(), w, h)));
		info!("flowchart canvas mounted at {}x{}", w, h);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner, resize_teardown) =
			(state_init.clone(), animate_init.clone(), resize_cb_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref s) = *state_anim.borrow() {
				// Store is gone once the component unmounts; stop drawing
				let drawn =
					store.try_with_untracked(|g| render::render(s, g.nodes(), g.edges(), &ctx));
				if drawn.is_none() {
					let resize = resize_teardown.borrow_mut().take();
					if let (Some(win), Some(cb)) = (web_sys::window(), resize) {
						let _ = win.remove_event_listener_with_callback(
							"resize",
							cb.as_ref().unchecked_ref(),
						);
					}
					info!("flowchart canvas unmounted");
					return;
				}
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(canvas) = canvas_ref.get_untracked() {
			let _ = canvas.focus();
		}

		let selection = {
			let mut guard = state_md.borrow_mut();
			let Some(s) = guard.as_mut() else {
				return;
			};
			store.with_untracked(|g| {
				let hit = s.hit_test(g.nodes(), g.edges(), x, y);
				match &hit {
					Hit::SourceHandle(id) => s.begin_connect(id, x, y),
					Hit::Node(id) => {
						if let Some(node) = g.node(id) {
							s.begin_drag(node, x, y);
						}
					}
					Hit::Edge(_) => {}
					Hit::Background => s.begin_pan(x, y),
				}
				select_only(g.nodes(), g.edges(), &hit)
			})
		};

		let (node_changes, edge_changes) = selection;
		if !node_changes.is_empty() || !edge_changes.is_empty() {
			store.update(|g| {
				g.apply_node_changes(node_changes);
				g.apply_edge_changes(edge_changes);
			});
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.is_dragging() {
				s.drag_to(x, y);
			} else if s.is_connecting() {
				s.connect_to(x, y);
			} else if s.pan.active {
				s.pan_to(x, y);
			} else {
				let hovered = store.with_untracked(|g| s.node_at_position(g.nodes(), x, y));
				s.set_hover(hovered);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let point = canvas_point(canvas_ref, &ev);
		let (moved, connection) = match *state_mu.borrow_mut() {
			Some(ref mut s) => {
				s.pan.active = false;
				let moved = s.end_drag();
				let connection = match point {
					Some((x, y)) => store.with_untracked(|g| s.end_connect(g.nodes(), x, y)),
					None => {
						s.cancel_gestures();
						None
					}
				};
				(moved, connection)
			}
			None => (None, None),
		};

		if let Some(change) = moved {
			store.update(|g| g.apply_node_changes([change]));
		}
		if let Some(connection) = connection {
			store.update(|g| {
				g.connect(connection);
			});
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.cancel_gestures();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(factor, x, y);
		}
	};

	let on_keydown = move |ev: KeyboardEvent| match ev.key().as_str() {
		"Delete" | "Backspace" => {
			ev.prevent_default();
			store.update(|g| {
				g.remove_selected();
			});
		}
		"z" if ev.ctrl_key() || ev.meta_key() => {
			ev.prevent_default();
			store.update(|g| {
				g.undo();
			});
		}
		_ => {}
	};

	let (state_zi, state_zo, state_fit) = (state.clone(), state.clone(), state.clone());
	let zoom_in = move |_| {
		if let Some(ref mut s) = *state_zi.borrow_mut() {
			s.zoom_center(ZOOM_STEP);
		}
	};
	let zoom_out = move |_| {
		if let Some(ref mut s) = *state_zo.borrow_mut() {
			s.zoom_center(1.0 / ZOOM_STEP);
		}
	};
	let fit_view = move |_| {
		if let Some(ref mut s) = *state_fit.borrow_mut() {
			store.with_untracked(|g| s.fit_view(g.nodes()));
		}
	};

	view! {
		<div class="flowchart-surface" style="position: relative; height: 80vh;">
			<canvas
				node_ref=canvas_ref
				class="flowchart-canvas"
				tabindex="0"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:keydown=on_keydown
				style="display: block; cursor: default; outline: none;"
			/>
			<div class="flowchart-controls" style="position: absolute; left: 10px; bottom: 10px;">
				<button on:click=zoom_in title="Zoom in">"+"</button>
				<button on:click=zoom_out title="Zoom out">"−"</button>
				<button on:click=fit_view title="Fit view">"Fit"</button>
			</div>
		</div>
	}
}
