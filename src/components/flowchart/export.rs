//! Image export: PNG from the rendered canvas, SVG from the graph data.
//!
//! Only one PNG export may be in flight. The canvas encodes asynchronously,
//! so a second request before the first callback fires is rejected rather
//! than raced.

use std::cell::Cell;
use std::rc::Rc;

use log::info;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, HtmlCanvasElement, Url};

/// Download name of the PNG export.
pub const PNG_FILENAME: &str = "flowchart.png";
/// Download name of the SVG export.
pub const SVG_FILENAME: &str = "flowchart.svg";
/// How long a download's object URL is kept alive.
const REVOKE_DELAY_MS: i32 = 40_000;

/// Why an export produced no download.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExportError {
	#[error("nothing to export: the canvas is not mounted")]
	NoSurface,
	#[error("an export is already in progress")]
	InFlight,
	#[error("the canvas produced no image")]
	EmptyBlob,
	#[error("browser error: {0}")]
	Js(String),
}

impl From<JsValue> for ExportError {
	fn from(value: JsValue) -> Self {
		Self::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
	}
}

/// Handle to the single export slot. Clones share the slot.
#[derive(Clone, Debug, Default)]
pub struct Exporter {
	pending: Rc<Cell<bool>>,
}

impl Exporter {
	/// Exporter with a free slot.
	pub fn new() -> Self {
		Self::default()
	}

	fn claim(&self) -> Result<(), ExportError> {
		if self.pending.replace(true) {
			return Err(ExportError::InFlight);
		}
		Ok(())
	}

	fn release(&self) {
		self.pending.set(false);
	}

	/// Encode `canvas` as PNG and download it. `on_done` runs once the
	/// browser hands back the encoded image; errors before that point are
	/// returned directly and `on_done` is never called.
	pub fn export_png(
		&self,
		canvas: Option<HtmlCanvasElement>,
		on_done: impl FnOnce(Result<(), ExportError>) + 'static,
	) -> Result<(), ExportError> {
		let canvas = canvas.ok_or(ExportError::NoSurface)?;
		self.claim()?;

		let slot = self.clone();
		let callback = Closure::once_into_js(move |blob: JsValue| {
			slot.release();
			let result = blob
				.dyn_into::<Blob>()
				.map_err(|_| ExportError::EmptyBlob)
				.and_then(|blob| download(&blob, PNG_FILENAME));
			on_done(result);
		});
		if let Err(err) = canvas.to_blob(callback.unchecked_ref()) {
			self.release();
			return Err(err.into());
		}
		Ok(())
	}

	/// Download an SVG document. Synchronous, so it never occupies the slot.
	pub fn export_svg(&self, svg: &str) -> Result<(), ExportError> {
		let parts = js_sys::Array::of1(&JsValue::from_str(svg));
		let options = BlobPropertyBag::new();
		options.set_type("image/svg+xml");
		let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
		download(&blob, SVG_FILENAME)
	}
}

fn download(blob: &Blob, filename: &str) -> Result<(), ExportError> {
	let window = web_sys::window().ok_or_else(|| ExportError::Js("no window".into()))?;
	let document = window
		.document()
		.ok_or_else(|| ExportError::Js("no document".into()))?;
	let anchor: HtmlAnchorElement = document
		.create_element("a")?
		.dyn_into()
		.map_err(|_| ExportError::Js("could not create download link".into()))?;

	let url = Url::create_object_url_with_blob(blob)?;
	anchor.set_href(&url);
	anchor.set_download(filename);
	anchor.click();

	let revoke = Closure::once_into_js(move || {
		let _ = Url::revoke_object_url(&url);
	});
	window.set_timeout_with_callback_and_timeout_and_arguments_0(
		revoke.unchecked_ref(),
		REVOKE_DELAY_MS,
	)?;
	info!("exported {}", filename);
	Ok(())
}
