use log::warn;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::geometry::TextMeasure;
use crate::error::{CanvasError, CanvasResult};

pub const NODE_FONT_FAMILY: &str = "'Inter', sans-serif";

pub fn node_font(font_size: f64) -> String {
	format!("{font_size}px {NODE_FONT_FAMILY}")
}

/// Measures label widths on a throwaway off-screen canvas.
pub struct CanvasTextMeasure;

impl CanvasTextMeasure {
	fn context() -> CanvasResult<CanvasRenderingContext2d> {
		let document = web_sys::window()
			.and_then(|w| w.document())
			.ok_or(CanvasError::NoWindow)?;
		let canvas: HtmlCanvasElement = document
			.create_element("canvas")?
			.dyn_into()
			.map_err(|_| CanvasError::NotACanvas)?;
		context_2d(&canvas)
	}
}

impl TextMeasure for CanvasTextMeasure {
	fn measure(&self, text: &str, font_size: f64) -> Option<f64> {
		let ctx = match Self::context() {
			Ok(ctx) => ctx,
			Err(err) => {
				warn!("text measurement unavailable: {err}");
				return None;
			}
		};
		ctx.set_font(&node_font(font_size));
		ctx.measure_text(text).ok().map(|m| m.width())
	}
}

pub fn context_2d(canvas: &HtmlCanvasElement) -> CanvasResult<CanvasRenderingContext2d> {
	canvas
		.get_context("2d")?
		.ok_or_else(|| CanvasError::ContextUnavailable("2d".into()))?
		.dyn_into::<CanvasRenderingContext2d>()
		.map_err(|_| CanvasError::ContextUnavailable("2d".into()))
}
