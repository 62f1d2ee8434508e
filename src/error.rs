//! Error types for the browser-facing parts of the app.
//!
//! The canvas engine itself is total; these only cover DOM setup and the
//! bundled demo project.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures while wiring a canvas to the DOM
#[derive(Error, Debug)]
pub enum CanvasError {
	/// No `window`/`document` (not running in a browser)
	#[error("no browser window available")]
	NoWindow,

	/// The element handed to us is not a `<canvas>`
	#[error("element is not a canvas")]
	NotACanvas,

	/// `getContext` returned nothing usable
	#[error("canvas context {0:?} unavailable")]
	ContextUnavailable(String),

	/// Exception thrown by a DOM call
	#[error("DOM error: {0}")]
	Js(String),
}

/// Result type alias for canvas setup
pub type CanvasResult<T> = Result<T, CanvasError>;

impl From<JsValue> for CanvasError {
	fn from(value: JsValue) -> Self {
		CanvasError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}

/// Failures loading the bundled demo project
#[derive(Error, Debug)]
pub enum DemoError {
	/// JSON parsing error from serde_json
	#[error("demo project JSON: {0}")]
	Json(#[from] serde_json::Error),

	/// A relation analysis names a file the project does not contain
	#[error("analysis refers to unknown file {0:?}")]
	UnknownFile(String),
}
