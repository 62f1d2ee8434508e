//! Canvas interaction state and its pure transitions.
//!
//! Every transition borrows the current state and returns a new one; nothing
//! here mutates its input. `zoom` hands back the borrowed state when the zoom
//! level cannot move, so callers can skip work on `Cow::Borrowed`.

use std::borrow::Cow;

use super::types::{NodeId, NodePosition, NodePositions, Point};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 3.0;

/// Screen-pixel tolerance, per axis, under which a node gesture is a click.
pub const CLICK_THRESHOLD: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragType {
	None,
	Canvas,
	Node,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DragTarget {
	Canvas,
	/// `origin` is the node position before the gesture started.
	Node { node_id: NodeId, origin: NodePosition },
}

/// An in-progress pointer gesture.
#[derive(Clone, Debug, PartialEq)]
pub struct DragGesture {
	pub start: Point,
	pub target: DragTarget,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TooltipKind {
	None,
	Node,
	Edge,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Tooltip {
	#[default]
	Hidden,
	Node {
		node_id: NodeId,
		position: Point,
		annotations: Vec<String>,
	},
	Edge {
		edge_id: String,
		position: Point,
		analysis: Option<String>,
	},
}

impl Tooltip {
	pub fn is_visible(&self) -> bool {
		!matches!(self, Tooltip::Hidden)
	}

	pub fn kind(&self) -> TooltipKind {
		match self {
			Tooltip::Hidden => TooltipKind::None,
			Tooltip::Node { .. } => TooltipKind::Node,
			Tooltip::Edge { .. } => TooltipKind::Edge,
		}
	}

	pub fn target_id(&self) -> Option<&str> {
		match self {
			Tooltip::Hidden => None,
			Tooltip::Node { node_id, .. } => Some(node_id.as_str()),
			Tooltip::Edge { edge_id, .. } => Some(edge_id.as_str()),
		}
	}

	pub fn position(&self) -> Point {
		match self {
			Tooltip::Hidden => Point::ORIGIN,
			Tooltip::Node { position, .. } | Tooltip::Edge { position, .. } => *position,
		}
	}

	pub fn annotations(&self) -> &[String] {
		match self {
			Tooltip::Node { annotations, .. } => annotations,
			_ => &[],
		}
	}

	pub fn analysis(&self) -> Option<&str> {
		match self {
			Tooltip::Edge { analysis, .. } => analysis.as_deref(),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct CanvasState {
	pub zoom: f64,
	pub pan: Point,
	pub selected_node_id: Option<NodeId>,
	pub drag: Option<DragGesture>,
	pub tooltip: Tooltip,
}

impl Default for CanvasState {
	fn default() -> Self {
		Self {
			zoom: 1.0,
			pan: Point::ORIGIN,
			selected_node_id: None,
			drag: None,
			tooltip: Tooltip::Hidden,
		}
	}
}

impl CanvasState {
	pub fn is_dragging(&self) -> bool {
		self.drag.is_some()
	}

	pub fn drag_type(&self) -> DragType {
		match &self.drag {
			None => DragType::None,
			Some(DragGesture { target: DragTarget::Canvas, .. }) => DragType::Canvas,
			Some(DragGesture { target: DragTarget::Node { .. }, .. }) => DragType::Node,
		}
	}

	pub fn dragged_node_id(&self) -> Option<&str> {
		match &self.drag {
			Some(DragGesture { target: DragTarget::Node { node_id, .. }, .. }) => Some(node_id.as_str()),
			_ => None,
		}
	}

	pub fn drag_start_point(&self) -> Option<Point> {
		self.drag.as_ref().map(|d| d.start)
	}

	/// Pans by the pointer delta. Pan is unbounded.
	pub fn drag_canvas(&self, start: Point, current: Point) -> Self {
		Self {
			pan: self.pan + (current - start),
			..self.clone()
		}
	}

	/// Zooms by `1 + zoom_delta` while keeping the diagram point under
	/// `zoom_point` fixed on screen.
	pub fn zoom(&self, zoom_point: Point, zoom_delta: f64) -> Cow<'_, Self> {
		let new_zoom = (self.zoom * (1.0 + zoom_delta)).clamp(MIN_ZOOM, MAX_ZOOM);
		if new_zoom == self.zoom {
			return Cow::Borrowed(self);
		}
		let ratio = new_zoom / self.zoom;
		Cow::Owned(Self {
			zoom: new_zoom,
			pan: zoom_point - (zoom_point - self.pan) * ratio,
			..self.clone()
		})
	}

	/// Selects `node_id`, or clears the selection if it is already selected.
	pub fn click_node(&self, node_id: &str) -> Self {
		let selected = match self.selected_node_id.as_deref() {
			Some(current) if current == node_id => None,
			_ => Some(node_id.to_owned()),
		};
		Self {
			selected_node_id: selected,
			..self.clone()
		}
	}

	pub fn toggle_node_tooltip(&self, node_id: &str, position: Point, annotations: &[String]) -> Self {
		let showing_this = matches!(&self.tooltip, Tooltip::Node { node_id: id, .. } if id == node_id);
		let tooltip = if showing_this {
			Tooltip::Hidden
		} else {
			Tooltip::Node {
				node_id: node_id.to_owned(),
				position,
				annotations: annotations.to_vec(),
			}
		};
		Self {
			tooltip,
			..self.clone()
		}
	}

	pub fn show_edge_tooltip(&self, edge_id: &str, position: Point, analysis: Option<&str>) -> Self {
		Self {
			tooltip: Tooltip::Edge {
				edge_id: edge_id.to_owned(),
				position,
				analysis: analysis.map(str::to_owned),
			},
			..self.clone()
		}
	}

	pub fn hide_tooltip(&self) -> Self {
		Self {
			tooltip: Tooltip::Hidden,
			..self.clone()
		}
	}

	pub fn begin_canvas_drag(&self, start: Point) -> Self {
		Self {
			drag: Some(DragGesture {
				start,
				target: DragTarget::Canvas,
			}),
			..self.clone()
		}
	}

	pub fn begin_node_drag(&self, node_id: &str, start: Point, origin: NodePosition) -> Self {
		Self {
			drag: Some(DragGesture {
				start,
				target: DragTarget::Node {
					node_id: node_id.to_owned(),
					origin,
				},
			}),
			..self.clone()
		}
	}

	/// Moves the reference point of an incremental (canvas) drag.
	pub fn with_drag_start(&self, start: Point) -> Self {
		Self {
			drag: self.drag.clone().map(|d| DragGesture { start, ..d }),
			..self.clone()
		}
	}

	pub fn end_drag(&self) -> Self {
		Self {
			drag: None,
			..self.clone()
		}
	}
}

/// Moves `node_id` to `origin` plus the screen delta scaled into diagram space.
///
/// Other entries are copied through untouched. An id that names no file is
/// written as well; nothing ever looks it up, so it is harmless.
pub fn drag_node(
	positions: &NodePositions,
	node_id: &str,
	start: Point,
	current: Point,
	zoom: f64,
	origin: NodePosition,
) -> NodePositions {
	let mut next = positions.clone();
	next.insert(node_id.to_owned(), origin + (current - start) / zoom);
	next
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
	Click,
	Drag,
}

/// Per-axis box test, not a radius: `(4, 4)` is a click, `(5, 0)` is a drag.
pub fn classify_gesture(start: Point, end: Point) -> Gesture {
	let d = end - start;
	if d.x.abs() < CLICK_THRESHOLD && d.y.abs() < CLICK_THRESHOLD {
		Gesture::Click
	} else {
		Gesture::Drag
	}
}
