//! Single owner of the canvas state. DOM handlers call into it at event time
//! and redraw when a method reports a change.

use std::borrow::Cow;

use log::debug;

use super::geometry::{self, EDGE_HIT_TOLERANCE, TextMeasure};
use super::state::{self, CanvasState, DragGesture, DragTarget, Gesture, Tooltip};
use super::types::{Annotations, Edge, FileEntry, FileNode, NodePositions, Point, node_id, node_index};

/// Zoom step per wheel notch, as a fraction of the current zoom.
pub const WHEEL_ZOOM_STEP: f64 = 0.1;

pub struct CanvasController {
	state: CanvasState,
	positions: NodePositions,
	files: Vec<FileEntry>,
	widths: Vec<f64>,
	edges: Vec<Edge>,
	annotations: Annotations,
}

impl CanvasController {
	pub fn new(files: Vec<FileEntry>, edges: Vec<Edge>, annotations: Annotations, measure: &dyn TextMeasure) -> Self {
		let mut controller = Self {
			state: CanvasState::default(),
			positions: NodePositions::new(),
			files: Vec::new(),
			widths: Vec::new(),
			edges: Vec::new(),
			annotations,
		};
		controller.set_graph(files, edges, measure);
		controller
	}

	/// Replaces the graph. With edges every node is laid out again as a tree;
	/// without, nodes keep their current positions and only new ones are
	/// placed on the grid.
	pub fn set_graph(&mut self, files: Vec<FileEntry>, edges: Vec<Edge>, measure: &dyn TextMeasure) {
		self.widths = geometry::node_widths(&files, measure);
		self.positions = if edges.is_empty() {
			(0..files.len())
				.map(|i| {
					let id = node_id(i);
					let position = self.positions.get(&id).copied().unwrap_or_else(|| {
						geometry::calculate_initial_position(i, files.len(), &self.widths)
					});
					(id, position)
				})
				.collect()
		} else {
			geometry::layout_positions(&files, &edges, &self.widths)
		};
		self.files = files;
		self.edges = edges;
		debug!("laid out {} nodes, {} edges", self.files.len(), self.edges.len());
	}

	pub fn set_annotations(&mut self, annotations: Annotations) {
		self.annotations = annotations;
	}

	pub fn state(&self) -> &CanvasState {
		&self.state
	}

	pub fn positions(&self) -> &NodePositions {
		&self.positions
	}

	pub fn tooltip(&self) -> &Tooltip {
		&self.state.tooltip
	}

	pub fn file_nodes(&self) -> Vec<FileNode> {
		geometry::derive_file_nodes(&self.files, &self.edges, &self.widths, &self.positions)
	}

	/// Edges whose endpoints both resolve to a node.
	pub fn visible_edges(&self) -> impl Iterator<Item = &Edge> {
		let count = self.files.len();
		let known = move |id: &str| node_index(id).is_some_and(|i| i < count);
		self.edges.iter().filter(move |e| known(&e.from) && known(&e.to))
	}

	pub fn screen_to_diagram(&self, p: Point) -> Point {
		(p - self.state.pan) / self.state.zoom
	}

	/// Topmost node under a screen point; later nodes are drawn on top.
	pub fn node_at(&self, screen: Point) -> Option<FileNode> {
		let p = self.screen_to_diagram(screen);
		self.file_nodes().into_iter().rev().find(|n| n.contains(p))
	}

	/// Clickable edge under a screen point.
	pub fn edge_at(&self, screen: Point) -> Option<&Edge> {
		let p = self.screen_to_diagram(screen);
		let nodes = self.file_nodes();
		let lookup = |id: &str| nodes.iter().find(|n| n.id == id);
		let tolerance = EDGE_HIT_TOLERANCE / self.state.zoom;
		self.visible_edges().filter(|e| e.is_clickable()).find(|e| {
			let (Some(from), Some(to)) = (lookup(&e.from), lookup(&e.to)) else {
				return false;
			};
			let (a, b) = geometry::edge_endpoints(from, to);
			geometry::distance_to_segment(p, a, b) <= tolerance
		})
	}

	pub fn pointer_down(&mut self, p: Point) -> bool {
		if let Some(node) = self.node_at(p) {
			self.state = self.state.begin_node_drag(&node.id, p, node.position);
			return true;
		}
		if let Some(edge) = self.edge_at(p) {
			let next = self.state.show_edge_tooltip(&edge.id, p, edge.analysis.as_deref());
			self.state = next;
			return true;
		}
		self.state = self.state.hide_tooltip().begin_canvas_drag(p);
		true
	}

	pub fn pointer_move(&mut self, p: Point) -> bool {
		let Some(DragGesture { start, target }) = self.state.drag.clone() else {
			return false;
		};
		match target {
			DragTarget::Node { node_id, origin } => {
				self.positions = state::drag_node(&self.positions, &node_id, start, p, self.state.zoom, origin);
			}
			DragTarget::Canvas => {
				self.state = self.state.drag_canvas(start, p).with_drag_start(p);
			}
		}
		true
	}

	pub fn pointer_up(&mut self, p: Point) -> bool {
		let Some(DragGesture { start, target }) = self.state.drag.clone() else {
			return false;
		};
		if let DragTarget::Node { node_id, .. } = target {
			let gesture = state::classify_gesture(start, p);
			debug!("{node_id} gesture classified as {gesture:?}");
			if gesture == Gesture::Click {
				let notes = self.annotations_for(&node_id);
				self.state = self.state.click_node(&node_id).toggle_node_tooltip(&node_id, p, &notes);
			}
		}
		self.state = self.state.end_drag();
		true
	}

	pub fn pointer_leave(&mut self) -> bool {
		if !self.state.is_dragging() {
			return false;
		}
		self.state = self.state.end_drag();
		true
	}

	/// Negative `delta_y` (wheel up) zooms in. Horizontal-only scrolls
	/// (`delta_y == 0`) leave the zoom alone.
	pub fn wheel(&mut self, p: Point, delta_y: f64) -> bool {
		if delta_y == 0.0 || delta_y.is_nan() {
			return false;
		}
		let step = if delta_y > 0.0 { -WHEEL_ZOOM_STEP } else { WHEEL_ZOOM_STEP };
		let zoomed = match self.state.zoom(p, step) {
			Cow::Borrowed(_) => return false,
			Cow::Owned(next) => next,
		};
		debug!("zoom {:.2} -> {:.2}", self.state.zoom, zoomed.zoom);
		self.state = zoomed;
		true
	}

	pub fn cursor(&self, p: Point) -> &'static str {
		match self.state.drag.as_ref().map(|d| &d.target) {
			Some(DragTarget::Canvas) => "grabbing",
			Some(DragTarget::Node { .. }) => "move",
			None if self.node_at(p).is_some() => "move",
			None if self.edge_at(p).is_some() => "pointer",
			None => "grab",
		}
	}

	fn annotations_for(&self, node_id: &str) -> Vec<String> {
		node_index(node_id)
			.and_then(|i| self.files.get(i))
			.and_then(|f| self.annotations.get(f.identifier()))
			.cloned()
			.unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::dependency_canvas::state::{DragType, TooltipKind};

	fn measure(_: &str, _: f64) -> Option<f64> {
		Some(36.0)
	}

	fn controller() -> CanvasController {
		let files = vec![
			FileEntry::new("config.ts", Some("src/config.ts")),
			FileEntry::new("server.ts", Some("src/server.ts")),
			FileEntry::new("README.md", None),
		];
		let edges = vec![Edge {
			id: "dep-1".into(),
			from: node_id(1),
			to: node_id(0),
			description: "uses".into(),
			analysis: Some("server reads the port from config".into()),
		}];
		let mut annotations = Annotations::new();
		annotations.insert("src/config.ts".into(), vec!["exports defaults".into()]);
		CanvasController::new(files, edges, annotations, &measure)
	}

	fn screen_of(c: &CanvasController, index: usize) -> Point {
		let p = c.positions()[&node_id(index)];
		p * c.state().zoom + c.state().pan
	}

	#[test]
	fn lays_out_as_tree_when_edges_exist() {
		let c = controller();
		let (config, server) = (c.positions()["file-0"], c.positions()["file-1"]);
		assert!(config.y < server.y);
		assert_eq!(c.file_nodes().len(), 3);
		assert!(c.file_nodes().iter().all(|n| n.width == 100.0));
	}

	#[test]
	fn short_press_on_node_selects_and_shows_annotations() {
		let mut c = controller();
		let at = screen_of(&c, 0);
		assert!(c.pointer_down(at));
		assert_eq!(c.state().drag_type(), DragType::Node);

		c.pointer_move(at + Point::new(2.0, 3.0));
		c.pointer_up(at + Point::new(4.0, 4.0));

		assert!(!c.state().is_dragging());
		assert_eq!(c.state().selected_node_id.as_deref(), Some("file-0"));
		assert_eq!(c.tooltip().kind(), TooltipKind::Node);
		assert_eq!(c.tooltip().annotations(), ["exports defaults".to_string()]);

		// a second click on the same node toggles both off
		c.pointer_down(at);
		c.pointer_up(at);
		assert_eq!(c.state().selected_node_id, None);
		assert!(!c.tooltip().is_visible());
	}

	#[test]
	fn node_without_annotations_gets_empty_tooltip() {
		let mut c = controller();
		let at = screen_of(&c, 2);
		c.pointer_down(at);
		c.pointer_up(at);
		assert_eq!(c.tooltip().target_id(), Some("file-2"));
		assert!(c.tooltip().annotations().is_empty());
	}

	#[test]
	fn long_press_moves_node_without_selecting() {
		let mut c = controller();
		c.wheel(Point::ORIGIN, -1.0); // zoom 1.1
		let before = c.positions()["file-2"];
		let at = screen_of(&c, 2);

		c.pointer_down(at);
		c.pointer_move(at + Point::new(55.0, 0.0));
		c.pointer_up(at + Point::new(55.0, 0.0));

		let after = c.positions()["file-2"];
		assert!((after.x - (before.x + 50.0)).abs() < 1e-9);
		assert_eq!(after.y, before.y);
		assert_eq!(c.state().selected_node_id, None);
		assert!(!c.tooltip().is_visible());
		assert!(!c.state().is_dragging());
	}

	#[test]
	fn threshold_boundary_counts_as_drag() {
		let mut c = controller();
		let at = screen_of(&c, 0);
		c.pointer_down(at);
		c.pointer_up(at + Point::new(5.0, 0.0));
		assert_eq!(c.state().selected_node_id, None);
	}

	#[test]
	fn background_drag_pans_incrementally() {
		let mut c = controller();
		let empty = Point::new(-5000.0, -5000.0);
		c.pointer_down(empty);
		assert_eq!(c.state().drag_type(), DragType::Canvas);
		assert_eq!(c.cursor(empty), "grabbing");

		c.pointer_move(empty + Point::new(10.0, 5.0));
		c.pointer_move(empty + Point::new(25.0, 15.0));
		c.pointer_move(empty + Point::new(20.0, 20.0));
		c.pointer_up(empty + Point::new(20.0, 20.0));

		assert_eq!(c.state().pan, Point::new(20.0, 20.0));
		assert!(!c.state().is_dragging());
	}

	#[test]
	fn background_press_hides_tooltip() {
		let mut c = controller();
		let at = screen_of(&c, 0);
		c.pointer_down(at);
		c.pointer_up(at);
		assert!(c.tooltip().is_visible());

		c.pointer_down(Point::new(-5000.0, -5000.0));
		assert!(!c.tooltip().is_visible());
	}

	#[test]
	fn analysed_edge_shows_analysis() {
		let mut c = controller();
		let nodes = c.file_nodes();
		let (a, b) = geometry::edge_endpoints(&nodes[1], &nodes[0]);
		let mid = (a + b) / 2.0;

		assert_eq!(c.cursor(mid), "pointer");
		c.pointer_down(mid);
		assert_eq!(c.tooltip().kind(), TooltipKind::Edge);
		assert_eq!(c.tooltip().analysis(), Some("server reads the port from config"));
		assert!(!c.state().is_dragging());
	}

	#[test]
	fn edge_without_analysis_is_not_clickable() {
		let mut c = controller();
		let files = vec![FileEntry::new("a.ts", None), FileEntry::new("b.ts", None)];
		let edges = vec![Edge {
			id: "plain".into(),
			from: node_id(0),
			to: node_id(1),
			description: "uses".into(),
			analysis: None,
		}];
		c.set_graph(files, edges, &measure);
		let nodes = c.file_nodes();
		let (a, b) = geometry::edge_endpoints(&nodes[0], &nodes[1]);
		let mid = (a + b) / 2.0;

		assert!(c.edge_at(mid).is_none());
		assert_eq!(c.cursor(mid), "grab");
		c.pointer_down(mid);
		assert_eq!(c.state().drag_type(), DragType::Canvas);
	}

	#[test]
	fn wheel_zooms_about_cursor_and_stops_at_bounds() {
		let mut c = controller();
		let cursor = Point::new(200.0, 150.0);
		let anchor = c.screen_to_diagram(cursor);
		assert!(c.wheel(cursor, -120.0));
		let moved = c.screen_to_diagram(cursor);
		assert!((anchor.x - moved.x).abs() < 1e-9 && (anchor.y - moved.y).abs() < 1e-9);

		while c.wheel(cursor, 120.0) {}
		assert_eq!(c.state().zoom, state::MIN_ZOOM);
		assert!(!c.wheel(cursor, 120.0));
	}

	#[test]
	fn sideways_scroll_keeps_zoom() {
		let mut c = controller();
		let before = c.state().clone();
		assert!(!c.wheel(Point::new(100.0, 100.0), 0.0));
		assert!(!c.wheel(Point::new(100.0, 100.0), -0.0));
		assert_eq!(c.state(), &before);
	}

	#[test]
	fn edgeless_graph_keeps_existing_positions() {
		let files = vec![FileEntry::new("a.ts", None), FileEntry::new("b.ts", None)];
		let mut c = CanvasController::new(files.clone(), Vec::new(), Annotations::new(), &measure);
		let at = screen_of(&c, 0);
		c.pointer_down(at);
		c.pointer_move(at + Point::new(30.0, 40.0));
		c.pointer_up(at + Point::new(30.0, 40.0));
		let dragged = c.positions()["file-0"];
		let untouched = c.positions()["file-1"];

		let mut grown = files;
		grown.push(FileEntry::new("c.ts", None));
		c.set_graph(grown, Vec::new(), &measure);

		assert_eq!(c.positions()["file-0"], dragged);
		assert_eq!(c.positions()["file-1"], untouched);
		assert_eq!(
			c.positions()["file-2"],
			geometry::calculate_initial_position(2, 3, &[100.0, 100.0, 100.0])
		);

		let edge = Edge {
			id: "e".into(),
			from: node_id(1),
			to: node_id(0),
			..Default::default()
		};
		c.set_graph(vec![FileEntry::new("a.ts", None), FileEntry::new("b.ts", None)], vec![edge], &measure);
		assert_ne!(c.positions()["file-0"], dragged);
	}

	#[test]
	fn dangling_edges_are_not_visible() {
		let mut c = controller();
		let files = vec![FileEntry::new("a.ts", None)];
		let edges = vec![Edge {
			id: "ghost".into(),
			from: node_id(0),
			to: node_id(4),
			..Default::default()
		}];
		c.set_graph(files, edges, &measure);
		assert_eq!(c.visible_edges().count(), 0);
		assert_eq!(c.positions().len(), 1);
	}

	#[test]
	fn leave_and_stray_events_are_safe() {
		let mut c = controller();
		assert!(!c.pointer_move(Point::ORIGIN));
		assert!(!c.pointer_up(Point::ORIGIN));
		assert!(!c.pointer_leave());

		c.pointer_down(screen_of(&c, 1));
		assert!(c.pointer_leave());
		assert!(!c.state().is_dragging());
	}
}
