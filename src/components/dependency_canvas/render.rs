use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::controller::CanvasController;
use super::geometry::{NODE_FONT_SIZE, NODE_HEIGHT, edge_endpoints, node_color};
use super::measure::node_font;
use super::types::{Edge, FileNode, Point};

const BACKGROUND: &str = "#f8f9fa";
const GRID_COLOR: &str = "rgba(206, 212, 218, 0.5)";
const GRID_CELL: f64 = 20.0;
const NODE_RADIUS: f64 = 8.0;
const ARROW_SIZE: f64 = 8.0;
const LABEL_OFFSET: f64 = 12.0;

pub fn render(controller: &CanvasController, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	let state = controller.state();
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);
	ctx.save();
	let _ = ctx.translate(state.pan.x, state.pan.y);
	let _ = ctx.scale(state.zoom, state.zoom);
	draw_grid(controller, ctx, width, height);

	let nodes = controller.file_nodes();
	let by_id: HashMap<&str, &FileNode> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
	for edge in controller.visible_edges() {
		if let (Some(from), Some(to)) = (by_id.get(edge.from.as_str()), by_id.get(edge.to.as_str())) {
			draw_edge(ctx, edge, from, to);
		}
	}
	draw_nodes(controller, &nodes, ctx);
	ctx.restore();
}

/// Grid lines covering the visible diagram-space window.
fn draw_grid(controller: &CanvasController, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	let top_left = controller.screen_to_diagram(Point::ORIGIN);
	let bottom_right = controller.screen_to_diagram(Point::new(width, height));
	let first_x = (top_left.x / GRID_CELL).floor() * GRID_CELL;
	let first_y = (top_left.y / GRID_CELL).floor() * GRID_CELL;

	ctx.set_stroke_style_str(GRID_COLOR);
	ctx.set_line_width(0.5 / controller.state().zoom);
	ctx.begin_path();
	let mut x = first_x;
	while x <= bottom_right.x {
		ctx.move_to(x, top_left.y);
		ctx.line_to(x, bottom_right.y);
		x += GRID_CELL;
	}
	let mut y = first_y;
	while y <= bottom_right.y {
		ctx.move_to(top_left.x, y);
		ctx.line_to(bottom_right.x, y);
		y += GRID_CELL;
	}
	ctx.stroke();
}

fn draw_edge(ctx: &CanvasRenderingContext2d, edge: &Edge, from: &FileNode, to: &FileNode) {
	let (start, end) = edge_endpoints(from, to);
	let delta = end - start;
	let dist = delta.x.hypot(delta.y);
	if dist < 0.001 {
		return;
	}
	let unit = delta / dist;
	let color = node_color(&edge.from);

	// analysed edges are clickable and drawn solid and heavier
	let (line_width, alpha) = if edge.is_clickable() { (3.0, 0.8) } else { (2.0, 0.7) };
	ctx.set_global_alpha(alpha);
	ctx.set_stroke_style_str(color);
	ctx.set_line_width(line_width);
	if !edge.is_clickable() {
		let _ = ctx.set_line_dash(&js_sys::Array::of2(&JsValue::from_f64(6.0), &JsValue::from_f64(4.0)));
	}
	let shaft_end = end - unit * ARROW_SIZE;
	ctx.begin_path();
	ctx.move_to(start.x, start.y);
	ctx.line_to(shaft_end.x, shaft_end.y);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	let side = Point::new(-unit.y, unit.x) * (ARROW_SIZE * 0.5);
	ctx.set_fill_style_str(color);
	ctx.begin_path();
	ctx.move_to(end.x, end.y);
	ctx.line_to(shaft_end.x + side.x, shaft_end.y + side.y);
	ctx.line_to(shaft_end.x - side.x, shaft_end.y - side.y);
	ctx.close_path();
	ctx.fill();
	ctx.set_global_alpha(1.0);

	if edge.description.is_empty() {
		return;
	}
	let label = (start + end) / 2.0 + Point::new(-unit.y, unit.x) * LABEL_OFFSET;
	ctx.set_fill_style_str("#495057");
	ctx.set_font(&node_font(10.0));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(&edge.description, label.x, label.y);
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, center: Point, width: f64, height: f64, radius: f64) {
	let (left, top) = (center.x - width / 2.0, center.y - height / 2.0);
	let (right, bottom) = (left + width, top + height);
	let r = radius.min(width / 2.0).min(height / 2.0);
	ctx.begin_path();
	ctx.move_to(left + r, top);
	ctx.line_to(right - r, top);
	let _ = ctx.arc(right - r, top + r, r, -FRAC_PI_2, 0.0);
	ctx.line_to(right, bottom - r);
	let _ = ctx.arc(right - r, bottom - r, r, 0.0, FRAC_PI_2);
	ctx.line_to(left + r, bottom);
	let _ = ctx.arc(left + r, bottom - r, r, FRAC_PI_2, 2.0 * FRAC_PI_2);
	ctx.line_to(left, top + r);
	let _ = ctx.arc(left + r, top + r, r, 2.0 * FRAC_PI_2, 3.0 * FRAC_PI_2);
	ctx.close_path();
}

fn draw_nodes(controller: &CanvasController, nodes: &[FileNode], ctx: &CanvasRenderingContext2d) {
	let state = controller.state();
	let selected = state.selected_node_id.as_deref();
	let dragged = state.dragged_node_id();

	for node in nodes {
		let is_selected = selected == Some(node.id.as_str());
		let (fill, stroke, stroke_width) = if is_selected {
			("#a5d8ff", "#228be6", 3.0)
		} else {
			("#d0ebff", "#74c0fc", 1.0)
		};

		ctx.set_global_alpha(if dragged == Some(node.id.as_str()) { 0.8 } else { 1.0 });
		rounded_rect(ctx, node.position, node.width, NODE_HEIGHT, NODE_RADIUS);
		ctx.set_fill_style_str(fill);
		ctx.fill();
		ctx.set_stroke_style_str(stroke);
		ctx.set_line_width(stroke_width);
		ctx.stroke();

		ctx.set_fill_style_str("#1864ab");
		ctx.set_font(&format!("500 {}", node_font(NODE_FONT_SIZE)));
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let _ = ctx.fill_text(&node.display_text, node.position.x, node.position.y);
	}
	ctx.set_global_alpha(1.0);
}
