use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, info};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::controller::CanvasController;
use super::measure::{CanvasTextMeasure, context_2d};
use super::render;
use super::state::Tooltip;
use super::types::{Annotations, Edge, FileEntry, Point};
use crate::error::CanvasResult;

const DEFAULT_WIDTH: f64 = 800.0;
const DEFAULT_HEIGHT: f64 = 400.0;

struct Surface {
	ctx: CanvasRenderingContext2d,
	width: f64,
	height: f64,
}

/// Shared between the effect and the DOM handlers. Handlers read the
/// controller when the event fires, never a copy taken at registration.
#[derive(Clone)]
struct CanvasHandle {
	controller: Rc<RefCell<Option<CanvasController>>>,
	surface: Rc<RefCell<Option<Surface>>>,
	tooltip: RwSignal<Tooltip>,
	cursor: RwSignal<&'static str>,
}

impl CanvasHandle {
	fn new() -> Self {
		Self {
			controller: Rc::new(RefCell::new(None)),
			surface: Rc::new(RefCell::new(None)),
			tooltip: RwSignal::new(Tooltip::Hidden),
			cursor: RwSignal::new("grab"),
		}
	}

	fn load(&self, files: Vec<FileEntry>, edges: Vec<Edge>, annotations: Annotations) {
		info!("dependency canvas: {} files, {} edges", files.len(), edges.len());
		{
			let mut slot = self.controller.borrow_mut();
			if let Some(controller) = slot.as_mut() {
				controller.set_graph(files, edges, &CanvasTextMeasure);
				controller.set_annotations(annotations);
			} else {
				*slot = Some(CanvasController::new(files, edges, annotations, &CanvasTextMeasure));
			}
		}
		self.redraw();
	}

	fn redraw(&self) {
		let controller = self.controller.borrow();
		let surface = self.surface.borrow();
		let (Some(c), Some(s)) = (controller.as_ref(), surface.as_ref()) else {
			return;
		};
		render::render(c, &s.ctx, s.width, s.height);
		if self.tooltip.with_untracked(|t| t != c.tooltip()) {
			self.tooltip.set(c.tooltip().clone());
		}
	}

	/// Runs one controller event, redrawing if it changed anything.
	fn dispatch(&self, at: Option<Point>, event: impl FnOnce(&mut CanvasController) -> bool) {
		let changed = match self.controller.borrow_mut().as_mut() {
			Some(c) => event(c),
			None => return,
		};
		if changed {
			self.redraw();
		}
		if let Some(p) = at {
			if let Some(c) = self.controller.borrow().as_ref() {
				self.cursor.set(c.cursor(p));
			}
		}
	}
}

fn mount(canvas: &HtmlCanvasElement, width: Option<f64>, height: f64) -> CanvasResult<Surface> {
	let width = width.unwrap_or_else(|| {
		canvas
			.parent_element()
			.map(|p| p.client_width() as f64)
			.filter(|w| *w > 0.0)
			.unwrap_or(DEFAULT_WIDTH)
	});
	canvas.set_width(width as u32);
	canvas.set_height(height as u32);
	Ok(Surface {
		ctx: context_2d(canvas)?,
		width,
		height,
	})
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Placed beside the pointer; ignores pointer events so drags pass over it.
fn tooltip_style(position: Point) -> String {
	format!(
		"position: absolute; left: {}px; top: {}px; pointer-events: none; background: white; \
		 border: 1px solid #dee2e6; border-radius: 8px; padding: 12px; max-width: 350px; \
		 box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15); z-index: 1000; font-size: 12px; line-height: 1.4;",
		position.x + 10.0,
		position.y - 10.0
	)
}

fn tooltip_view(tooltip: Tooltip) -> Option<AnyView> {
	let style = tooltip_style(tooltip.position());
	match tooltip {
		Tooltip::Hidden => None,
		Tooltip::Node { annotations, .. } => {
			let body = if annotations.is_empty() {
				view! {
					<div style="color: #adb5bd; font-style: italic;">
						"No annotations available for this file"
					</div>
				}
				.into_any()
			} else {
				view! {
					<ul style="margin: 0; padding-left: 16px; color: #495057;">
						{annotations
							.into_iter()
							.map(|a| view! { <li style="margin-bottom: 4px;">{a}</li> })
							.collect_view()}
					</ul>
				}
				.into_any()
			};
			Some(
				view! {
					<div class="canvas-tooltip" style=style>
						<div style="font-weight: 600; margin-bottom: 8px; color: #1971c2;">"File Annotations"</div>
						{body}
					</div>
				}
				.into_any(),
			)
		}
		Tooltip::Edge { analysis, .. } => Some(
			view! {
				<div class="canvas-tooltip" style=style>
					<div style="font-weight: 600; margin-bottom: 8px; color: #2f9e44;">"Dependency Analysis"</div>
					<div style="color: #495057; line-height: 1.5;">{analysis.unwrap_or_default()}</div>
				</div>
			}
			.into_any(),
		),
	}
}

/// Pannable, zoomable diagram of files and their dependency edges.
///
/// Nodes are laid out again whenever `files` or `edges` change. Press and
/// release on a node (under 5px of travel per axis) selects it and toggles
/// its annotations; anything longer drags it. Analysed edges show their
/// analysis when clicked.
#[component]
pub fn DependencyCanvas(
	#[prop(into)] files: Signal<Vec<FileEntry>>,
	#[prop(into)] edges: Signal<Vec<Edge>>,
	#[prop(into)] annotations: Signal<Annotations>,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let handle = CanvasHandle::new();
	let height = height.unwrap_or(DEFAULT_HEIGHT);

	let handle_init = handle.clone();
	Effect::new(move |_| {
		let (files, edges, annotations) = (files.get(), edges.get(), annotations.get());
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		if handle_init.surface.borrow().is_none() {
			match mount(&canvas, width, height) {
				Ok(surface) => *handle_init.surface.borrow_mut() = Some(surface),
				Err(err) => {
					error!("dependency canvas setup failed: {err}");
					return;
				}
			}
		}
		handle_init.load(files, edges, annotations);
	});

	let handle_md = handle.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some(p) = local_point(canvas_ref, &ev) {
			handle_md.dispatch(Some(p), |c| c.pointer_down(p));
		}
	};

	let handle_mm = handle.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(p) = local_point(canvas_ref, &ev) {
			handle_mm.dispatch(Some(p), |c| c.pointer_move(p));
		}
	};

	let handle_mu = handle.clone();
	let on_mouseup = move |ev: MouseEvent| {
		if let Some(p) = local_point(canvas_ref, &ev) {
			handle_mu.dispatch(Some(p), |c| c.pointer_up(p));
		}
	};

	let handle_ml = handle.clone();
	let on_mouseleave = move |_: MouseEvent| {
		handle_ml.dispatch(None, |c| c.pointer_leave());
	};

	let handle_wh = handle.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(p) = local_point(canvas_ref, &ev) {
			handle_wh.dispatch(Some(p), |c| c.wheel(p, ev.delta_y()));
		}
	};

	let (tooltip, cursor) = (handle.tooltip, handle.cursor);
	view! {
		<div style=format!("position: relative; width: 100%; height: {height}px;")>
			<canvas
				node_ref=canvas_ref
				class="dependency-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style:display="block"
				style:border="1px solid #dee2e6"
				style:border-radius="8px"
				style:cursor=move || cursor.get()
			/>
			{move || tooltip_view(tooltip.get())}
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tooltip_lets_pointer_through() {
		let style = tooltip_style(Point::new(40.0, 25.0));
		assert!(style.contains("pointer-events: none;"));
		assert!(style.contains("left: 50px; top: 15px;"));
	}
}
