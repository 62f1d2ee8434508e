//! Node sizing and the two diagram layouts (width-aware grid, dependency tree).
//!
//! Everything here is pure: identical inputs always produce identical
//! positions, and widths are floored at [`MIN_NODE_WIDTH`] so no spacing
//! computation can divide by zero or yield NaN.

use std::collections::{HashMap, VecDeque};

use super::types::{Edge, FileEntry, FileNode, NodePosition, NodePositions, Point, node_id};

pub const MIN_NODE_WIDTH: f64 = 10.0;
pub const MAX_NODE_WIDTH: f64 = 500.0;
pub const NODE_HEIGHT: f64 = 60.0;
/// Horizontal text padding, applied on both sides.
pub const NODE_PADDING: f64 = 32.0;
pub const NODE_FONT_SIZE: f64 = 12.0;

pub const GRID_SPACING: f64 = 200.0;
pub const GRID_GAP: f64 = 40.0;
pub const GRID_ROW_GAP: f64 = 80.0;
/// Top and left offset shared by both layouts.
pub const LAYOUT_OFFSET: f64 = 60.0;

pub const TREE_LEVEL_HEIGHT: f64 = 150.0;
pub const TREE_NODE_SPACING: f64 = 50.0;
pub const ROOT_CANDIDATE_RATIO: f64 = 0.1;

/// Edge hit tolerance, in diagram units.
pub const EDGE_HIT_TOLERANCE: f64 = 6.0;

const EDGE_COLORS: &[&str] = &[
	"#e74c3c", "#3498db", "#2ecc71", "#f39c12", "#9b59b6", "#1abc9c", "#e67e22", "#34495e",
	"#e91e63", "#00bcd4", "#4caf50", "#ff9800", "#673ab7", "#795548", "#607d8b",
];

/// Font metrics source. `None` means no measurement surface was available.
pub trait TextMeasure {
	fn measure(&self, text: &str, font_size: f64) -> Option<f64>;
}

impl<F> TextMeasure for F
where
	F: Fn(&str, f64) -> Option<f64>,
{
	fn measure(&self, text: &str, font_size: f64) -> Option<f64> {
		self(text, font_size)
	}
}

pub fn calculate_text_width(measure: &dyn TextMeasure, text: &str, font_size: f64) -> f64 {
	match measure.measure(text, font_size) {
		Some(w) if w.is_finite() => (w + NODE_PADDING * 2.0).clamp(MIN_NODE_WIDTH, MAX_NODE_WIDTH),
		_ => MIN_NODE_WIDTH,
	}
}

pub fn node_widths(files: &[FileEntry], measure: &dyn TextMeasure) -> Vec<f64> {
	files
		.iter()
		.map(|f| calculate_text_width(measure, &f.display_text(), NODE_FONT_SIZE))
		.collect()
}

fn width_at(node_widths: &[f64], index: usize) -> f64 {
	node_widths
		.get(index)
		.copied()
		.filter(|w| w.is_finite() && *w > 0.0)
		.unwrap_or(MIN_NODE_WIDTH)
}

/// Grid fallback: `ceil(sqrt(n))` nodes per row, packed by actual width.
pub fn calculate_initial_position(
	index: usize,
	total_files: usize,
	node_widths: &[f64],
) -> NodePosition {
	let per_row = ((total_files as f64).sqrt().ceil() as usize).max(1);
	let (row, col) = (index / per_row, index % per_row);
	let row_start = row * per_row;

	let x = if node_widths.is_empty() {
		let row_end = (row_start + per_row).min(total_files);
		let max_width = (row_start..row_end)
			.map(|i| width_at(node_widths, i))
			.fold(MIN_NODE_WIDTH, f64::max);
		let pitch = GRID_SPACING.max(max_width + LAYOUT_OFFSET);
		col as f64 * pitch + MIN_NODE_WIDTH / 2.0
	} else {
		let preceding: f64 = (row_start..row_start + col)
			.map(|i| width_at(node_widths, i) + GRID_GAP)
			.sum();
		preceding + width_at(node_widths, index) / 2.0 + LAYOUT_OFFSET
	};

	Point::new(
		x,
		row as f64 * (NODE_HEIGHT + GRID_ROW_GAP) + NODE_HEIGHT / 2.0 + LAYOUT_OFFSET,
	)
}

fn push_unique(set: &mut Vec<usize>, value: usize) {
	if !set.contains(&value) {
		set.push(value);
	}
}

/// Breadth-first "level" layout over the dependency graph.
///
/// Roots are the nodes with the most dependents; each node's dependents sit
/// one level below it. Nodes the search never reaches share one trailing
/// level. Edges naming unknown nodes are ignored.
pub fn calculate_tree_layout(files: &[FileEntry], edges: &[Edge], node_widths: &[f64]) -> NodePositions {
	let n = files.len();
	if n == 0 {
		return NodePositions::new();
	}

	let ids: Vec<String> = (0..n).map(node_id).collect();
	let index_of: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();

	// from -> {to} and to -> {from}, insertion ordered
	let mut dependencies: Vec<Vec<usize>> = vec![Vec::new(); n];
	let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
	for edge in edges {
		if let (Some(&from), Some(&to)) = (index_of.get(edge.from.as_str()), index_of.get(edge.to.as_str())) {
			push_unique(&mut dependencies[from], to);
			push_unique(&mut dependents[to], from);
		}
	}

	let mut ranked: Vec<usize> = (0..n).collect();
	ranked.sort_by(|&a, &b| {
		dependents[b]
			.len()
			.cmp(&dependents[a].len())
			.then(dependencies[a].len().cmp(&dependencies[b].len()))
	});
	let root_count = ((n as f64 * ROOT_CANDIDATE_RATIO).ceil() as usize).max(1);

	let mut levels: Vec<Vec<usize>> = Vec::new();
	let mut visited = vec![false; n];
	let mut queue: VecDeque<(usize, usize)> = ranked[..root_count].iter().map(|&i| (i, 0)).collect();

	while let Some((node, level)) = queue.pop_front() {
		if visited[node] {
			continue;
		}
		visited[node] = true;
		if levels.len() <= level {
			levels.resize_with(level + 1, Vec::new);
		}
		levels[level].push(node);
		for &dependent in &dependents[node] {
			if !visited[dependent] {
				queue.push_back((dependent, level + 1));
			}
		}
	}

	let unreached: Vec<usize> = (0..n).filter(|&i| !visited[i]).collect();
	if !unreached.is_empty() {
		levels.push(unreached);
	}

	let mut positions = NodePositions::with_capacity(n);
	for (level, nodes) in levels.iter().enumerate() {
		let y = level as f64 * TREE_LEVEL_HEIGHT + NODE_HEIGHT / 2.0 + LAYOUT_OFFSET;
		let total: f64 = nodes
			.iter()
			.map(|&i| width_at(node_widths, i) + TREE_NODE_SPACING)
			.sum::<f64>()
			- TREE_NODE_SPACING;

		let mut x = -total / 2.0;
		for &i in nodes {
			let width = width_at(node_widths, i);
			x += width / 2.0;
			positions.insert(ids[i].clone(), Point::new(x, y));
			x += width / 2.0 + TREE_NODE_SPACING;
		}
	}
	positions
}

/// Tree layout when any edges exist, otherwise the grid for every file.
pub fn layout_positions(files: &[FileEntry], edges: &[Edge], node_widths: &[f64]) -> NodePositions {
	if !edges.is_empty() {
		return calculate_tree_layout(files, edges, node_widths);
	}
	(0..files.len())
		.map(|i| (node_id(i), calculate_initial_position(i, files.len(), node_widths)))
		.collect()
}

/// Builds render records from the authoritative positions, computing the
/// layout only for nodes that have no stored position yet.
pub fn derive_file_nodes(
	files: &[FileEntry],
	edges: &[Edge],
	node_widths: &[f64],
	positions: &NodePositions,
) -> Vec<FileNode> {
	let mut fallback: Option<NodePositions> = None;
	files
		.iter()
		.enumerate()
		.map(|(i, file)| {
			let id = node_id(i);
			let position = match positions.get(&id) {
				Some(p) => *p,
				None => fallback
					.get_or_insert_with(|| layout_positions(files, edges, node_widths))
					.get(&id)
					.copied()
					.unwrap_or_else(|| calculate_initial_position(i, files.len(), node_widths)),
			};
			FileNode {
				display_text: file.display_text(),
				width: width_at(node_widths, i),
				position,
				id,
			}
		})
		.collect()
}

impl FileNode {
	pub fn contains(&self, p: Point) -> bool {
		(p.x - self.position.x).abs() <= self.width / 2.0 && (p.y - self.position.y).abs() <= NODE_HEIGHT / 2.0
	}
}

/// Where a ray leaving `center` along `dir` crosses the `width` x `height` box.
fn rect_intersection(center: Point, width: f64, height: f64, dir: Point) -> Point {
	let (hw, hh) = (width / 2.0, height / 2.0);
	let mut candidates = Vec::with_capacity(4);
	if dir.y != 0.0 {
		candidates.extend([-hh / dir.y, hh / dir.y]);
	}
	if dir.x != 0.0 {
		candidates.extend([-hw / dir.x, hw / dir.x]);
	}
	match candidates.into_iter().filter(|t| *t > 0.0).reduce(f64::min) {
		Some(t) => center + dir * t,
		None => center,
	}
}

/// Line endpoints on the borders of the two node rectangles.
pub fn edge_endpoints(from: &FileNode, to: &FileNode) -> (Point, Point) {
	let delta = to.position - from.position;
	let distance = delta.x.hypot(delta.y);
	if distance == 0.0 {
		return (from.position, to.position);
	}
	let dir = delta / distance;
	(
		rect_intersection(from.position, from.width, NODE_HEIGHT, dir),
		rect_intersection(to.position, to.width, NODE_HEIGHT, dir * -1.0),
	)
}

pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
	let ab = b - a;
	let len_sq = ab.x * ab.x + ab.y * ab.y;
	let t = if len_sq == 0.0 {
		0.0
	} else {
		(((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0)
	};
	let closest = a + ab * t;
	(p.x - closest.x).hypot(p.y - closest.y)
}

/// Stable per-node colour; the same id always maps to the same palette entry.
pub fn node_color(id: &str) -> &'static str {
	let hash = id
		.encode_utf16()
		.fold(0i32, |h, c| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(c as i32));
	EDGE_COLORS[hash.unsigned_abs() as usize % EDGE_COLORS.len()]
}

#[cfg(test)]
mod tests {
	use super::*;

	fn files(n: usize) -> Vec<FileEntry> {
		(0..n)
			.map(|i| FileEntry::new(format!("f{i}.ts"), Some(&format!("src/f{i}.ts"))))
			.collect()
	}

	fn edge(from: usize, to: usize) -> Edge {
		Edge {
			id: format!("e{from}-{to}"),
			from: node_id(from),
			to: node_id(to),
			description: "uses".into(),
			analysis: None,
		}
	}

	#[test]
	fn text_width_adds_padding_and_clamps() {
		let fixed = |_: &str, _: f64| Some(100.0);
		assert_eq!(calculate_text_width(&fixed, "abc", 12.0), 164.0);

		let huge = |_: &str, _: f64| Some(10_000.0);
		assert_eq!(calculate_text_width(&huge, "abc", 12.0), MAX_NODE_WIDTH);

		let unavailable = |_: &str, _: f64| None;
		assert_eq!(calculate_text_width(&unavailable, "abc", 12.0), MIN_NODE_WIDTH);
	}

	#[test]
	fn text_width_uses_display_text() {
		let per_char = |text: &str, _: f64| Some(text.len() as f64);
		let widths = node_widths(&[FileEntry::new("main.tsx", Some("ui/src/main.tsx"))], &per_char);
		assert_eq!(widths, vec!["src/main.tsx".len() as f64 + 64.0]);
	}

	#[test]
	fn grid_packs_rows_by_width() {
		// 4 files -> 2 per row
		let widths = [100.0, 50.0, 80.0, 20.0];
		let first = calculate_initial_position(0, 4, &widths);
		let second = calculate_initial_position(1, 4, &widths);
		let third = calculate_initial_position(2, 4, &widths);

		assert_eq!(first, Point::new(50.0 + 60.0, 90.0));
		assert_eq!(second, Point::new(100.0 + 40.0 + 25.0 + 60.0, 90.0));
		assert_eq!(third, Point::new(40.0 + 60.0, 90.0 + 140.0));
	}

	#[test]
	fn grid_without_widths_uses_fixed_pitch() {
		let p = calculate_initial_position(1, 4, &[]);
		assert_eq!(p, Point::new(GRID_SPACING + MIN_NODE_WIDTH / 2.0, 90.0));
	}

	#[test]
	fn grid_tolerates_zero_files() {
		let p = calculate_initial_position(0, 0, &[]);
		assert!(p.x.is_finite() && p.y.is_finite());
	}

	#[test]
	fn tree_puts_dependency_above_consumer_and_isolates_trailing() {
		let widths = [100.0, 100.0, 100.0];
		let positions = calculate_tree_layout(&files(3), &[edge(0, 1)], &widths);

		let (p0, p1, p2) = (positions["file-0"], positions["file-1"], positions["file-2"]);
		assert!(p1.y < p0.y);
		assert!(p0.y < p2.y);
		assert_eq!(p1.y, NODE_HEIGHT / 2.0 + LAYOUT_OFFSET);
		assert_eq!(p2.y, 2.0 * TREE_LEVEL_HEIGHT + NODE_HEIGHT / 2.0 + LAYOUT_OFFSET);
		// lone nodes are centred
		assert_eq!(p1.x, 0.0);
		assert_eq!(p2.x, 0.0);
	}

	#[test]
	fn tree_centres_each_level() {
		// 1 and 2 both depend on 0
		let widths = [100.0, 100.0, 60.0];
		let positions = calculate_tree_layout(&files(3), &[edge(1, 0), edge(2, 0)], &widths);

		let (p1, p2) = (positions["file-1"], positions["file-2"]);
		assert_eq!(p1.y, p2.y);
		// total = 100 + 50 + 60 = 210
		assert_eq!(p1.x, -105.0 + 50.0);
		assert_eq!(p2.x, -105.0 + 100.0 + 50.0 + 30.0);
	}

	#[test]
	fn tree_survives_cycles_and_dangling_edges() {
		let mut edges = vec![edge(0, 1), edge(1, 2), edge(2, 0)];
		edges.push(Edge {
			id: "ghost".into(),
			from: "file-9".into(),
			to: "file-0".into(),
			..Default::default()
		});
		let positions = calculate_tree_layout(&files(3), &edges, &[80.0; 3]);
		assert_eq!(positions.len(), 3);
		assert!(positions.values().all(|p| p.x.is_finite() && p.y.is_finite()));
		assert!(!positions.contains_key("file-9"));
	}

	#[test]
	fn tree_is_empty_for_no_files() {
		assert!(calculate_tree_layout(&[], &[edge(0, 1)], &[]).is_empty());
	}

	#[test]
	fn tree_is_deterministic() {
		let edges = [edge(0, 1), edge(2, 1), edge(3, 2), edge(4, 0)];
		let a = calculate_tree_layout(&files(6), &edges, &[90.0; 6]);
		let b = calculate_tree_layout(&files(6), &edges, &[90.0; 6]);
		assert_eq!(a, b);
	}

	#[test]
	fn layout_falls_back_to_grid_without_edges() {
		let widths = [100.0, 100.0];
		let positions = layout_positions(&files(2), &[], &widths);
		assert_eq!(positions["file-1"], calculate_initial_position(1, 2, &widths));
	}

	#[test]
	fn derived_nodes_prefer_stored_positions() {
		let widths = [100.0, 100.0];
		let mut stored = NodePositions::new();
		stored.insert(node_id(0), Point::new(-5.0, -5.0));

		let nodes = derive_file_nodes(&files(2), &[], &widths, &stored);
		assert_eq!(nodes[0].position, Point::new(-5.0, -5.0));
		assert_eq!(nodes[1].position, calculate_initial_position(1, 2, &widths));
		assert_eq!(nodes[1].display_text, "src/f1.ts");
	}

	#[test]
	fn edge_endpoints_sit_on_rectangle_borders() {
		let a = FileNode {
			id: node_id(0),
			display_text: String::new(),
			width: 100.0,
			position: Point::new(0.0, 0.0),
		};
		let b = FileNode {
			position: Point::new(300.0, 0.0),
			id: node_id(1),
			..a.clone()
		};
		let (start, end) = edge_endpoints(&a, &b);
		assert_eq!(start, Point::new(50.0, 0.0));
		assert_eq!(end, Point::new(250.0, 0.0));

		let below = FileNode {
			position: Point::new(0.0, 200.0),
			..b.clone()
		};
		let (start, end) = edge_endpoints(&a, &below);
		assert_eq!(start, Point::new(0.0, 30.0));
		assert_eq!(end, Point::new(0.0, 170.0));

		let (start, end) = edge_endpoints(&a, &a);
		assert_eq!((start, end), (a.position, a.position));
	}

	#[test]
	fn segment_distance() {
		let (a, b) = (Point::new(0.0, 0.0), Point::new(10.0, 0.0));
		assert_eq!(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
		assert_eq!(distance_to_segment(Point::new(-4.0, 3.0), a, b), 5.0);
		assert_eq!(distance_to_segment(Point::new(3.0, 4.0), a, a), 5.0);
	}

	#[test]
	fn node_color_is_stable() {
		assert_eq!(node_color("file-0"), node_color("file-0"));
		assert!(EDGE_COLORS.contains(&node_color("file-12")));
		assert_eq!(node_color(""), EDGE_COLORS[0]);
	}
}
