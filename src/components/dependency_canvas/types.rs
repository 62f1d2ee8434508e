use std::collections::HashMap;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A 2D coordinate, either in screen space or in diagram space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

impl Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Point {
	type Output = Point;

	fn mul(self, rhs: f64) -> Point {
		Point::new(self.x * rhs, self.y * rhs)
	}
}

impl Div<f64> for Point {
	type Output = Point;

	fn div(self, rhs: f64) -> Point {
		Point::new(self.x / rhs, self.y / rhs)
	}
}

/// Centre of a node in diagram space.
pub type NodePosition = Point;

pub type NodeId = String;

pub type NodePositions = HashMap<NodeId, NodePosition>;

/// Per-file annotation lists, keyed by [`FileEntry::identifier`].
pub type Annotations = HashMap<String, Vec<String>>;

const NODE_ID_PREFIX: &str = "file-";

/// Node ids are derived from the file's position in the input list.
pub fn node_id(index: usize) -> NodeId {
	format!("{NODE_ID_PREFIX}{index}")
}

pub fn node_index(id: &str) -> Option<usize> {
	id.strip_prefix(NODE_ID_PREFIX)?.parse().ok()
}

/// Anything file-like the canvas can show: a name and, usually, a repository path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
	pub name: String,
	#[serde(default)]
	pub path: Option<String>,
}

impl FileEntry {
	pub fn new(name: impl Into<String>, path: Option<&str>) -> Self {
		Self {
			name: name.into(),
			path: path.map(str::to_owned),
		}
	}

	fn non_empty_path(&self) -> Option<&str> {
		self.path.as_deref().filter(|p| !p.is_empty())
	}

	/// Key used for annotations and relation endpoints.
	pub fn identifier(&self) -> &str {
		self.non_empty_path().unwrap_or(&self.name)
	}

	/// Last two path segments (`dir/file.ts`), or the bare name.
	pub fn display_text(&self) -> String {
		match self.non_empty_path() {
			Some(path) => {
				let parts: Vec<&str> = path.split('/').collect();
				parts[parts.len().saturating_sub(2)..].join("/")
			}
			None => self.name.clone(),
		}
	}
}

/// Render record for one file. Derived on demand, never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct FileNode {
	pub id: NodeId,
	pub display_text: String,
	pub width: f64,
	pub position: NodePosition,
}

/// Directed dependency: `from` depends on `to`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	pub id: String,
	pub from: NodeId,
	pub to: NodeId,
	pub description: String,
	#[serde(default)]
	pub analysis: Option<String>,
}

impl Edge {
	/// Only edges carrying analysis text react to clicks.
	pub fn is_clickable(&self) -> bool {
		self.analysis.is_some()
	}
}
