use std::collections::HashMap;
use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use super::imports::{ImportResolver, SourceFile};
use crate::components::dependency_canvas::{Edge, FileEntry, node_id};

/// How one file relates to another.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connection {
	#[default]
	Uses,
	Tests,
	Describes,
}

impl Connection {
	pub const ALL: [Connection; 3] = [Connection::Uses, Connection::Tests, Connection::Describes];

	pub fn as_str(self) -> &'static str {
		match self {
			Connection::Uses => "uses",
			Connection::Tests => "tests",
			Connection::Describes => "describes",
		}
	}
}

/// Choices offered when editing a relation.
pub fn connection_options() -> &'static [Connection] {
	&Connection::ALL
}

impl fmt::Display for Connection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A relation between two file identifiers (path, or name when pathless).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
	pub id: String,
	pub from: String,
	pub to: String,
	pub connection: Connection,
}

#[derive(Clone, Debug)]
pub enum DependencyField {
	From(String),
	To(String),
	Connection(Connection),
}

/// Analysis text produced for one `from -> to` relation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationAnalysis {
	pub from: String,
	pub to: String,
	pub analysis: String,
}

#[derive(Clone, Debug, Default)]
pub struct RelationList {
	dependencies: Vec<Dependency>,
	next_id: usize,
}

impl RelationList {
	pub fn dependencies(&self) -> &[Dependency] {
		&self.dependencies
	}

	fn fresh_id(&mut self) -> String {
		self.next_id += 1;
		format!("dep-{}", self.next_id)
	}

	fn contains(&self, from: &str, to: &str) -> bool {
		self.dependencies.iter().any(|d| d.from == from && d.to == to)
	}

	/// Appends an empty `uses` relation for the user to fill in.
	pub fn add(&mut self) -> &Dependency {
		let id = self.fresh_id();
		self.dependencies.push(Dependency {
			id,
			from: String::new(),
			to: String::new(),
			connection: Connection::Uses,
		});
		&self.dependencies[self.dependencies.len() - 1]
	}

	pub fn update(&mut self, id: &str, field: DependencyField) -> bool {
		let Some(dep) = self.dependencies.iter_mut().find(|d| d.id == id) else {
			return false;
		};
		match field {
			DependencyField::From(from) => dep.from = from,
			DependencyField::To(to) => dep.to = to,
			DependencyField::Connection(connection) => dep.connection = connection,
		}
		true
	}

	pub fn remove(&mut self, id: &str) -> bool {
		let before = self.dependencies.len();
		self.dependencies.retain(|d| d.id != id);
		self.dependencies.len() != before
	}

	/// Adds a `uses` relation for every discovered import that is not
	/// already listed. Returns how many were added.
	pub fn generate(&mut self, files: &[SourceFile], resolver: &ImportResolver) -> usize {
		let mut added = 0;
		for file in files {
			for imported in resolver.resolve(file) {
				if self.contains(&file.path, &imported) {
					continue;
				}
				let id = self.fresh_id();
				self.dependencies.push(Dependency {
					id,
					from: file.path.clone(),
					to: imported,
					connection: Connection::Uses,
				});
				added += 1;
			}
		}
		if added > 0 {
			info!("Generated {added} dependencies from file relationships");
		} else {
			info!("No dependencies found in file relationships");
		}
		added
	}

	/// Canvas edges for every relation whose endpoints are both in `files`,
	/// carrying any matching analysis.
	pub fn to_edges(&self, files: &[FileEntry], analyses: &[RelationAnalysis]) -> Vec<Edge> {
		let node_of: HashMap<&str, String> = files
			.iter()
			.enumerate()
			.map(|(i, f)| (f.identifier(), node_id(i)))
			.collect();
		let analysis_of: HashMap<(&str, &str), &str> = analyses
			.iter()
			.map(|a| ((a.from.as_str(), a.to.as_str()), a.analysis.as_str()))
			.collect();

		self.dependencies
			.iter()
			.filter_map(|dep| {
				let from = node_of.get(dep.from.as_str())?;
				let to = node_of.get(dep.to.as_str())?;
				Some(Edge {
					id: dep.id.clone(),
					from: from.clone(),
					to: to.clone(),
					description: dep.connection.to_string(),
					analysis: analysis_of
						.get(&(dep.from.as_str(), dep.to.as_str()))
						.map(|s| (*s).to_owned()),
				})
			})
			.collect()
	}
}
