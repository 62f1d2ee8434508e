//! Discovers project-internal imports in JavaScript/TypeScript sources.
//!
//! Only `import … from '…'` statements are recognised. Bare and scoped
//! package imports (`react`, `@scope/pkg`) are dropped; relative imports and
//! imports rooted at a top-level project directory are resolved against the
//! repository file list.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::components::dependency_canvas::FileEntry;

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"import\s+[^;]+\s+from\s+['"]([^'"]+)['"];?"#).expect("import pattern compiles")
});

static FROM_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"from\s+['"]([^'"]+)['"]"#).expect("from pattern compiles"));

static SOURCE_EXT_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\.(ts|tsx|js|jsx)$").expect("extension pattern compiles"));

const SOURCE_EXTENSIONS: [&str; 4] = [".ts", ".tsx", ".js", ".jsx"];

/// A repository file with its text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
	pub name: String,
	pub path: String,
	#[serde(default)]
	pub content: String,
}

impl SourceFile {
	pub fn entry(&self) -> FileEntry {
		FileEntry::new(self.name.clone(), Some(&self.path))
	}
}

pub fn extract_import_statements(content: &str) -> Vec<String> {
	IMPORT_RE
		.find_iter(content)
		.map(|m| {
			let s = m.as_str();
			s.strip_suffix(';').unwrap_or(s).trim().to_owned()
		})
		.collect()
}

pub fn extract_from_paths<S: AsRef<str>>(statements: &[S]) -> Vec<String> {
	statements
		.iter()
		.filter_map(|s| FROM_RE.captures(s.as_ref()))
		.map(|c| c[1].to_owned())
		.collect()
}

fn is_relative(path: &str) -> bool {
	path.starts_with("./") || path.starts_with("../")
}

/// Keeps relative imports and imports whose first segment is a directory
/// directly under `root_folder`.
pub fn filter_relevant_imports(paths: &[String], directories: &HashSet<String>, root_folder: &str) -> Vec<String> {
	paths
		.iter()
		.filter(|path| {
			if is_relative(path) {
				return true;
			}
			if !path.contains('/') || path.starts_with('@') {
				return false;
			}
			let first = path.split('/').next().unwrap_or_default();
			directories.contains(&format!("{root_folder}/{first}"))
		})
		.cloned()
		.collect()
}

/// Collapses `.` and `..` segments and empty components.
fn normalize(path: &str) -> String {
	let mut parts: Vec<&str> = Vec::new();
	for segment in path.split('/') {
		match segment {
			"" | "." => {}
			".." => {
				parts.pop();
			}
			s => parts.push(s),
		}
	}
	parts.join("/")
}

pub fn resolve_to_full_paths(paths: &[String], file_path: &str, root_folder: &str) -> Vec<String> {
	let dir = file_path.rsplit_once('/').map(|(d, _)| d).unwrap_or_default();
	paths
		.iter()
		.map(|path| {
			let full = if is_relative(path) {
				format!("{dir}/{}", path.strip_prefix("./").unwrap_or(path))
			} else {
				format!("{root_folder}/{path}")
			};
			normalize(&full.replace('\\', "/"))
		})
		.collect()
}

/// Finds the repository file an import path refers to: exact match, then
/// added or swapped source extensions, then a directory `index` file.
pub fn find_matching_file<'a>(base: &str, repo_paths: &'a [String]) -> Option<&'a str> {
	let lookup = |candidate: &str| repo_paths.iter().find(|p| p.as_str() == candidate).map(String::as_str);

	if let Some(found) = lookup(base) {
		return Some(found);
	}
	if let Some(found) = SOURCE_EXTENSIONS.iter().find_map(|ext| lookup(&format!("{base}{ext}"))) {
		return Some(found);
	}
	let stem = SOURCE_EXT_RE.replace(base, "");
	if stem != base {
		if let Some(found) = SOURCE_EXTENSIONS.iter().find_map(|ext| lookup(&format!("{stem}{ext}"))) {
			return Some(found);
		}
	}
	SOURCE_EXTENSIONS
		.iter()
		.find_map(|ext| lookup(&format!("{base}/index{ext}")))
}

/// Every ancestor directory of every path.
pub fn directory_paths<S: AsRef<str>>(paths: &[S]) -> HashSet<String> {
	let mut dirs = HashSet::new();
	for path in paths {
		let mut current = path.as_ref();
		while let Some((parent, _)) = current.rsplit_once('/') {
			if !dirs.insert(parent.to_owned()) {
				break;
			}
			current = parent;
		}
	}
	dirs
}

/// Resolves imports against one repository snapshot.
pub struct ImportResolver {
	root_folder: String,
	repo_paths: Vec<String>,
	directories: HashSet<String>,
}

impl ImportResolver {
	pub fn new(root_folder: impl Into<String>, repo_paths: Vec<String>) -> Self {
		Self {
			root_folder: root_folder.into(),
			directories: directory_paths(&repo_paths),
			repo_paths,
		}
	}

	/// Repository paths imported by `file`, deduplicated, in source order.
	pub fn resolve(&self, file: &SourceFile) -> Vec<String> {
		let statements = extract_import_statements(&file.content);
		let from_paths = extract_from_paths(&statements);
		let relevant = filter_relevant_imports(&from_paths, &self.directories, &self.root_folder);
		let full = resolve_to_full_paths(&relevant, &file.path, &self.root_folder);

		let mut seen = HashSet::new();
		full.iter()
			.filter_map(|p| find_matching_file(p, &self.repo_paths))
			.filter(|p| *p != file.path && seen.insert(*p))
			.map(str::to_owned)
			.collect()
	}
}

/// One-shot form of [`ImportResolver::resolve`].
pub fn discover_imports(file: &SourceFile, root_folder: &str, repo_paths: &[String]) -> Vec<String> {
	ImportResolver::new(root_folder, repo_paths.to_vec()).resolve(file)
}

#[cfg(test)]
mod tests {
	use super::*;

	const MAIN_TSX: &str = r#"import { StrictMode } from "react";
import ReactDOM from "react-dom/client";
import { RouterProvider, createRouter } from "@tanstack/react-router";
import { createAppWrapper } from "src/setup.tsx";
import { test } from './test.ts';

// Import the generated route tree
import { routeTree } from "src/routeTree.gen";

const router = createRouter({ routeTree });
"#;

	fn repo() -> Vec<String> {
		[
			"ui/src/setup.tsx",
			"ui/src/routeTree.gen.ts",
			"ui/src/my-folder/main.tsx",
			"ui/src/my-folder/test.ts",
			"ui/src/utils/index.ts",
			"ui/src/utils/api.ts",
		]
		.map(String::from)
		.to_vec()
	}

	#[test]
	fn extracts_statements_and_paths() {
		let statements = extract_import_statements(MAIN_TSX);
		assert_eq!(statements.len(), 6);
		assert_eq!(statements[0], r#"import { StrictMode } from "react""#);
		assert_eq!(statements[4], "import { test } from './test.ts'");

		let paths = extract_from_paths(&statements);
		assert_eq!(
			paths,
			[
				"react",
				"react-dom/client",
				"@tanstack/react-router",
				"src/setup.tsx",
				"./test.ts",
				"src/routeTree.gen"
			]
		);
	}

	#[test]
	fn drops_packages_keeps_project_paths() {
		let paths: Vec<String> = ["react", "react-dom/client", "@tanstack/react-router", "src/setup.tsx", "./test.ts", "../up.ts", "lib/x"]
			.map(String::from)
			.to_vec();
		let dirs = directory_paths(&repo());
		let relevant = filter_relevant_imports(&paths, &dirs, "ui");
		assert_eq!(relevant, ["src/setup.tsx", "./test.ts", "../up.ts"]);
	}

	#[test]
	fn resolves_relative_and_rooted_paths() {
		let paths: Vec<String> = ["./test.ts", "../utils", "src/setup.tsx", "src\\utils\\api"].map(String::from).to_vec();
		let full = resolve_to_full_paths(&paths, "ui/src/my-folder/main.tsx", "ui");
		assert_eq!(full, ["ui/src/my-folder/test.ts", "ui/src/utils", "ui/src/setup.tsx", "ui/src/utils/api"]);
	}

	#[test]
	fn matches_extensions_and_index_files() {
		let repo = repo();
		assert_eq!(find_matching_file("ui/src/setup.tsx", &repo), Some("ui/src/setup.tsx"));
		assert_eq!(find_matching_file("ui/src/routeTree.gen", &repo), Some("ui/src/routeTree.gen.ts"));
		assert_eq!(find_matching_file("ui/src/my-folder/test.js", &repo), Some("ui/src/my-folder/test.ts"));
		assert_eq!(find_matching_file("ui/src/utils", &repo), Some("ui/src/utils/index.ts"));
		assert_eq!(find_matching_file("ui/src/missing", &repo), None);
	}

	#[test]
	fn collects_every_ancestor_directory() {
		let dirs = directory_paths(&["ui/src/a/b.ts", "ui/src/c.ts", "top.ts"]);
		let mut dirs: Vec<_> = dirs.into_iter().collect();
		dirs.sort();
		assert_eq!(dirs, ["ui", "ui/src", "ui/src/a"]);
	}

	#[test]
	fn resolver_runs_the_whole_pipeline() {
		let resolver = ImportResolver::new("ui", repo());
		let main = SourceFile {
			name: "main.tsx".into(),
			path: "ui/src/my-folder/main.tsx".into(),
			content: format!("{MAIN_TSX}\nimport {{ x }} from './test';\nimport self from './main';\n"),
		};
		assert_eq!(
			resolver.resolve(&main),
			["ui/src/setup.tsx", "ui/src/my-folder/test.ts", "ui/src/routeTree.gen.ts"]
		);
		assert_eq!(discover_imports(&main, "ui", &repo()), resolver.resolve(&main));
	}
}
