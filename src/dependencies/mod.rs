//! File-to-file relations: import discovery and the editable relation list
//! that feeds the canvas.

pub mod imports;
pub mod relations;

pub use imports::{ImportResolver, SourceFile, discover_imports};
pub use relations::{
	Connection, Dependency, DependencyField, RelationAnalysis, RelationList, connection_options,
};
