//! Interactive dependency diagram: layout, gesture state machine and the
//! canvas component that drives them.

mod component;
pub mod controller;
pub mod geometry;
mod measure;
mod render;
pub mod state;
pub mod types;

pub use component::DependencyCanvas;
pub use types::{Annotations, Edge, FileEntry, node_id};
