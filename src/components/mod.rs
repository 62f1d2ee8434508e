pub mod dependency_canvas;
