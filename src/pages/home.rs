use std::collections::HashSet;

use leptos::prelude::*;
use log::{error, info};
use serde::Deserialize;

use crate::components::dependency_canvas::{Annotations, DependencyCanvas, FileEntry};
use crate::dependencies::{
	Dependency, DependencyField, ImportResolver, RelationAnalysis, RelationList, SourceFile,
	connection_options,
};
use crate::error::DemoError;

const DEMO_PROJECT: &str = include_str!("../../assets/demo_project.json");

/// Sample repository bundled with the app.
#[derive(Debug, Deserialize)]
struct DemoProject {
	root_folder: String,
	files: Vec<SourceFile>,
	#[serde(default)]
	annotations: Annotations,
	#[serde(default)]
	analyses: Vec<RelationAnalysis>,
}

impl DemoProject {
	fn parse(json: &str) -> Result<Self, DemoError> {
		let project: Self = serde_json::from_str(json)?;
		let known: HashSet<&str> = project.files.iter().map(|f| f.path.as_str()).collect();
		if let Some(unknown) = project
			.analyses
			.iter()
			.flat_map(|a| [&a.from, &a.to])
			.find(|p| !known.contains(p.as_str()))
		{
			return Err(DemoError::UnknownFile(unknown.clone()));
		}
		Ok(project)
	}
}

fn path_select(
	relations: RwSignal<RelationList>,
	id: String,
	selected: String,
	paths: StoredValue<Vec<String>>,
	field: fn(String) -> DependencyField,
) -> impl IntoView {
	let options = paths
		.get_value()
		.into_iter()
		.map(|path| {
			let is_selected = path == selected;
			let value = path.clone();
			view! { <option value=value selected=is_selected>{path}</option> }
		})
		.collect_view();
	let none_selected = selected.is_empty();
	view! {
		<select on:change=move |ev| {
			let value = event_target_value(&ev);
			relations.update(|r| {
				r.update(&id, field(value));
			});
		}>
			<option value="" selected=none_selected>"Select file"</option>
			{options}
		</select>
	}
}

fn relation_row(relations: RwSignal<RelationList>, dep: Dependency, paths: StoredValue<Vec<String>>) -> impl IntoView {
	let Dependency { id, from, to, connection } = dep;
	let (connection_id, remove_id) = (id.clone(), id.clone());
	let kinds = connection_options()
		.iter()
		.map(|kind| {
			let (label, is_selected) = (kind.as_str(), *kind == connection);
			view! { <option value=label selected=is_selected>{label}</option> }
		})
		.collect_view();

	view! {
		<li class="relation">
			{path_select(relations, id.clone(), from, paths, DependencyField::From)}
			<select on:change=move |ev| {
				let value = event_target_value(&ev);
				if let Some(kind) = connection_options().iter().copied().find(|k| k.as_str() == value) {
					relations.update(|r| {
						r.update(&connection_id, DependencyField::Connection(kind));
					});
				}
			}>{kinds}</select>
			{path_select(relations, id, to, paths, DependencyField::To)}
			<button on:click=move |_| {
				relations.update(|r| {
					r.remove(&remove_id);
				});
			}>"Remove"</button>
		</li>
	}
}

/// Editable list of file relations. Every change re-lays out the canvas.
#[component]
fn RelationEditor(
	relations: RwSignal<RelationList>,
	paths: Vec<String>,
	on_generate: Callback<()>,
) -> impl IntoView {
	let paths = StoredValue::new(paths);
	view! {
		<section class="relation-editor">
			<h2>"Relations"</h2>
			<ul>
				<For
					each=move || relations.with(|r| r.dependencies().to_vec())
					key=|dep: &Dependency| dep.clone()
					children=move |dep| relation_row(relations, dep, paths)
				/>
			</ul>
			<button on:click=move |_| {
				relations.update(|r| {
					r.add();
				});
			}>"Add relation"</button>
			<button on:click=move |_| on_generate.run(())>"Generate from imports"</button>
		</section>
	}
}

#[component]
fn ProjectCanvas(project: DemoProject) -> impl IntoView {
	let DemoProject {
		root_folder,
		files,
		annotations,
		analyses,
	} = project;
	info!("demo project {root_folder:?}: {} files", files.len());

	let paths: Vec<String> = files.iter().map(|f| f.path.clone()).collect();
	let resolver = ImportResolver::new(root_folder, paths.clone());
	let mut initial = RelationList::default();
	initial.generate(&files, &resolver);

	let entries: Vec<FileEntry> = files.iter().map(SourceFile::entry).collect();
	let relations = RwSignal::new(initial);
	let sources = StoredValue::new((files, resolver));
	let analyses = StoredValue::new(analyses);

	let edge_entries = entries.clone();
	let edges = Signal::derive(move || {
		relations.with(|r| analyses.with_value(|a| r.to_edges(&edge_entries, a)))
	});
	let files = Signal::derive(move || entries.clone());
	let annotations = Signal::derive(move || annotations.clone());

	let on_generate = Callback::new(move |()| {
		sources.with_value(|(files, resolver)| {
			relations.update(|r| {
				r.generate(files, resolver);
			});
		});
	});

	view! {
		<DependencyCanvas files=files edges=edges annotations=annotations />
		<RelationEditor relations=relations paths=paths on_generate=on_generate />
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let body = match DemoProject::parse(DEMO_PROJECT) {
		Ok(project) => view! { <ProjectCanvas project=project /> }.into_any(),
		Err(err) => {
			error!("failed to load demo project: {err}");
			view! { <p class="load-error">{format!("Could not load the demo project: {err}")}</p> }.into_any()
		}
	};

	view! {
		<div class="project">
			<header class="project-header">
				<h1>"Dependency Canvas"</h1>
				<p class="subtitle">
					"Click a file for its annotations and a solid edge for its analysis. Drag to move, scroll to zoom."
				</p>
			</header>
			{body}
		</div>
	}
}
