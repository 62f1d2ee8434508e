//! Leptos client-side app wiring and routes for the dependency canvas.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

pub mod components;
pub mod dependencies;
pub mod error;
mod pages;

use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Browser console logger plus panic messages in the console. Call once.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("dependency canvas starting");
}

/// Routes `/` to the dependency canvas page, everything else to the 404 page.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		<Title text="Dependency Canvas" />

		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
			</Routes>
		</Router>
	}
}
