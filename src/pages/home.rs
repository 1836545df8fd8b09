use leptos::prelude::*;

use crate::components::flowchart::Flowchart;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="flowchart-page">
				<h1 class="flowchart-title">"Simple Flowchart Designer"</h1>
				<p class="subtitle">
					"Drag from a node's bottom handle to connect. Delete removes the selection. Ctrl+Z undoes."
				</p>
				<Flowchart />
			</div>
		</ErrorBoundary>
	}
}
