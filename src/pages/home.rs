use leptos::prelude::*;

use crate::components::network_graph::{LoadStatus, NetworkGraphCanvas};
use crate::graph::LayoutConfig;

const STUDENT_INSTRUCTOR_NETWORK: &str = "/network/api/student-instructor-network/";

fn metrics(status: &LoadStatus) -> Vec<String> {
	let LoadStatus::Ready {
		summary,
		dropped_edges,
	} = status
	else {
		return Vec::new();
	};
	let mut lines = vec![format!(
		"{} nodes, {} connections",
		summary.node_count, summary.edge_count
	)];
	for (category, stats) in &summary.categories {
		lines.push(format!(
			"{category}: {} (avg. {:.1} connections)",
			stats.count, stats.avg_degree
		));
	}
	if *dropped_edges > 0 {
		lines.push(format!("{dropped_edges} connections skipped"));
	}
	lines
}

/// A full-screen network with a title, live metrics and a refresh button.
#[component]
pub fn NetworkPage(
	#[prop(into)] title: String,
	#[prop(into)] endpoint: String,
	config: LayoutConfig,
) -> impl IntoView {
	let refresh = RwSignal::new(0u32);
	let status = RwSignal::new(LoadStatus::Loading);

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

			<div class="fullscreen-graph">
				<NetworkGraphCanvas
					endpoint=endpoint
					config=config
					refresh=refresh
					status=status
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>{title}</h1>
					<p class="subtitle">"Drag nodes to reposition. Scroll to zoom. Drag background to pan."</p>
					<ul class="graph-metrics">
						{move || {
							metrics(&status.get())
								.into_iter()
								.map(|line| view! { <li>{line}</li> })
								.collect_view()
						}}
					</ul>
					<button on:click=move |_| refresh.update(|n| *n += 1)>"Refresh"</button>
				</div>
			</div>
		</ErrorBoundary>
	}
}

/// Default Home Page: the student and instructor network
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<NetworkPage
			title="Student & Instructor Network"
			endpoint=STUDENT_INSTRUCTOR_NETWORK
			config=LayoutConfig::bipartite()
		/>
	}
}
