//! End-to-end checks of the public normalize and layout API.

use network_graph_canvas::graph::{
	Error, ForceSimulation, Graph, LayoutConfig, Node, Point, SimulationState, Viewport,
	normalize, normalize_str,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn ids(graph: &Graph) -> Vec<&str> {
	graph.nodes().iter().map(|n| n.id.as_str()).collect()
}

fn endpoints(graph: &Graph) -> Vec<(&str, &str)> {
	graph
		.edges()
		.iter()
		.map(|e| (e.source.as_str(), e.target.as_str()))
		.collect()
}

fn isolated(count: usize, category: &str) -> Graph {
	let mut graph = Graph::new();
	for i in 0..count {
		graph.insert_node(Node::new(format!("n{i}"), category));
	}
	graph
}

fn assert_converged_without_overlaps(graph: &Graph, viewport: Viewport, config: LayoutConfig) {
	let mut simulation = ForceSimulation::new(graph, viewport, config.clone()).unwrap();
	simulation.run(10_000);
	assert_eq!(simulation.state(), SimulationState::Converged);

	for (i, a) in graph.nodes().iter().enumerate() {
		for b in &graph.nodes()[i + 1..] {
			let (pa, pb) = (
				simulation.position(&a.id).unwrap(),
				simulation.position(&b.id).unwrap(),
			);
			let min = config.collision_radius_for(a) + config.collision_radius_for(b);
			assert!(
				pa.distance(&pb) >= min,
				"{} and {} are {} apart, need {min}",
				a.id,
				b.id,
				pa.distance(&pb)
			);
		}
	}
}

#[test]
fn positional_endpoints_resolve_to_node_ids() {
	let normalized = normalize(&json!({
		"nodes": [{ "id": "i7" }, { "id": "s3" }, { "id": "s9" }],
		"links": [
			{ "source": 0, "target": 2 },
			{ "source": 2, "target": 1 }
		]
	}))
	.unwrap();
	assert_eq!(endpoints(&normalized.graph), vec![("i7", "s9"), ("s9", "s3")]);
}

#[test]
fn named_nodes_with_weighted_link() {
	let normalized = normalize(&json!({
		"nodes": [{ "name": "A" }, { "name": "B" }],
		"links": [{ "source": 0, "target": 1, "weight": 3 }]
	}))
	.unwrap();
	let graph = &normalized.graph;
	assert_eq!(ids(graph), vec!["A", "B"]);
	assert_eq!(endpoints(graph), vec![("A", "B")]);
	assert_eq!(graph.edges()[0].weight, 3.0);
	assert_eq!(normalized.report.dropped_edges, 0);
}

#[test]
fn renormalizing_serialized_output_changes_nothing() {
	let first = normalize_str(
		r#"{"nodes":[{"id":"a","type":"instructor"},{"id":"b","group":2}],
		    "links":[{"source":"a","target":"b","weight":2}]}"#,
	)
	.unwrap();
	let serialized = serde_json::to_value(&first.graph).unwrap();
	let second = normalize(&serialized).unwrap();
	assert_eq!(second.graph, first.graph);
	assert_eq!(serde_json::to_value(&second.graph).unwrap(), serialized);
}

#[test]
fn edges_to_missing_nodes_are_counted_and_dropped() {
	let normalized = normalize(&json!({
		"nodes": [{ "id": "a" }, { "id": "b" }],
		"links": [
			{ "source": "a", "target": "b" },
			{ "source": "a", "target": "ghost" },
			{ "source": "phantom", "target": "b" },
			{ "source": 0, "target": 5 }
		]
	}))
	.unwrap();
	assert_eq!(endpoints(&normalized.graph), vec![("a", "b")]);
	assert_eq!(normalized.report.dropped_edges, 3);
}

#[test]
fn empty_graph_never_steps() {
	let normalized = normalize(&json!({ "nodes": [], "links": [] })).unwrap();
	let err = ForceSimulation::new(
		&normalized.graph,
		Viewport::new(800.0, 600.0),
		LayoutConfig::default(),
	)
	.err();
	assert!(matches!(err, Some(Error::GraphEmpty)));
}

#[test]
fn converged_isolated_nodes_do_not_overlap() {
	assert_converged_without_overlaps(
		&isolated(24, "node"),
		Viewport::new(2000.0, 2000.0),
		LayoutConfig::default(),
	);
}

#[test]
fn converged_students_do_not_overlap_on_a_small_canvas() {
	assert_converged_without_overlaps(
		&isolated(30, "student"),
		Viewport::new(800.0, 600.0),
		LayoutConfig::bipartite(),
	);
	assert_converged_without_overlaps(
		&isolated(60, "student"),
		Viewport::new(1200.0, 900.0),
		LayoutConfig::bipartite(),
	);
}

#[test]
fn converged_courses_do_not_overlap_on_a_small_canvas() {
	assert_converged_without_overlaps(
		&isolated(20, "course"),
		Viewport::new(800.0, 600.0),
		LayoutConfig::homogeneous(),
	);
}

#[test]
fn pinned_node_holds_then_moves_once_released() {
	let mut graph = isolated(6, "node");
	graph.push_edge(network_graph_canvas::graph::Edge::new("n0", "n1"));
	let mut simulation = ForceSimulation::new(
		&graph,
		Viewport::new(800.0, 600.0),
		LayoutConfig::default(),
	)
	.unwrap();

	assert_eq!(simulation.pin("n0", 50.0, 50.0).unwrap(), Point::new(50.0, 50.0));
	simulation.run(40);
	assert_eq!(simulation.position("n0"), Some(Point::new(50.0, 50.0)));

	simulation.unpin("n0").unwrap();
	simulation.run(40);
	assert_ne!(simulation.position("n0"), Some(Point::new(50.0, 50.0)));
}

#[test]
fn every_frame_stays_inside_the_viewport() {
	let normalized = normalize(&json!({
		"nodes": [
			{ "id": "i1", "category": "instructor" },
			{ "id": "c1", "category": "course" },
			{ "id": "c2", "category": "course" },
			{ "id": "s1", "category": "student", "x": -500, "y": 9000 },
			{ "id": "s2", "category": "student" },
			{ "id": "s3", "category": "student", "size": 30 }
		],
		"links": [
			{ "source": "i1", "target": "c1" },
			{ "source": "i1", "target": "c2" },
			{ "source": "s1", "target": "c1" },
			{ "source": "s2", "target": "c1" },
			{ "source": "s3", "target": "c2" }
		]
	}))
	.unwrap();
	let graph = normalized.graph;
	let config = LayoutConfig::for_graph(&graph);
	let viewport = Viewport::new(400.0, 300.0);
	let mut simulation = ForceSimulation::new(&graph, viewport, config.clone()).unwrap();

	let mut frames = 0;
	while let Some(frame) = simulation.step() {
		frames += 1;
		for position in &frame.nodes {
			let node = graph.node(&position.node_id).unwrap();
			let extent = config.extent_for(node);
			assert!(
				(extent.half_width..=viewport.width - extent.half_width).contains(&position.x),
				"{} escaped horizontally at step {}: {}",
				node.id,
				frame.step,
				position.x
			);
			assert!(
				(extent.half_height..=viewport.height - extent.half_height).contains(&position.y),
				"{} escaped vertically at step {}: {}",
				node.id,
				frame.step,
				position.y
			);
		}
	}
	assert!(frames > 0);
}
