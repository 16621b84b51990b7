//! Conversion of loosely shaped network payloads into a canonical [`Graph`].
//!
//! Endpoints seen in the wild come as positional indices, embedded node objects or plain
//! identifiers. Each one is classified into an [`EndpointRef`] first and resolved after,
//! so there is exactly one place deciding what a value means.

use log::{debug, warn};
use serde_json::Value;

use super::error::{Error, Result};
use super::types::{Edge, Graph, Node, Point};

const DEFAULT_CATEGORY: &str = "node";

/// How an edge endpoint was written in the payload.
#[derive(Clone, Debug, PartialEq)]
pub enum EndpointRef<'a> {
	/// Position in the payload's node collection. `0` is a valid index.
	Index(usize),
	/// A node identifier.
	Identifier(&'a str),
	/// A node object embedded in the edge; carries the identifier it names, if any.
	Embedded(Option<String>),
	/// Anything else; the edge is dropped.
	Invalid,
}

impl<'a> EndpointRef<'a> {
	/// Decides what kind of reference `value` is without looking at any node.
	pub fn classify(value: &'a Value) -> Self {
		match value {
			Value::Number(n) => match n.as_u64() {
				Some(i) => usize::try_from(i).map_or(Self::Invalid, Self::Index),
				None => match n.as_f64() {
					Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 => {
						Self::Index(f as usize)
					}
					_ => Self::Invalid,
				},
			},
			Value::String(s) => Self::Identifier(s),
			Value::Object(map) => Self::Embedded(
				map.get("id")
					.and_then(identifier)
					.or_else(|| map.get("name").and_then(identifier)),
			),
			_ => Self::Invalid,
		}
	}

	/// Resolves against the payload's node ids (by input position) and the graph built
	/// from them.
	fn resolve(self, input_ids: &[String], graph: &Graph) -> Option<String> {
		let id = match self {
			Self::Index(i) => input_ids.get(i)?.clone(),
			Self::Identifier(s) => s.to_owned(),
			Self::Embedded(id) => id?,
			Self::Invalid => return None,
		};
		graph.contains(&id).then_some(id)
	}
}

/// Non-fatal findings of a normalization pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizeReport {
	/// Edges whose endpoints did not resolve to a node.
	pub dropped_edges: usize,
	/// Nodes skipped because an earlier node had the same id.
	pub duplicate_nodes: usize,
}

/// A canonical graph and what it took to build it.
#[derive(Clone, Debug, PartialEq)]
pub struct Normalized {
	/// The graph.
	pub graph: Graph,
	/// Non-fatal findings.
	pub report: NormalizeReport,
}

/// [`normalize`] for a payload that has not been parsed yet.
pub fn normalize_str(payload: &str) -> Result<Normalized> {
	let value: Value = serde_json::from_str(payload)?;
	normalize(&value)
}

/// Builds the canonical graph for `payload`. The payload is only read.
///
/// Edges come from `edges`, or from `links` when `edges` is absent. A node without an
/// identifier or a name fails the whole pass; edges that do not resolve are dropped and
/// counted.
pub fn normalize(payload: &Value) -> Result<Normalized> {
	let Value::Object(root) = payload else {
		return Err(Error::Payload(serde::de::Error::custom(
			"network payload must be a JSON object",
		)));
	};

	let raw_nodes = collection(root.get("nodes"), "nodes")?;
	let raw_edges = match root.get("edges").filter(|v| !v.is_null()) {
		Some(edges) => collection(Some(edges), "edges")?,
		None => collection(root.get("links"), "links")?,
	};

	let mut graph = Graph::new();
	let mut report = NormalizeReport::default();
	let mut input_ids = Vec::with_capacity(raw_nodes.len());

	for (index, raw) in raw_nodes.iter().enumerate() {
		let node = node_from(raw, index)?;
		input_ids.push(node.id.clone());
		let id = node.id.clone();
		if !graph.insert_node(node) {
			warn!("duplicate node id `{id}` at position {index}, keeping the first");
			report.duplicate_nodes += 1;
		}
	}

	for (index, raw) in raw_edges.iter().enumerate() {
		let endpoint = |key: &str| {
			EndpointRef::classify(raw.get(key).unwrap_or(&Value::Null))
		};
		let (source, target) = (endpoint("source"), endpoint("target"));
		let resolved = (
			source.clone().resolve(&input_ids, &graph),
			target.clone().resolve(&input_ids, &graph),
		);
		let (Some(source_id), Some(target_id)) = resolved else {
			debug!("edge {index} dropped: source {source:?}, target {target:?}");
			report.dropped_edges += 1;
			continue;
		};
		let weight = raw
			.get("weight")
			.and_then(Value::as_f64)
			.filter(|w| w.is_finite() && *w >= 0.0)
			.unwrap_or(1.0);
		graph.push_edge(Edge {
			source: source_id,
			target: target_id,
			weight,
		});
	}

	if report.dropped_edges > 0 {
		warn!(
			"dropped {} edge(s) with unresolved endpoints",
			report.dropped_edges
		);
	}
	Ok(Normalized { graph, report })
}

fn collection<'a>(value: Option<&'a Value>, field: &str) -> Result<&'a [Value]> {
	match value {
		None | Some(Value::Null) => Ok(&[]),
		Some(Value::Array(items)) => Ok(items),
		Some(_) => Err(Error::Payload(serde::de::Error::custom(format!(
			"`{field}` must be an array"
		)))),
	}
}

fn node_from(raw: &Value, index: usize) -> Result<Node> {
	let field = |key: &str| raw.get(key).and_then(identifier);
	let id = field("id")
		.or_else(|| field("name"))
		.or_else(|| field("label"))
		.ok_or(Error::MissingIdentifier { index })?;
	let label = field("label")
		.or_else(|| field("name"))
		.unwrap_or_else(|| id.clone());
	let number = |key: &str| raw.get(key).and_then(Value::as_f64).filter(|v| v.is_finite());
	let point = |x: &str, y: &str| Some(Point::new(number(x)?, number(y)?));

	Ok(Node {
		category: category_of(raw),
		size: number("size").or_else(|| number("weight")),
		position: point("x", "y"),
		pin: point("fx", "fy"),
		id,
		label,
	})
}

fn category_of(raw: &Value) -> String {
	let text = |key: &str| {
		raw.get(key)
			.and_then(Value::as_str)
			.filter(|s| !s.is_empty())
			.map(str::to_owned)
	};
	if let Some(category) = text("category").or_else(|| text("type")) {
		return category;
	}
	match raw.get("group") {
		Some(Value::Number(n)) => match n.as_f64().filter(|g| g.fract() == 0.0) {
			Some(g) if g == 1.0 => "instructor".to_owned(),
			Some(g) if g == 2.0 => "student".to_owned(),
			Some(g) => format!("group-{g}"),
			None => format!("group-{n}"),
		},
		Some(Value::String(s)) if !s.is_empty() => s.clone(),
		_ => DEFAULT_CATEGORY.to_owned(),
	}
}

/// Strings and numbers both name a node; `0` is as good an id as any.
fn identifier(value: &Value) -> Option<String> {
	match value {
		Value::String(s) if !s.is_empty() => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	#[test]
	fn links_with_indices_resolve_to_node_names() {
		let payload = json!({
			"nodes": [{"name": "A"}, {"name": "B"}],
			"links": [{"source": 0, "target": 1, "weight": 3}]
		});
		let Normalized { graph, report } = normalize(&payload).unwrap();

		let ids: Vec<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, vec!["A", "B"]);
		assert_eq!(
			graph.edges(),
			&[Edge {
				source: "A".into(),
				target: "B".into(),
				weight: 3.0
			}]
		);
		assert_eq!(report, NormalizeReport::default());
	}

	#[test]
	fn edges_take_precedence_over_links() {
		let payload = json!({
			"nodes": [{"id": "a"}, {"id": "b"}],
			"edges": [{"source": "a", "target": "b"}],
			"links": [{"source": "b", "target": "a"}]
		});
		let graph = normalize(&payload).unwrap().graph;
		assert_eq!(graph.edges(), &[Edge::new("a", "b")]);
	}

	#[test]
	fn embedded_endpoint_objects_are_unwrapped() {
		let payload = json!({
			"nodes": [{"id": "s1", "name": "Ada"}, {"id": "i1", "name": "Grace"}],
			"edges": [{"source": {"id": "s1", "x": 3}, "target": {"name": "i1"}}]
		});
		let graph = normalize(&payload).unwrap().graph;
		assert_eq!(graph.edges(), &[Edge::new("s1", "i1")]);
	}

	#[test]
	fn unresolved_edges_are_counted_not_fatal() {
		let payload = json!({
			"nodes": [{"id": "a"}, {"id": "b"}],
			"edges": [
				{"source": "a", "target": "b"},
				{"source": "a", "target": "ghost"},
				{"source": 7, "target": 0},
				{"source": -1, "target": 0},
				{"source": 0.5, "target": 1},
				{"source": null, "target": "a"},
				{"target": "a"},
				"not an edge"
			]
		});
		let Normalized { graph, report } = normalize(&payload).unwrap();
		assert_eq!(graph.edges().len(), 1);
		assert_eq!(report.dropped_edges, 7);
	}

	#[test]
	fn zero_is_an_index_and_an_id() {
		let payload = json!({
			"nodes": [{"id": 0, "name": "zero"}, {"id": "one"}],
			"links": [{"source": 1, "target": 0}, {"source": "0", "target": "one"}]
		});
		let graph = normalize(&payload).unwrap().graph;
		assert_eq!(graph.nodes()[0].id, "0");
		assert_eq!(graph.nodes()[0].label, "zero");
		assert_eq!(graph.edges(), &[Edge::new("one", "0"), Edge::new("0", "one")]);
	}

	#[test]
	fn missing_identifier_names_the_node_position() {
		let payload = json!({"nodes": [{"id": "a"}, {"type": "student"}]});
		let err = normalize(&payload).unwrap_err();
		assert!(matches!(err, Error::MissingIdentifier { index: 1 }));
	}

	#[test]
	fn categories_come_from_category_type_or_group() {
		let payload = json!({
			"nodes": [
				{"id": "a", "category": "course"},
				{"id": "b", "type": "instructor"},
				{"id": "c", "group": 1},
				{"id": "d", "group": 2},
				{"id": "e", "group": 9},
				{"id": "f"}
			]
		});
		let graph = normalize(&payload).unwrap().graph;
		let categories: Vec<&str> = graph.nodes().iter().map(|n| n.category.as_str()).collect();
		assert_eq!(
			categories,
			vec!["course", "instructor", "instructor", "student", "group-9", "node"]
		);
	}

	#[test]
	fn integral_float_groups_map_like_integers() {
		let payload = json!({
			"nodes": [
				{"id": "a", "group": 1.0},
				{"id": "b", "group": 2.0},
				{"id": "c", "group": 3.0},
				{"id": "d", "group": 1.5}
			]
		});
		let graph = normalize(&payload).unwrap().graph;
		let categories: Vec<&str> = graph.nodes().iter().map(|n| n.category.as_str()).collect();
		assert_eq!(categories, vec!["instructor", "student", "group-3", "group-1.5"]);
	}

	#[test]
	fn duplicate_ids_keep_the_first_node() {
		let payload = json!({
			"nodes": [{"id": "a", "name": "first"}, {"id": "a", "name": "second"}, {"id": "b"}],
			"links": [{"source": 1, "target": 2}]
		});
		let Normalized { graph, report } = normalize(&payload).unwrap();
		assert_eq!(graph.nodes().len(), 2);
		assert_eq!(graph.node("a").unwrap().label, "first");
		assert_eq!(report.duplicate_nodes, 1);
		assert_eq!(graph.edges(), &[Edge::new("a", "b")]);
	}

	#[test]
	fn invalid_weights_fall_back_to_one() {
		let payload = json!({
			"nodes": [{"id": "a"}, {"id": "b"}],
			"edges": [
				{"source": "a", "target": "b", "weight": -2},
				{"source": "a", "target": "b", "weight": "heavy"},
				{"source": "a", "target": "b", "weight": 0}
			]
		});
		let graph = normalize(&payload).unwrap().graph;
		let weights: Vec<f64> = graph.edges().iter().map(|e| e.weight).collect();
		assert_eq!(weights, vec![1.0, 1.0, 0.0]);
	}

	#[test]
	fn normalizing_canonical_output_is_idempotent() {
		let payload = json!({
			"nodes": [
				{"name": "Ada", "group": 2, "x": 10.0, "y": 12.5},
				{"id": 42, "name": "Grace", "type": "instructor", "fx": 1.0, "fy": 2.0, "size": 4}
			],
			"links": [{"source": 0, "target": 1, "weight": 2.5}, {"source": 0, "target": 0}],
			"network_metrics": {"node_count": 2}
		});
		let first = normalize(&payload).unwrap().graph;
		let reparsed = serde_json::to_value(&first).unwrap();
		let second = normalize(&reparsed).unwrap();
		assert_eq!(second.graph, first);
		assert_eq!(second.report, NormalizeReport::default());
	}

	#[test]
	fn caller_payload_is_left_untouched() {
		let payload = json!({"nodes": [{"name": "A"}], "links": [{"source": 0, "target": 0}]});
		let before = payload.clone();
		normalize(&payload).unwrap();
		assert_eq!(payload, before);
	}

	#[test]
	fn malformed_documents_are_payload_errors() {
		assert!(matches!(normalize_str("{"), Err(Error::Payload(_))));
		assert!(matches!(normalize(&json!([1, 2])), Err(Error::Payload(_))));
		assert!(matches!(
			normalize(&json!({"nodes": {"a": 1}})),
			Err(Error::Payload(_))
		));
	}

	#[test]
	fn missing_nodes_is_an_empty_graph() {
		let normalized = normalize_str(r#"{"network_metrics": {}}"#).unwrap();
		assert!(normalized.graph.is_empty());
	}
}
