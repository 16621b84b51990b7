//! Canonical graph model.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// A position in layout space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// A point at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance to `other`.
	pub fn distance(&self, other: &Point) -> f64 {
		((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
	}
}

/// A canonical node. Simulation positions live in the layout engine, so `position` is
/// only the starting point supplied by the payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(into = "NodeRecord")]
pub struct Node {
	/// Unique within its graph.
	pub id: String,
	/// Text drawn next to the node.
	pub label: String,
	/// Kind of node, e.g. "student"; picks the style.
	pub category: String,
	/// Drawn radius hint that overrides the category style.
	pub size: Option<f64>,
	/// Where the payload placed the node, if anywhere.
	pub position: Option<Point>,
	/// Where the payload fixed the node, if anywhere.
	pub pin: Option<Point>,
}

impl Node {
	/// A node labelled with its own id.
	pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
		let id = id.into();
		Self {
			label: id.clone(),
			id,
			category: category.into(),
			size: None,
			position: None,
			pin: None,
		}
	}

	/// Replaces the label.
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}
}

// Payload shape a node serializes back into, so re-normalizing is a no-op.
#[derive(Serialize)]
struct NodeRecord {
	id: String,
	label: String,
	category: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	size: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	x: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	y: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	fx: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	fy: Option<f64>,
}

impl From<Node> for NodeRecord {
	fn from(node: Node) -> Self {
		Self {
			id: node.id,
			label: node.label,
			category: node.category,
			size: node.size,
			x: node.position.map(|p| p.x),
			y: node.position.map(|p| p.y),
			fx: node.pin.map(|p| p.x),
			fy: node.pin.map(|p| p.y),
		}
	}
}

/// A canonical edge between two nodes of the same graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Finite and non-negative; drawn as line width.
	pub weight: f64,
}

impl Edge {
	/// An edge of weight 1.
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			weight: 1.0,
		}
	}

	/// Whether both ends are the same node.
	pub fn is_self_loop(&self) -> bool {
		self.source == self.target
	}
}

/// Nodes with unique identifiers plus edges whose endpoints all resolve to them.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Graph {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	#[serde(skip)]
	index: HashMap<String, usize>,
}

impl Graph {
	/// An empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns `false` and leaves the graph untouched when the id is already taken.
	pub fn insert_node(&mut self, node: Node) -> bool {
		if self.index.contains_key(&node.id) {
			return false;
		}
		self.index.insert(node.id.clone(), self.nodes.len());
		self.nodes.push(node);
		true
	}

	/// Returns `false` when either endpoint is not a node of this graph.
	pub fn push_edge(&mut self, edge: Edge) -> bool {
		if !self.contains(&edge.source) || !self.contains(&edge.target) {
			return false;
		}
		self.edges.push(edge);
		true
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Edges in insertion order.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// The node with id `id`.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.index_of(id).map(|i| &self.nodes[i])
	}

	/// Position of `id` in [`nodes`](Self::nodes).
	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Whether a node has id `id`.
	pub fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	/// True when there are no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Number of edge incidences; a self-loop counts once per endpoint.
	pub fn degree(&self, id: &str) -> usize {
		self.edges
			.iter()
			.map(|e| usize::from(e.source == id) + usize::from(e.target == id))
			.sum()
	}

	/// Degree of every node, in node order.
	pub fn degrees(&self) -> Vec<usize> {
		let mut degrees = vec![0; self.nodes.len()];
		for edge in &self.edges {
			for end in [&edge.source, &edge.target] {
				if let Some(i) = self.index_of(end) {
					degrees[i] += 1;
				}
			}
		}
		degrees
	}

	/// Distinct categories in first-seen order.
	pub fn categories(&self) -> Vec<&str> {
		let mut seen: Vec<&str> = Vec::new();
		for node in &self.nodes {
			if !seen.contains(&node.category.as_str()) {
				seen.push(&node.category);
			}
		}
		seen
	}

	/// Counts for the metrics panel.
	pub fn summary(&self) -> GraphSummary {
		let degrees = self.degrees();
		let mut categories: BTreeMap<String, CategorySummary> = BTreeMap::new();
		for (node, degree) in self.nodes.iter().zip(&degrees) {
			let entry = categories.entry(node.category.clone()).or_default();
			entry.count += 1;
			entry.avg_degree += *degree as f64;
		}
		for entry in categories.values_mut() {
			entry.avg_degree /= entry.count as f64;
		}
		GraphSummary {
			node_count: self.nodes.len(),
			edge_count: self.edges.len(),
			categories,
		}
	}
}

/// Counts for the nodes of one category.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategorySummary {
	/// Nodes in the category.
	pub count: usize,
	/// Mean number of edge ends per node.
	pub avg_degree: f64,
}

/// Counts shown next to a network, like the metrics panel of the dashboard.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSummary {
	/// Nodes in the graph.
	pub node_count: usize,
	/// Edges in the graph, self-loops included.
	pub edge_count: usize,
	/// Per category, by name.
	pub categories: BTreeMap<String, CategorySummary>,
}
