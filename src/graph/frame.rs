//! Per-step output of the layout and the trait renderers implement to receive it.

use super::types::{Graph, Point};

/// Where one node is in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct NodePosition {
	/// Node id.
	pub node_id: String,
	/// Center x.
	pub x: f64,
	/// Center y.
	pub y: f64,
}

impl NodePosition {
	/// The center as a point.
	pub fn point(&self) -> Point {
		Point::new(self.x, self.y)
	}
}

/// Line between the current positions of an edge's endpoints.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSegment {
	/// Position of the edge in [`Graph::edges`].
	pub edge_index: usize,
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Source x.
	pub x1: f64,
	/// Source y.
	pub y1: f64,
	/// Target x.
	pub x2: f64,
	/// Target y.
	pub y2: f64,
}

/// Everything a renderer needs for one simulation step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
	/// Number of steps taken so far; 0 before the first.
	pub step: u64,
	/// Alpha after the step.
	pub alpha: f64,
	/// Every node, in graph order.
	pub nodes: Vec<NodePosition>,
	/// Every edge, in graph order.
	pub edges: Vec<EdgeSegment>,
}

impl Frame {
	/// Position of `node_id`, if it is part of the frame.
	pub fn position(&self, node_id: &str) -> Option<Point> {
		self.nodes
			.iter()
			.find(|n| n.node_id == node_id)
			.map(NodePosition::point)
	}
}

/// Drawing side of the pipeline. The layout core never draws; it hands frames here.
pub trait RenderAdapter {
	/// A new graph is about to be laid out. Called before its first frame.
	fn begin(&mut self, _graph: &Graph) {}

	/// Draw one frame.
	fn render(&mut self, frame: &Frame);

	/// There is nothing to draw: the last load was empty, failed, or the view went away.
	fn clear(&mut self) {}
}
