use std::collections::{HashMap, HashSet};

use crate::graph::{Frame, Graph, LayoutConfig, NodeShape};

/// Extra world-space slack around a node that still counts as a hit.
pub const HIT_PADDING: f64 = 4.0;

#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub label: String,
	pub shape: NodeShape,
	pub radius: f64,
	pub width: f64,
	pub height: f64,
	pub color: String,
}

impl NodeInfo {
	fn contains(&self, dx: f64, dy: f64) -> bool {
		match self.shape {
			NodeShape::Circle => (dx * dx + dy * dy).sqrt() < self.radius + HIT_PADDING,
			NodeShape::Rect => {
				dx.abs() < self.width / 2.0 + HIT_PADDING
					&& dy.abs() < self.height / 2.0 + HIT_PADDING
			}
		}
	}
}

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<String>,
	pub neighbors: HashSet<String>,
	pub highlight_t: f64,
	pub prev_node: Option<String>,
	pub prev_neighbors: HashSet<String>,
	delay_t: f64,
}

/// What the canvas knows about the graph on screen, plus pan/zoom/hover state.
pub struct CanvasView {
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	styles: LayoutConfig,
	nodes: HashMap<String, NodeInfo>,
	weights: Vec<f64>,
	adjacency: HashMap<String, HashSet<String>>,
	frame: Option<Frame>,
}

impl CanvasView {
	pub fn new(styles: LayoutConfig, width: f64, height: f64) -> Self {
		Self {
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			styles,
			nodes: HashMap::new(),
			weights: Vec::new(),
			adjacency: HashMap::new(),
			frame: None,
		}
	}

	pub fn install(&mut self, graph: &Graph) {
		self.clear();
		for node in graph.nodes() {
			let style = self.styles.style_for(&node.category);
			self.nodes.insert(
				node.id.clone(),
				NodeInfo {
					label: node.label.clone(),
					shape: style.shape,
					radius: self.styles.radius_for(node),
					width: style.width,
					height: style.height,
					color: style.color.clone(),
				},
			);
		}
		for edge in graph.edges() {
			self.weights.push(edge.weight);
			if edge.is_self_loop() {
				continue;
			}
			self.adjacency
				.entry(edge.source.clone())
				.or_default()
				.insert(edge.target.clone());
			self.adjacency
				.entry(edge.target.clone())
				.or_default()
				.insert(edge.source.clone());
		}
	}

	pub fn clear(&mut self) {
		self.nodes.clear();
		self.weights.clear();
		self.adjacency.clear();
		self.frame = None;
		self.drag = DragState::default();
		self.hover = HoverState::default();
	}

	pub fn set_frame(&mut self, frame: Frame) {
		self.frame = Some(frame);
	}

	pub fn frame(&self) -> Option<&Frame> {
		self.frame.as_ref()
	}

	pub fn node(&self, id: &str) -> Option<&NodeInfo> {
		self.nodes.get(id)
	}

	pub fn weight(&self, edge_index: usize) -> f64 {
		self.weights.get(edge_index).copied().unwrap_or(1.0)
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost node under the screen point, if any.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.frame
			.as_ref()?
			.nodes
			.iter()
			.rev()
			.find(|p| {
				self.nodes
					.get(&p.node_id)
					.is_some_and(|info| info.contains(p.x - gx, p.y - gy))
			})
			.map(|p| p.node_id.clone())
	}

	pub fn set_hover(&mut self, node: Option<String>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Keep the previous highlight around so it can fade out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.neighbors = node
			.as_ref()
			.and_then(|id| self.adjacency.get(id))
			.cloned()
			.unwrap_or_default();
		if node.is_some() && !was_hovering {
			self.hover.delay_t = 0.0;
		}
		self.hover.node = node;
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.is_hovered(id)
			|| self.hover.neighbors.contains(id)
			|| self.hover.prev_neighbors.contains(id)
	}

	pub fn is_hovered(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id) || self.hover.prev_node.as_deref() == Some(id)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn advance_hover(&mut self, dt: f64) {
		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
