//! Layout and styling options.
//!
//! Everything deserializes from camelCase JSON with every field optional, so a page can
//! override a single knob (`{"chargeStrength": -600}`) on top of the defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::Result;
use super::types::{Graph, Node};

/// Room left around a circle for its stroke and label.
pub const LABEL_MARGIN: f64 = 5.0;

/// Outline a category is drawn and bounded with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
	/// A circle of the style's radius.
	#[default]
	Circle,
	/// A `width` by `height` box centred on the node.
	Rect,
}

/// Half the visual size of a node along each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
	/// Distance from the center to the left and right edges.
	pub half_width: f64,
	/// Distance from the center to the top and bottom edges.
	pub half_height: f64,
}

/// How the nodes of one category are drawn and how much room they take.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CategoryStyle {
	/// Outline.
	pub shape: NodeShape,
	/// Circle radius, unless the node carries its own size.
	pub radius: f64,
	/// Box width; rectangles only.
	pub width: f64,
	/// Box height; rectangles only.
	pub height: f64,
	/// Overrides [`LayoutConfig::collision_radius`] for this category.
	pub collision_radius: Option<f64>,
	/// CSS fill color.
	pub color: String,
}

impl Default for CategoryStyle {
	fn default() -> Self {
		Self {
			shape: NodeShape::Circle,
			radius: 8.0,
			width: 0.0,
			height: 0.0,
			collision_radius: None,
			color: "#8bc34a".into(),
		}
	}
}

impl CategoryStyle {
	fn circle(radius: f64, collision_radius: Option<f64>, color: &str) -> Self {
		Self {
			radius,
			collision_radius,
			color: color.into(),
			..Self::default()
		}
	}

	fn rect(width: f64, height: f64, color: &str) -> Self {
		Self {
			shape: NodeShape::Rect,
			radius: height / 2.0,
			width,
			height,
			collision_radius: None,
			color: color.into(),
		}
	}
}

/// Forces and styles of a layout. Every field has a default, so a JSON config only
/// needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
	/// Rest length of every edge spring.
	pub link_distance: f64,
	/// Many-body strength; negative values repel.
	pub charge_strength: f64,
	/// Collision radius for categories whose style does not set one.
	pub collision_radius: f64,
	/// Share of the offset from the viewport center removed each step.
	pub centering_strength: f64,
	/// Collision passes per step.
	pub collision_iterations: usize,
	/// Alpha under which the simulation counts as converged.
	pub alpha_min: f64,
	/// Fraction of the gap to the alpha target closed each step.
	pub alpha_decay: f64,
	/// Fraction of velocity lost each step.
	pub velocity_decay: f64,
	/// Alpha a pin or resize raises the simulation back to.
	pub reheat_alpha: f64,
	/// Style of categories missing from `styles`.
	pub default_style: CategoryStyle,
	/// Styles by category name.
	pub styles: BTreeMap<String, CategoryStyle>,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		let alpha_min = 0.001;
		let styles = BTreeMap::from([
			(
				"instructor".to_owned(),
				CategoryStyle::circle(15.0, Some(25.0), "#9c4dcc"),
			),
			(
				"student".to_owned(),
				CategoryStyle::circle(8.0, None, "#48bfe3"),
			),
			("course".to_owned(), CategoryStyle::rect(120.0, 40.0, "#0d6efd")),
		]);
		Self {
			link_distance: 100.0,
			charge_strength: -300.0,
			collision_radius: 10.0,
			centering_strength: 1.0,
			collision_iterations: 2,
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			velocity_decay: 0.4,
			reheat_alpha: 0.3,
			default_style: CategoryStyle::default(),
			styles,
		}
	}
}

impl LayoutConfig {
	/// Two kinds of nodes linked across, such as students and instructors.
	pub fn bipartite() -> Self {
		Self {
			link_distance: 100.0,
			charge_strength: -400.0,
			..Self::default()
		}
	}

	/// One kind of node, such as the course network.
	pub fn homogeneous() -> Self {
		Self {
			link_distance: 150.0,
			charge_strength: -800.0,
			collision_radius: 40.0,
			..Self::default()
		}
	}

	/// Bipartite when the graph mixes categories, homogeneous otherwise.
	pub fn for_graph(graph: &Graph) -> Self {
		if graph.categories().len() > 1 {
			Self::bipartite()
		} else {
			Self::homogeneous()
		}
	}

	/// Parses a camelCase JSON config; missing keys keep their defaults.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Style of `category`, falling back to the default style.
	pub fn style_for(&self, category: &str) -> &CategoryStyle {
		self.styles.get(category).unwrap_or(&self.default_style)
	}

	/// Drawn radius; a node's size hint overrides its category.
	pub fn radius_for(&self, node: &Node) -> f64 {
		node.size
			.filter(|s| *s > 0.0)
			.unwrap_or_else(|| self.style_for(&node.category).radius)
	}

	/// Radius other nodes are kept outside of.
	pub fn collision_radius_for(&self, node: &Node) -> f64 {
		self.style_for(&node.category)
			.collision_radius
			.unwrap_or(self.collision_radius)
	}

	/// Room the node needs inside the viewport, label margin included for circles.
	pub fn extent_for(&self, node: &Node) -> Extent {
		let style = self.style_for(&node.category);
		match style.shape {
			NodeShape::Rect => Extent {
				half_width: style.width / 2.0,
				half_height: style.height / 2.0,
			},
			NodeShape::Circle => {
				let half = self.radius_for(node) + LABEL_MARGIN;
				Extent {
					half_width: half,
					half_height: half,
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_overrides_defaults() {
		let config =
			LayoutConfig::from_json(r#"{"linkDistance": 80, "chargeStrength": -600}"#).unwrap();
		assert_eq!(config.link_distance, 80.0);
		assert_eq!(config.charge_strength, -600.0);
		assert_eq!(config.collision_iterations, 2);
		assert!(config.styles.contains_key("instructor"));
	}

	#[test]
	fn category_styles_drive_collision_and_extent() {
		let config = LayoutConfig::bipartite();
		let instructor = Node::new("i", "instructor");
		let student = Node::new("s", "student");
		let course = Node::new("c", "course");

		assert_eq!(config.collision_radius_for(&instructor), 25.0);
		assert_eq!(config.collision_radius_for(&student), 10.0);
		assert_eq!(
			config.extent_for(&course),
			Extent {
				half_width: 60.0,
				half_height: 20.0
			}
		);
		assert_eq!(config.extent_for(&instructor).half_width, 20.0);
	}

	#[test]
	fn size_hint_overrides_category_radius() {
		let config = LayoutConfig::default();
		let mut node = Node::new("n", "student");
		node.size = Some(12.0);
		assert_eq!(config.radius_for(&node), 12.0);
		assert_eq!(config.extent_for(&node).half_height, 17.0);
	}

	#[test]
	fn preset_follows_category_mix() {
		let mut graph = Graph::new();
		graph.insert_node(Node::new("c1", "course"));
		graph.insert_node(Node::new("c2", "course"));
		assert_eq!(LayoutConfig::for_graph(&graph).link_distance, 150.0);

		graph.insert_node(Node::new("s1", "student"));
		assert_eq!(LayoutConfig::for_graph(&graph).charge_strength, -400.0);
	}
}
