use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::{CanvasView, NodeInfo};
use crate::graph::{Frame, Graph, LayoutConfig, NodeShape, RenderAdapter};

const BACKGROUND: &str = "#1a1a2e";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Draws layout frames onto a 2d canvas context.
pub struct CanvasSurface {
	ctx: Option<CanvasRenderingContext2d>,
	view: CanvasView,
}

impl CanvasSurface {
	pub fn new(styles: LayoutConfig) -> Self {
		Self {
			ctx: None,
			view: CanvasView::new(styles, 0.0, 0.0),
		}
	}

	/// Frames that arrive before a context is attached are kept and drawn once it is.
	pub fn attach(&mut self, ctx: CanvasRenderingContext2d, width: f64, height: f64) {
		self.ctx = Some(ctx);
		self.view.resize(width, height);
		self.redraw();
	}

	pub fn view(&self) -> &CanvasView {
		&self.view
	}

	pub fn view_mut(&mut self) -> &mut CanvasView {
		&mut self.view
	}

	pub fn redraw(&self) {
		if let Some(ctx) = &self.ctx {
			draw(&self.view, ctx);
		}
	}
}

impl RenderAdapter for CanvasSurface {
	fn begin(&mut self, graph: &Graph) {
		self.view.install(graph);
	}

	fn render(&mut self, frame: &Frame) {
		self.view.set_frame(frame.clone());
		self.redraw();
	}

	fn clear(&mut self) {
		self.view.clear();
		self.redraw();
	}
}

fn draw(view: &CanvasView, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, view.width, view.height);
	let Some(frame) = view.frame() else {
		return;
	};
	ctx.save();
	let _ = ctx.translate(view.transform.x, view.transform.y);
	let _ = ctx.scale(view.transform.k, view.transform.k);
	draw_edges(view, frame, ctx);
	draw_nodes(view, frame, ctx);
	ctx.restore();
}

fn draw_edges(view: &CanvasView, frame: &Frame, ctx: &CanvasRenderingContext2d) {
	let k = view.transform.k;
	let t = ease_out_cubic(view.hover.highlight_t);

	for edge in &frame.edges {
		if edge.source == edge.target {
			continue;
		}
		let is_highlighted = view.is_highlighted(&edge.source) && view.is_highlighted(&edge.target);
		// t=0: every edge at 0.6; t=1: highlighted edges at 0.9, the rest at 0.15
		let alpha = if is_highlighted {
			0.6 + 0.3 * t
		} else {
			0.6 - 0.45 * t
		};
		let width = view.weight(edge.edge_index).max(0.5).sqrt() / k;

		ctx.set_stroke_style_str(&format!("rgba(170, 170, 170, {})", alpha));
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(edge.x1, edge.y1);
		ctx.line_to(edge.x2, edge.y2);
		ctx.stroke();
	}
}

fn draw_nodes(view: &CanvasView, frame: &Frame, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		view.has_active_highlight(),
		ease_out_cubic(view.hover.highlight_t),
		view.transform.k,
	);

	// Dimmed nodes first so highlighted ones end up on top
	for pass_highlighted in [false, true] {
		for position in &frame.nodes {
			let id = position.node_id.as_str();
			let highlighted = has_highlight && view.is_highlighted(id);
			if highlighted != pass_highlighted {
				continue;
			}
			let Some(info) = view.node(id) else {
				continue;
			};
			let (alpha, scale) = if !has_highlight {
				(1.0, 1.0)
			} else if view.is_hovered(id) {
				(1.0, 1.0 + 0.35 * t)
			} else if highlighted {
				(1.0, 1.0 + 0.2 * t)
			} else {
				(1.0 - 0.7 * t, 1.0 - 0.15 * t)
			};

			ctx.set_global_alpha(alpha);
			shape_path(ctx, info, position.x, position.y, scale);
			ctx.set_fill_style_str(&info.color);
			ctx.fill();
			ctx.set_stroke_style_str("#ffffff");
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
			ctx.set_global_alpha(1.0);

			draw_label(ctx, info, position.x, position.y, alpha, k);
		}
	}
}

fn shape_path(ctx: &CanvasRenderingContext2d, info: &NodeInfo, x: f64, y: f64, scale: f64) {
	ctx.begin_path();
	match info.shape {
		NodeShape::Circle => {
			let _ = ctx.arc(x, y, info.radius * scale, 0.0, 2.0 * PI);
		}
		NodeShape::Rect => {
			let (w, h) = (info.width * scale, info.height * scale);
			ctx.rect(x - w / 2.0, y - h / 2.0, w, h);
		}
	}
}

fn draw_label(ctx: &CanvasRenderingContext2d, info: &NodeInfo, x: f64, y: f64, alpha: f64, k: f64) {
	ctx.set_font(&format!("{}px sans-serif", 11.0 / k.max(0.5)));
	ctx.set_text_align("center");
	ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha * 0.9));
	let _ = match info.shape {
		// Course boxes carry their label inside
		NodeShape::Rect => ctx.fill_text(&info.label, x, y + 4.0),
		NodeShape::Circle => ctx.fill_text(&info.label, x, y - info.radius - 4.0),
	};
}
