use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::fetch::fetch_text;
use super::render::CanvasSurface;
use super::state::PanState;
use crate::graph::{Command, GraphSummary, LayoutConfig, NetworkController, Outcome, Viewport};

/// Longest hover animation step, so a backgrounded tab does not jump on return.
const MAX_FRAME_SECONDS: f64 = 0.1;

type Controller = Rc<RefCell<NetworkController<CanvasSurface>>>;

#[derive(Clone, Debug, PartialEq)]
pub enum LoadStatus {
	Loading,
	Ready {
		summary: GraphSummary,
		dropped_edges: usize,
	},
	Empty,
	Failed(String),
}

impl LoadStatus {
	pub fn message(&self) -> Option<String> {
		match self {
			Self::Loading => Some("Loading network data...".into()),
			Self::Ready { .. } => None,
			Self::Empty => Some("No network data available.".into()),
			Self::Failed(message) => Some(message.clone()),
		}
	}
}

fn status_for(outcome: crate::graph::Result<Outcome>) -> Option<LoadStatus> {
	match outcome {
		Ok(Outcome::Loaded { summary, report }) => Some(LoadStatus::Ready {
			summary,
			dropped_edges: report.dropped_edges,
		}),
		Ok(Outcome::Empty) => Some(LoadStatus::Empty),
		Ok(Outcome::Failed(message)) => Some(LoadStatus::Failed(format!(
			"Failed to load network data: {message}"
		))),
		Ok(_) => None,
		Err(err) => {
			error!("network data rejected: {err}");
			Some(LoadStatus::Failed(format!("Invalid network data: {err}")))
		}
	}
}

/// The `requestAnimationFrame` loop of one mounted canvas. Cancelling it revokes the
/// pending frame, so no step runs against a view that is gone.
#[derive(Default)]
struct FrameLoop {
	callback: RefCell<Option<Closure<dyn FnMut()>>>,
	handle: Cell<Option<i32>>,
	cancelled: Cell<bool>,
}

impl FrameLoop {
	fn schedule(&self) {
		if self.cancelled.get() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		let callback = self.callback.borrow();
		let Some(cb) = callback.as_ref() else {
			return;
		};
		match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
			Ok(handle) => self.handle.set(Some(handle)),
			Err(err) => warn!("could not schedule animation frame: {err:?}"),
		}
	}

	fn cancel(&self) {
		self.cancelled.set(true);
		if let (Some(handle), Some(window)) = (self.handle.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(handle);
		}
		self.callback.borrow_mut().take();
	}
}

struct Runtime {
	controller: Controller,
	frames: Rc<FrameLoop>,
	resize: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl Runtime {
	fn teardown(&self) {
		if self.frames.cancelled.get() {
			return;
		}
		self.frames.cancel();
		if let (Some(cb), Some(window)) = (self.resize.borrow_mut().take(), web_sys::window()) {
			let _ =
				window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
		if let Ok(mut controller) = self.controller.try_borrow_mut() {
			let _ = controller.dispatch(Command::Teardown);
		}
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	let dim = |v: Result<JsValue, JsValue>, fallback: f64| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	(
		dim(window.inner_width(), 800.0),
		dim(window.inner_height(), 600.0),
	)
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn release(controller: &Controller, clear_hover: bool) {
	let mut c = controller.borrow_mut();
	let view = c.adapter_mut().view_mut();
	view.pan.active = false;
	if clear_hover {
		view.set_hover(None);
	}
	if let Some(id) = view.drag.node.take() {
		if let Err(err) = c.dispatch(Command::DragEnd { id }) {
			warn!("drag end ignored: {err}");
		}
	}
}

/// Marks `id` as dragged only once the simulation has accepted it.
fn begin_drag(c: &mut NetworkController<CanvasSurface>, id: String) {
	match c.dispatch(Command::DragStart { id: id.clone() }) {
		Ok(_) => c.adapter_mut().view_mut().drag.node = Some(id),
		Err(err) => warn!("drag start ignored: {err}"),
	}
}

/// Fetches a network from `endpoint` and lays it out on a canvas.
///
/// The graph is fetched again whenever `refresh` changes; a response that arrives after a
/// newer request was made is discarded.
#[component]
pub fn NetworkGraphCanvas(
	#[prop(into)] endpoint: String,
	#[prop(optional)] config: Option<LayoutConfig>,
	#[prop(into, default = Signal::stored(0))] refresh: Signal<u32>,
	#[prop(optional)] status: Option<RwSignal<LoadStatus>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let status = status.unwrap_or_else(|| RwSignal::new(LoadStatus::Loading));

	let surface = CanvasSurface::new(config.clone().unwrap_or_default());
	let mut controller = NetworkController::new(surface, Viewport::new(800.0, 600.0));
	if let Some(config) = config {
		controller = controller.with_config(config);
	}
	let controller: Controller = Rc::new(RefCell::new(controller));
	let frames = Rc::new(FrameLoop::default());
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	let runtime = StoredValue::new_local(Runtime {
		controller: controller.clone(),
		frames: frames.clone(),
		resize: resize_cb.clone(),
	});
	on_cleanup(move || {
		runtime.try_with_value(Runtime::teardown);
	});

	let (controller_init, frames_init) = (controller.clone(), frames.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.filter(|w| *w > 0.0)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.filter(|h| *h > 0.0)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx = match canvas.get_context("2d") {
			Ok(Some(ctx)) => ctx,
			_ => {
				error!("canvas has no 2d context");
				return;
			}
		};
		let Ok(ctx) = ctx.dyn_into::<CanvasRenderingContext2d>() else {
			error!("2d context is not a CanvasRenderingContext2d");
			return;
		};
		{
			let mut c = controller_init.borrow_mut();
			c.adapter_mut().attach(ctx, w, h);
			if let Err(err) = c.dispatch(Command::Resize(Viewport::new(w, h))) {
				warn!("canvas resize rejected: {err}");
			}
		}

		if fullscreen {
			let (controller_resize, canvas_resize) = (controller_init.clone(), canvas.clone());
			*resize_cb.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				let mut c = controller_resize.borrow_mut();
				c.adapter_mut().view_mut().resize(nw, nh);
				if let Err(err) = c.dispatch(Command::Resize(Viewport::new(nw, nh))) {
					warn!("canvas resize rejected: {err}");
				}
			}));
			if let Some(ref cb) = *resize_cb.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (controller_anim, frames_anim) = (controller_init.clone(), frames_init.clone());
		let last_tick = Cell::new(js_sys::Date::now());
		*frames_init.callback.borrow_mut() = Some(Closure::new(move || {
			frames_anim.handle.set(None);
			let now = js_sys::Date::now();
			let dt = ((now - last_tick.replace(now)) / 1000.0).clamp(0.0, MAX_FRAME_SECONDS);
			if let Ok(mut c) = controller_anim.try_borrow_mut() {
				c.adapter_mut().view_mut().advance_hover(dt);
				// A converged layout still needs repainting for hover, pan and zoom
				if !matches!(c.dispatch(Command::Frame), Ok(Outcome::Stepped(_))) {
					c.adapter().redraw();
				}
			}
			frames_anim.schedule();
		}));
		frames_init.schedule();
	});

	let controller_fetch = controller.clone();
	Effect::new(move |_| {
		refresh.track();
		// Taken before the request goes out, so its response can only ever follow this
		let generation = controller_fetch.borrow_mut().begin_request();
		status.try_set(LoadStatus::Loading);
		debug!("requesting {endpoint} as request {generation}");

		let (controller, endpoint) = (controller_fetch.clone(), endpoint.clone());
		spawn_local(async move {
			let command = match fetch_text(&endpoint).await {
				Ok(body) => Command::Load { generation, body },
				Err(message) => Command::LoadFailed {
					generation,
					message,
				},
			};
			let outcome = controller.borrow_mut().dispatch(command);
			if let Some(next) = status_for(outcome) {
				status.try_set(next);
			}
		});
	});

	let controller_md = controller.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut c = controller_md.borrow_mut();
		let view = c.adapter_mut().view_mut();
		match view.node_at_position(x, y) {
			Some(id) => begin_drag(&mut c, id),
			None => {
				view.pan = PanState {
					active: true,
					start_x: x,
					start_y: y,
					transform_start_x: view.transform.x,
					transform_start_y: view.transform.y,
				};
			}
		}
	};

	let controller_mm = controller.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut c = controller_mm.borrow_mut();
		let view = c.adapter_mut().view_mut();
		if let Some(id) = view.drag.node.clone() {
			let (gx, gy) = view.screen_to_graph(x, y);
			if let Err(err) = c.dispatch(Command::DragMove { id, x: gx, y: gy }) {
				warn!("drag ignored: {err}");
			}
		} else if view.pan.active {
			view.transform.x = view.pan.transform_start_x + (x - view.pan.start_x);
			view.transform.y = view.pan.transform_start_y + (y - view.pan.start_y);
		} else {
			let hovered = view.node_at_position(x, y);
			view.set_hover(hovered);
		}
	};

	let controller_mu = controller.clone();
	let on_mouseup = move |_: MouseEvent| release(&controller_mu, false);

	let controller_ml = controller.clone();
	let on_mouseleave = move |_: MouseEvent| release(&controller_ml, true);

	let controller_wh = controller.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut c = controller_wh.borrow_mut();
		let transform = &mut c.adapter_mut().view_mut().transform;
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		let new_k = (transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / transform.k;
		transform.x = x - (x - transform.x) * ratio;
		transform.y = y - (y - transform.y) * ratio;
		transform.k = new_k;
	};

	view! {
		<div class="network-graph" style="position: relative; width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				class="network-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			{move || {
				status
					.get()
					.message()
					.map(|message| view! { <p class="graph-status">{message}</p> })
			}}
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Error, NormalizeReport};

	#[test]
	fn outcomes_map_to_visible_statuses() {
		let loaded = status_for(Ok(Outcome::Loaded {
			summary: GraphSummary::default(),
			report: NormalizeReport {
				dropped_edges: 2,
				duplicate_nodes: 0,
			},
		}));
		assert_eq!(
			loaded,
			Some(LoadStatus::Ready {
				summary: GraphSummary::default(),
				dropped_edges: 2
			})
		);
		assert_eq!(status_for(Ok(Outcome::Empty)), Some(LoadStatus::Empty));
		assert_eq!(status_for(Ok(Outcome::Stale)), None);
		assert_eq!(status_for(Ok(Outcome::Stepped(3))), None);

		let rejected = status_for(Err(Error::MissingIdentifier { index: 4 })).unwrap();
		assert!(matches!(rejected, LoadStatus::Failed(ref m) if m.contains("position 4")));
	}

	#[test]
	fn refused_drag_leaves_no_drag_behind() {
		let mut c = NetworkController::new(
			CanvasSurface::new(LayoutConfig::default()),
			Viewport::new(800.0, 600.0),
		);
		begin_drag(&mut c, "s1".into());
		assert_eq!(c.adapter().view().drag.node, None);

		let generation = c.begin_request();
		let body = r#"{"nodes":[{"id":"s1"},{"id":"s2"}],"links":[{"source":0,"target":1}]}"#;
		c.dispatch(Command::Load {
			generation,
			body: body.into(),
		})
		.unwrap();
		begin_drag(&mut c, "ghost".into());
		assert_eq!(c.adapter().view().drag.node, None);
		begin_drag(&mut c, "s1".into());
		assert_eq!(c.adapter().view().drag.node.as_deref(), Some("s1"));
	}

	#[test]
	fn empty_and_failed_states_carry_a_message() {
		assert_eq!(
			LoadStatus::Empty.message().as_deref(),
			Some("No network data available.")
		);
		assert!(LoadStatus::Failed("HTTP 500".into()).message().is_some());
		let ready = LoadStatus::Ready {
			summary: GraphSummary::default(),
			dropped_edges: 0,
		};
		assert_eq!(ready.message(), None);
	}
}
