//! Command-driven front of the layout pipeline.
//!
//! UI code never touches the simulation directly. Clicks, drags, fetch completions and
//! animation frames become [`Command`]s, handled one at a time in the order they were
//! queued. A load is tagged with the generation handed out by
//! [`NetworkController::begin_request`] when its fetch started; responses for anything but
//! the latest request are dropped, so a slow fetch can never overwrite a newer graph.

use std::collections::VecDeque;

use log::{debug, info, warn};

use super::config::LayoutConfig;
use super::error::{Error, Result};
use super::frame::RenderAdapter;
use super::layout::{ForceSimulation, Viewport};
use super::normalize::{NormalizeReport, normalize_str};
use super::slot::Slot;
use super::types::{Graph, GraphSummary};

/// Everything the UI can ask of a [`NetworkController`].
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
	/// A fetch finished with `body`.
	Load {
		/// Generation returned by the `begin_request` that started the fetch.
		generation: u64,
		/// Raw JSON payload.
		body: String,
	},
	/// A fetch failed before producing a body.
	LoadFailed {
		/// Generation returned by the `begin_request` that started the fetch.
		generation: u64,
		/// What went wrong, for the status line.
		message: String,
	},
	/// Fix a node at a point.
	Pin {
		/// Node to fix.
		id: String,
		/// Target x.
		x: f64,
		/// Target y.
		y: f64,
	},
	/// Release a pinned node.
	Unpin {
		/// Node to release.
		id: String,
	},
	/// The pointer grabbed a node; it is pinned where it is and the layout kept warm.
	DragStart {
		/// Grabbed node.
		id: String,
	},
	/// The pointer moved while holding a node.
	DragMove {
		/// Dragged node.
		id: String,
		/// Pointer x in layout space.
		x: f64,
		/// Pointer y in layout space.
		y: f64,
	},
	/// The pointer let go; the node is released and the layout cools down.
	DragEnd {
		/// Released node.
		id: String,
	},
	/// The drawing surface changed size.
	Resize(Viewport),
	/// One animation frame: advance the simulation and hand the result to the renderer.
	Frame,
	/// The view is going away. Stops the simulation and orphans in-flight requests.
	Teardown,
}

/// Result of a handled [`Command`].
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
	/// A new graph is laid out.
	Loaded {
		/// Counts for the metrics panel.
		summary: GraphSummary,
		/// What normalization had to skip.
		report: NormalizeReport,
	},
	/// The payload had no nodes; show an empty state.
	Empty,
	/// The fetch failed; carries its message.
	Failed(String),
	/// A response for a request that has since been superseded.
	Stale,
	/// A frame was rendered; carries its step number.
	Stepped(u64),
	/// Nothing to advance: no graph, or the layout has converged.
	Idle,
	/// Pins, drags or the viewport changed.
	Updated,
	/// The controller is back to its empty state.
	TornDown,
}

/// Owns the current graph and its simulation and turns [`Command`]s into calls on them,
/// rendering through `R`.
pub struct NetworkController<R: RenderAdapter> {
	adapter: R,
	simulation: Slot<ForceSimulation>,
	graph: Option<Graph>,
	config: Option<LayoutConfig>,
	viewport: Viewport,
	generation: u64,
	queue: VecDeque<Command>,
}

impl<R: RenderAdapter> NetworkController<R> {
	/// An empty controller drawing through `adapter`.
	pub fn new(adapter: R, viewport: Viewport) -> Self {
		Self {
			adapter,
			simulation: Slot::new(),
			graph: None,
			config: None,
			viewport,
			generation: 0,
			queue: VecDeque::new(),
		}
	}

	/// Use `config` for every graph instead of picking a preset from its categories.
	pub fn with_config(mut self, config: LayoutConfig) -> Self {
		self.config = Some(config);
		self
	}

	/// Starts a new request and returns the generation its response must carry.
	pub fn begin_request(&mut self) -> u64 {
		self.generation += 1;
		self.generation
	}

	/// Queues `command` behind those already waiting; see [`drain`](Self::drain).
	pub fn enqueue(&mut self, command: Command) {
		self.queue.push_back(command);
	}

	/// Handles every queued command in order.
	pub fn drain(&mut self) -> Vec<Result<Outcome>> {
		let mut outcomes = Vec::with_capacity(self.queue.len());
		while let Some(command) = self.queue.pop_front() {
			outcomes.push(self.dispatch(command));
		}
		outcomes
	}

	/// Handles `command` right away.
	pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
		match command {
			Command::Load { generation, body } => self.load(generation, &body),
			Command::LoadFailed {
				generation,
				message,
			} => {
				if generation != self.generation {
					return Ok(Outcome::Stale);
				}
				warn!("network request {generation} failed: {message}");
				Ok(Outcome::Failed(message))
			}
			Command::Pin { id, x, y } | Command::DragMove { id, x, y } => {
				self.active()?.pin(&id, x, y)?;
				Ok(Outcome::Updated)
			}
			Command::Unpin { id } => {
				self.active()?.unpin(&id)?;
				Ok(Outcome::Updated)
			}
			Command::DragStart { id } => {
				let simulation = self.active()?;
				let at = simulation
					.position(&id)
					.ok_or_else(|| Error::UnknownNode(id.clone()))?;
				let warm = simulation.config().reheat_alpha;
				simulation.set_alpha_target(warm);
				simulation.pin(&id, at.x, at.y)?;
				Ok(Outcome::Updated)
			}
			Command::DragEnd { id } => {
				let simulation = self.active()?;
				simulation.set_alpha_target(0.0);
				simulation.unpin(&id)?;
				Ok(Outcome::Updated)
			}
			Command::Resize(viewport) => {
				viewport.validate()?;
				if let Some(simulation) = self.simulation.get_mut() {
					simulation.resize(viewport)?;
				}
				self.viewport = viewport;
				Ok(Outcome::Updated)
			}
			Command::Frame => {
				let Some(frame) = self.simulation.get_mut().and_then(ForceSimulation::step)
				else {
					return Ok(Outcome::Idle);
				};
				self.adapter.render(&frame);
				Ok(Outcome::Stepped(frame.step))
			}
			Command::Teardown => {
				// Anything still in flight belongs to a view that no longer exists.
				self.generation += 1;
				self.reset();
				debug!("network view torn down");
				Ok(Outcome::TornDown)
			}
		}
	}

	/// The renderer frames are handed to.
	pub fn adapter(&self) -> &R {
		&self.adapter
	}

	/// Mutable access to the renderer, e.g. for its view state.
	pub fn adapter_mut(&mut self) -> &mut R {
		&mut self.adapter
	}

	/// The graph of the last successful load.
	pub fn graph(&self) -> Option<&Graph> {
		self.graph.as_ref()
	}

	/// The simulation of the loaded graph, converged or not.
	pub fn simulation(&self) -> Option<&ForceSimulation> {
		self.simulation.get()
	}

	/// Viewport the next load is laid out in.
	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	fn load(&mut self, generation: u64, body: &str) -> Result<Outcome> {
		if generation != self.generation {
			debug!(
				"dropping response {generation}, latest request is {}",
				self.generation
			);
			return Ok(Outcome::Stale);
		}

		let normalized = match normalize_str(body) {
			Ok(normalized) => normalized,
			Err(err) => {
				self.reset();
				return Err(err);
			}
		};
		let graph = normalized.graph;
		let config = self
			.config
			.clone()
			.unwrap_or_else(|| LayoutConfig::for_graph(&graph));

		let simulation = match ForceSimulation::new(&graph, self.viewport, config) {
			Ok(simulation) => simulation,
			Err(Error::GraphEmpty) => {
				info!("network response {generation} has no nodes");
				self.reset();
				return Ok(Outcome::Empty);
			}
			Err(err) => {
				self.reset();
				return Err(err);
			}
		};

		info!(
			"loaded network: {} nodes, {} edges, {} dropped",
			graph.nodes().len(),
			graph.edges().len(),
			normalized.report.dropped_edges
		);
		let summary = graph.summary();
		self.adapter.begin(&graph);
		let frame = self.simulation.replace(simulation).frame();
		self.adapter.render(&frame);
		self.graph = Some(graph);
		Ok(Outcome::Loaded {
			summary,
			report: normalized.report,
		})
	}

	fn active(&mut self) -> Result<&mut ForceSimulation> {
		self.simulation.get_mut().ok_or(Error::GraphEmpty)
	}

	fn reset(&mut self) {
		self.simulation.clear();
		self.graph = None;
		self.adapter.clear();
	}
}
