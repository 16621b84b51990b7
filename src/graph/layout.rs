//! Force-directed layout of a canonical [`Graph`] inside a rectangular viewport.
//!
//! Every step applies four independent forces in a fixed order (edge springs, pairwise
//! charge, centering, pairwise collision), integrates velocities with decay and clamps
//! every node inside the viewport. Step size is governed by `alpha`, which decays toward
//! `alpha_target`; once it falls under `alpha_min` the simulation has converged and emits
//! no more frames. The converging step also moves any nodes that still overlap apart
//! directly, so a settled layout never has two collision circles intersecting. Pairwise forces are computed naively, so a step costs O(n²).

use std::collections::HashMap;
use std::f64::consts::PI;

use log::debug;

use super::config::{Extent, LayoutConfig};
use super::error::{Error, Result};
use super::frame::{EdgeSegment, Frame, NodePosition};
use super::types::{Graph, Point};

/// Radius step of the spiral new nodes are seeded on.
const INITIAL_RADIUS: f64 = 10.0;
const COLLISION_STRENGTH: f64 = 1.0;
/// Squared distance under which charge stops growing.
const CHARGE_DISTANCE_MIN2: f64 = 1.0;
/// Upper bound on the position passes that settle leftover overlaps at convergence.
const SEPARATION_PASSES: usize = 64;
/// Gap left between separated nodes so rounding cannot pull them back into contact.
const SEPARATION_SLACK: f64 = 1e-6;

/// Area nodes are laid out in, in canvas pixels with the origin at the top left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	/// Horizontal extent.
	pub width: f64,
	/// Vertical extent.
	pub height: f64,
}

impl Viewport {
	/// A viewport of the given size. Nothing is checked until it is used.
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// Point the centering force pulls toward.
	pub fn center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}

	/// Both sides must be finite and positive.
	pub(crate) fn validate(&self) -> Result<()> {
		let positive = |v: f64| v.is_finite() && v > 0.0;
		if positive(self.width) && positive(self.height) {
			Ok(())
		} else {
			Err(Error::InvalidViewport {
				width: self.width,
				height: self.height,
			})
		}
	}

	/// Moves `p` inside the viewport shrunk by `extent` on every side. An axis too small
	/// to hold the node puts it on the center line.
	fn clamp(&self, p: Point, extent: Extent) -> Point {
		let axis = |v: f64, half: f64, len: f64| {
			if 2.0 * half > len {
				len / 2.0
			} else {
				v.clamp(half, len - half)
			}
		};
		Point::new(
			axis(p.x, extent.half_width, self.width),
			axis(p.y, extent.half_height, self.height),
		)
	}
}

/// Lifecycle of a [`ForceSimulation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
	/// Still emitting frames.
	Running,
	/// Alpha has run out, or nothing can move. Revived by pins, resizes or an alpha target.
	Converged,
	/// Disposed; never runs again.
	Stopped,
}

#[derive(Clone, Debug)]
struct Body {
	x: f64,
	y: f64,
	vx: f64,
	vy: f64,
	pin: Option<Point>,
	collision_radius: f64,
	extent: Extent,
}

#[derive(Clone, Debug)]
struct Spring {
	source: usize,
	target: usize,
	strength: f64,
	bias: f64,
}

/// Linear congruential generator used to break ties between coincident nodes.
#[derive(Clone, Debug)]
struct Lcg(u32);

impl Lcg {
	fn next_unit(&mut self) -> f64 {
		self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
		f64::from(self.0) / 4_294_967_296.0
	}

	fn jiggle(&mut self) -> f64 {
		(self.next_unit() - 0.5) * 1e-6
	}
}

/// Positions of one graph, advanced a step at a time.
pub struct ForceSimulation {
	config: LayoutConfig,
	viewport: Viewport,
	ids: Vec<String>,
	index: HashMap<String, usize>,
	bodies: Vec<Body>,
	springs: Vec<Spring>,
	segments: Vec<(usize, usize)>,
	alpha: f64,
	alpha_target: f64,
	step: u64,
	state: SimulationState,
	rng: Lcg,
}

impl ForceSimulation {
	/// Seeds the simulation. Nothing is integrated until the first [`step`](Self::step).
	pub fn new(graph: &Graph, viewport: Viewport, config: LayoutConfig) -> Result<Self> {
		viewport.validate()?;
		if graph.is_empty() {
			return Err(Error::GraphEmpty);
		}

		let center = viewport.center();
		let golden_angle = PI * (3.0 - 5f64.sqrt());
		let bodies: Vec<Body> = graph
			.nodes()
			.iter()
			.enumerate()
			.map(|(i, node)| {
				let extent = config.extent_for(node);
				let pin = node.pin.map(|p| viewport.clamp(p, extent));
				let seed = node.position.unwrap_or_else(|| {
					let (r, a) = (
						INITIAL_RADIUS * (0.5 + i as f64).sqrt(),
						i as f64 * golden_angle,
					);
					Point::new(center.x + r * a.cos(), center.y + r * a.sin())
				});
				let start = pin.unwrap_or_else(|| viewport.clamp(seed, extent));
				Body {
					x: start.x,
					y: start.y,
					vx: 0.0,
					vy: 0.0,
					pin,
					collision_radius: config.collision_radius_for(node),
					extent,
				}
			})
			.collect();

		let degrees = graph.degrees();
		let mut springs = Vec::new();
		let mut segments = Vec::with_capacity(graph.edges().len());
		for edge in graph.edges() {
			let (Some(source), Some(target)) =
				(graph.index_of(&edge.source), graph.index_of(&edge.target))
			else {
				continue;
			};
			segments.push((source, target));
			if source == target {
				continue;
			}
			let (ds, dt) = (degrees[source] as f64, degrees[target] as f64);
			springs.push(Spring {
				source,
				target,
				strength: 1.0 / ds.min(dt),
				bias: ds / (ds + dt),
			});
		}

		let ids: Vec<String> = graph.nodes().iter().map(|n| n.id.clone()).collect();
		let index = ids.iter().cloned().enumerate().map(|(i, id)| (id, i)).collect();
		let mut simulation = Self {
			config,
			viewport,
			ids,
			index,
			bodies,
			springs,
			segments,
			alpha: 1.0,
			alpha_target: 0.0,
			step: 0,
			state: SimulationState::Running,
			rng: Lcg(1),
		};
		if simulation.all_pinned() {
			simulation.state = SimulationState::Converged;
		}
		debug!(
			"simulation seeded with {} nodes and {} springs",
			simulation.bodies.len(),
			simulation.springs.len()
		);
		Ok(simulation)
	}

	/// Advances one step and returns the resulting positions, or `None` once the
	/// simulation has converged or been stopped.
	pub fn step(&mut self) -> Option<Frame> {
		if self.state != SimulationState::Running {
			return None;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

		self.apply_springs();
		self.apply_charge();
		self.apply_centering();
		self.apply_collisions();
		self.integrate();

		self.step += 1;
		if self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min {
			self.separate();
			self.state = SimulationState::Converged;
			debug!("simulation converged after {} steps", self.step);
		}
		Some(self.frame())
	}

	/// Steps until convergence or `max_steps`, returning the number of steps taken.
	pub fn run(&mut self, max_steps: usize) -> usize {
		let mut taken = 0;
		while taken < max_steps && self.step().is_some() {
			taken += 1;
		}
		taken
	}

	/// Fixes a node at `(x, y)`, clamped into the viewport, and returns where it landed.
	pub fn pin(&mut self, id: &str, x: f64, y: f64) -> Result<Point> {
		if !(x.is_finite() && y.is_finite()) {
			return Err(Error::InvalidCoordinate { x, y });
		}
		let i = self.lookup(id)?;
		let body = &mut self.bodies[i];
		let at = self.viewport.clamp(Point::new(x, y), body.extent);
		body.pin = Some(at);
		body.x = at.x;
		body.y = at.y;
		body.vx = 0.0;
		body.vy = 0.0;
		self.reheat();
		Ok(at)
	}

	/// Releases a node; it moves freely again from the next step on.
	pub fn unpin(&mut self, id: &str) -> Result<()> {
		let i = self.lookup(id)?;
		self.bodies[i].pin = None;
		self.reheat();
		Ok(())
	}

	/// Whether `id` is currently fixed.
	pub fn is_pinned(&self, id: &str) -> bool {
		self.index
			.get(id)
			.is_some_and(|&i| self.bodies[i].pin.is_some())
	}

	/// Keeps alpha from decaying below `target`, e.g. while a node is dragged.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.clamp(0.0, 1.0);
		if self.state == SimulationState::Converged
			&& self.alpha_target >= self.config.alpha_min
			&& !self.all_pinned()
		{
			self.state = SimulationState::Running;
		}
	}

	/// Moves every node and pin inside the new viewport and reheats.
	pub fn resize(&mut self, viewport: Viewport) -> Result<()> {
		viewport.validate()?;
		self.viewport = viewport;
		for body in &mut self.bodies {
			if let Some(pin) = body.pin {
				body.pin = Some(viewport.clamp(pin, body.extent));
			}
			let at = viewport.clamp(Point::new(body.x, body.y), body.extent);
			body.x = at.x;
			body.y = at.y;
		}
		self.reheat();
		Ok(())
	}

	/// Halts the simulation for good.
	pub fn stop(&mut self) {
		if self.state != SimulationState::Stopped {
			debug!("simulation stopped at step {}", self.step);
		}
		self.state = SimulationState::Stopped;
	}

	/// Current lifecycle state.
	pub fn state(&self) -> SimulationState {
		self.state
	}

	/// Whether the next step emits a frame.
	pub fn is_running(&self) -> bool {
		self.state == SimulationState::Running
	}

	/// Current alpha.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Steps taken so far.
	pub fn steps(&self) -> u64 {
		self.step
	}

	/// Viewport nodes are kept inside.
	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	/// Forces and styles in use.
	pub fn config(&self) -> &LayoutConfig {
		&self.config
	}

	/// Current position of `id`.
	pub fn position(&self, id: &str) -> Option<Point> {
		let body = &self.bodies[*self.index.get(id)?];
		Some(Point::new(body.x, body.y))
	}

	/// Current positions, whether or not the simulation is still running.
	pub fn frame(&self) -> Frame {
		let nodes = self
			.ids
			.iter()
			.zip(&self.bodies)
			.map(|(id, body)| NodePosition {
				node_id: id.clone(),
				x: body.x,
				y: body.y,
			})
			.collect();
		let edges = self
			.segments
			.iter()
			.enumerate()
			.map(|(edge_index, &(s, t))| EdgeSegment {
				edge_index,
				source: self.ids[s].clone(),
				target: self.ids[t].clone(),
				x1: self.bodies[s].x,
				y1: self.bodies[s].y,
				x2: self.bodies[t].x,
				y2: self.bodies[t].y,
			})
			.collect();
		Frame {
			step: self.step,
			alpha: self.alpha,
			nodes,
			edges,
		}
	}

	fn lookup(&self, id: &str) -> Result<usize> {
		self.index
			.get(id)
			.copied()
			.ok_or_else(|| Error::UnknownNode(id.to_owned()))
	}

	fn all_pinned(&self) -> bool {
		self.bodies.iter().all(|b| b.pin.is_some())
	}

	fn reheat(&mut self) {
		if self.state == SimulationState::Stopped {
			return;
		}
		self.alpha = self.alpha.max(self.config.reheat_alpha);
		self.state = if self.all_pinned() {
			SimulationState::Converged
		} else {
			SimulationState::Running
		};
	}

	/// Pulls linked nodes toward `link_distance`, split by degree so hubs move less.
	fn apply_springs(&mut self) {
		let Self {
			springs,
			bodies,
			rng,
			config,
			alpha,
			..
		} = self;
		for spring in springs.iter() {
			let (s, t) = (&bodies[spring.source], &bodies[spring.target]);
			let mut dx = t.x + t.vx - s.x - s.vx;
			let mut dy = t.y + t.vy - s.y - s.vy;
			if dx == 0.0 {
				dx = rng.jiggle();
			}
			if dy == 0.0 {
				dy = rng.jiggle();
			}
			let l = (dx * dx + dy * dy).sqrt();
			let k = (l - config.link_distance) / l * *alpha * spring.strength;
			let (fx, fy) = (dx * k, dy * k);

			let target = &mut bodies[spring.target];
			target.vx -= fx * spring.bias;
			target.vy -= fy * spring.bias;
			let source = &mut bodies[spring.source];
			source.vx += fx * (1.0 - spring.bias);
			source.vy += fy * (1.0 - spring.bias);
		}
	}

	fn apply_charge(&mut self) {
		let strength = self.config.charge_strength * self.alpha;
		let n = self.bodies.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let mut dx = self.bodies[j].x - self.bodies[i].x;
				let mut dy = self.bodies[j].y - self.bodies[i].y;
				if dx == 0.0 {
					dx = self.rng.jiggle();
				}
				if dy == 0.0 {
					dy = self.rng.jiggle();
				}
				let mut l = dx * dx + dy * dy;
				if l == 0.0 {
					continue;
				}
				if l < CHARGE_DISTANCE_MIN2 {
					l = (CHARGE_DISTANCE_MIN2 * l).sqrt();
				}
				let (fx, fy) = (dx * strength / l, dy * strength / l);
				self.bodies[i].vx += fx;
				self.bodies[i].vy += fy;
				self.bodies[j].vx -= fx;
				self.bodies[j].vy -= fy;
			}
		}
	}

	/// Translates the free nodes so their mean moves toward the viewport center.
	fn apply_centering(&mut self) {
		let center = self.viewport.center();
		let (mut sx, mut sy, mut free) = (0.0, 0.0, 0usize);
		for body in self.bodies.iter().filter(|b| b.pin.is_none()) {
			sx += body.x;
			sy += body.y;
			free += 1;
		}
		if free == 0 {
			return;
		}
		let strength = self.config.centering_strength;
		let shift_x = (sx / free as f64 - center.x) * strength;
		let shift_y = (sy / free as f64 - center.y) * strength;
		for body in self.bodies.iter_mut().filter(|b| b.pin.is_none()) {
			body.x -= shift_x;
			body.y -= shift_y;
		}
	}

	/// Pushes apart nodes whose predicted positions overlap their collision radii.
	/// A pinned node does not move, so its partner takes the whole correction.
	fn apply_collisions(&mut self) {
		let n = self.bodies.len();
		for _ in 0..self.config.collision_iterations {
			for i in 0..n {
				for j in (i + 1)..n {
					let (a, b) = (&self.bodies[i], &self.bodies[j]);
					let (a_fixed, b_fixed) = (a.pin.is_some(), b.pin.is_some());
					if a_fixed && b_fixed {
						continue;
					}
					let (ri, rj) = (a.collision_radius, b.collision_radius);
					let r = ri + rj;
					let mut dx = (a.x + a.vx) - (b.x + b.vx);
					let mut dy = (a.y + a.vy) - (b.y + b.vy);
					let mut l = dx * dx + dy * dy;
					if l >= r * r {
						continue;
					}
					if dx == 0.0 {
						dx = self.rng.jiggle();
						l += dx * dx;
					}
					if dy == 0.0 {
						dy = self.rng.jiggle();
						l += dy * dy;
					}
					let d = l.sqrt();
					if d == 0.0 {
						continue;
					}
					let k = (r - d) / d * COLLISION_STRENGTH;
					let share = if a_fixed {
						0.0
					} else if b_fixed {
						1.0
					} else {
						(rj * rj) / (ri * ri + rj * rj)
					};
					self.bodies[i].vx += dx * k * share;
					self.bodies[i].vy += dy * k * share;
					self.bodies[j].vx -= dx * k * (1.0 - share);
					self.bodies[j].vy -= dy * k * (1.0 - share);
				}
			}
		}
	}

	/// Moves overlapping nodes apart along the line between them until no two are closer
	/// than their combined collision radii. Works on positions, so nothing is lost to
	/// velocity decay; clamping still applies to every move.
	fn separate(&mut self) {
		let n = self.bodies.len();
		for _ in 0..SEPARATION_PASSES {
			let mut moved = false;
			for i in 0..n {
				for j in (i + 1)..n {
					let (a, b) = (&self.bodies[i], &self.bodies[j]);
					let (a_fixed, b_fixed) = (a.pin.is_some(), b.pin.is_some());
					if a_fixed && b_fixed {
						continue;
					}
					let r = a.collision_radius + b.collision_radius;
					let (mut dx, mut dy) = (b.x - a.x, b.y - a.y);
					let mut d = (dx * dx + dy * dy).sqrt();
					if d >= r {
						continue;
					}
					if d == 0.0 {
						dx = self.rng.jiggle();
						dy = self.rng.jiggle();
						d = (dx * dx + dy * dy).sqrt();
						if d == 0.0 {
							continue;
						}
					}
					let push = r + SEPARATION_SLACK - d;
					let (ux, uy) = (dx / d * push, dy / d * push);
					let share = if a_fixed {
						0.0
					} else if b_fixed {
						1.0
					} else {
						0.5
					};
					self.shift(i, -ux * share, -uy * share);
					self.shift(j, ux * (1.0 - share), uy * (1.0 - share));
					moved = true;
				}
			}
			if !moved {
				return;
			}
		}
		debug!("overlaps left after {SEPARATION_PASSES} separation passes");
	}

	fn shift(&mut self, i: usize, dx: f64, dy: f64) {
		let viewport = self.viewport;
		let body = &mut self.bodies[i];
		if body.pin.is_some() {
			return;
		}
		let at = viewport.clamp(Point::new(body.x + dx, body.y + dy), body.extent);
		body.x = at.x;
		body.y = at.y;
	}

	fn integrate(&mut self) {
		let retain = 1.0 - self.config.velocity_decay;
		let viewport = self.viewport;
		for body in &mut self.bodies {
			if let Some(pin) = body.pin {
				body.x = pin.x;
				body.y = pin.y;
				body.vx = 0.0;
				body.vy = 0.0;
				continue;
			}
			body.vx *= retain;
			body.vy *= retain;
			let moved = Point::new(body.x + body.vx, body.y + body.vy);
			let at = viewport.clamp(moved, body.extent);
			if at.x != moved.x {
				body.vx = 0.0;
			}
			if at.y != moved.y {
				body.vy = 0.0;
			}
			body.x = at.x;
			body.y = at.y;
		}
	}
}
