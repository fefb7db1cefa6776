use std::collections::HashSet;

use crate::graph::{Position, TransactionGraph};

pub const NODE_RADIUS: f64 = 9.0;
pub const HIT_RADIUS: f64 = 14.0;
pub const EDGE_HIT_DISTANCE: f64 = 6.0;
/// Share of the shorter canvas side the graph may occupy after fitting.
const FIT_FILL: f64 = 0.8;
/// Pointer travel (px) that turns a press into a pan rather than a click.
const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Position,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
	delay_t: f64,
}

/// Everything the canvas needs between frames. Positions stay in layout
/// space; `transform` maps them to canvas pixels.
pub struct GraphViewState {
	pub graph: TransactionGraph,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub selected_edge: Option<usize>,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	/// Resolved `(source, target)` node indices, parallel to `graph.edges`.
	links: Vec<Option<(usize, usize)>>,
}

impl GraphViewState {
	pub fn new(graph: TransactionGraph, width: f64, height: f64) -> Self {
		let mut state = Self {
			links: resolve_links(&graph),
			graph,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			selected_edge: None,
			width,
			height,
			flow_time: 0.0,
		};
		state.fit_to_view();
		state
	}

	/// Swap in a new graph, dropping any interaction tied to the old one.
	pub fn set_graph(&mut self, graph: TransactionGraph) {
		self.links = resolve_links(&graph);
		self.graph = graph;
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.hover = HoverState::default();
		self.selected_edge = None;
		self.fit_to_view();
	}

	pub fn links(&self) -> impl Iterator<Item = (usize, (usize, usize))> + '_ {
		self.links
			.iter()
			.enumerate()
			.filter_map(|(i, link)| link.map(|l| (i, l)))
	}

	/// Center the node bounding box and scale it to the canvas.
	pub fn fit_to_view(&mut self) {
		let mut nodes = self.graph.nodes.iter().map(|n| n.position);
		let Some(first) = nodes.next() else {
			return;
		};
		let (mut min, mut max) = (first, first);
		for p in nodes {
			min = Position::new(min.x.min(p.x), min.y.min(p.y));
			max = Position::new(max.x.max(p.x), max.y.max(p.y));
		}
		let extent = (max.x - min.x).max(max.y - min.y);
		let k = if extent > 1e-9 {
			self.width.min(self.height) * FIT_FILL / extent
		} else {
			1.0
		};
		let (cx, cy) = ((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
		self.transform = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
	}

	pub fn graph_to_screen(&self, p: Position) -> (f64, f64) {
		(
			p.x * self.transform.k + self.transform.x,
			p.y * self.transform.k + self.transform.y,
		)
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Position {
		Position::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_screen(&self, idx: usize) -> Option<(f64, f64)> {
		self.graph
			.nodes
			.get(idx)
			.map(|n| self.graph_to_screen(n.position))
	}

	/// Topmost node under the pointer. Nodes keep a fixed pixel size.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let mut found = None;
		for (idx, node) in self.graph.nodes.iter().enumerate() {
			let (x, y) = self.graph_to_screen(node.position);
			let (dx, dy) = (x - sx, y - sy);
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS {
				found = Some(idx);
			}
		}
		found
	}

	/// Closest edge segment within [`EDGE_HIT_DISTANCE`] pixels.
	pub fn edge_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let mut best: Option<(usize, f64)> = None;
		for (i, (s, t)) in self.links() {
			if s == t {
				continue;
			}
			let (Some(a), Some(b)) = (self.node_screen(s), self.node_screen(t)) else {
				continue;
			};
			let d = segment_distance((sx, sy), a, b);
			if d <= EDGE_HIT_DISTANCE && best.is_none_or(|(_, bd)| d < bd) {
				best = Some((i, d));
			}
		}
		best.map(|(i, _)| i)
	}

	pub fn begin_drag(&mut self, idx: usize, sx: f64, sy: f64) {
		let Some(node) = self.graph.nodes.get(idx) else {
			return;
		};
		self.drag = DragState {
			active: true,
			node_idx: Some(idx),
			start_x: sx,
			start_y: sy,
			node_start: node.position,
		};
	}

	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let Some(idx) = self.drag.node_idx.filter(|_| self.drag.active) else {
			return;
		};
		let (from, to) = (
			self.screen_to_graph(self.drag.start_x, self.drag.start_y),
			self.screen_to_graph(sx, sy),
		);
		let target = Position::new(
			self.drag.node_start.x + to.x - from.x,
			self.drag.node_start.y + to.y - from.y,
		);
		if let Some(node) = self.graph.nodes.get_mut(idx) {
			node.position = target;
		}
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			moved: false,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if !self.pan.active {
			return;
		}
		let (dx, dy) = (sx - self.pan.start_x, sy - self.pan.start_y);
		if dx.abs() > CLICK_SLOP || dy.abs() > CLICK_SLOP {
			self.pan.moved = true;
		}
		self.transform.x = self.pan.transform_start_x + dx;
		self.transform.y = self.pan.transform_start_y + dy;
	}

	pub fn end_interaction(&mut self) {
		self.drag.active = false;
		self.drag.node_idx = None;
		self.pan.active = false;
	}

	/// Zoom by `factor` keeping the point under the pointer fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(0.05, 200.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Keep the previous highlight for the fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			let neighbors: Vec<usize> = self
				.links()
				.filter_map(|(_, (s, t))| {
					if s == idx {
						Some(t)
					} else if t == idx {
						Some(s)
					} else {
						None
					}
				})
				.collect();
			self.hover.neighbors.extend(neighbors);
		}
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	/// Advance the edge flow and hover fade. Layout is static between graphs.
	pub fn tick(&mut self, dt: f64) {
		self.flow_time += dt;

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
		self.fit_to_view();
	}
}

fn resolve_links(graph: &TransactionGraph) -> Vec<Option<(usize, usize)>> {
	let index = |id: &str| graph.nodes.iter().position(|n| n.id.as_str() == id);
	graph
		.edges
		.iter()
		.map(|e| index(e.source.as_str()).zip(index(e.target.as_str())))
		.collect()
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (abx, aby) = (b.0 - a.0, b.1 - a.1);
	let len_sq = abx * abx + aby * aby;
	let t = if len_sq > 0.0 {
		(((p.0 - a.0) * abx + (p.1 - a.1) * aby) / len_sq).clamp(0.0, 1.0)
	} else {
		0.0
	};
	let (cx, cy) = (a.0 + abx * t, a.1 + aby * t);
	((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{GraphResult, TransactionRecord, build_graph, simulate_layout};

	fn triangle() -> GraphResult<TransactionGraph> {
		let txs = [
			TransactionRecord::new("0xaaa", "0xbbb", 1.0),
			TransactionRecord::new("0xbbb", "0xccc", 2.0),
		];
		Ok(simulate_layout(build_graph(&txs, "0xaaa")?))
	}

	#[test]
	fn test_fit_keeps_nodes_on_canvas() -> GraphResult<()> {
		let state = GraphViewState::new(triangle()?, 800.0, 600.0);
		for idx in 0..state.graph.nodes.len() {
			let (x, y) = state.node_screen(idx).unwrap_or((-1.0, -1.0));
			assert!((0.0..=800.0).contains(&x) && (0.0..=600.0).contains(&y));
		}
		Ok(())
	}

	#[test]
	fn test_screen_round_trip() -> GraphResult<()> {
		let state = GraphViewState::new(triangle()?, 800.0, 600.0);
		let p = state.graph.nodes[1].position;
		let (sx, sy) = state.graph_to_screen(p);
		let back = state.screen_to_graph(sx, sy);
		assert!(back.distance_to(&p) < 1e-9);
		Ok(())
	}

	#[test]
	fn test_hit_testing() -> GraphResult<()> {
		let state = GraphViewState::new(triangle()?, 800.0, 600.0);
		let (x, y) = state.node_screen(2).unwrap_or_default();
		assert_eq!(state.node_at_position(x + 2.0, y), Some(2));

		let (ax, ay) = state.node_screen(0).unwrap_or_default();
		let (bx, by) = state.node_screen(1).unwrap_or_default();
		let edge = state.edge_at_position((ax + bx) / 2.0, (ay + by) / 2.0);
		assert_eq!(edge, Some(0));
		Ok(())
	}

	#[test]
	fn test_hover_collects_neighbors() -> GraphResult<()> {
		let mut state = GraphViewState::new(triangle()?, 800.0, 600.0);
		state.set_hover(Some(1));
		assert!(state.is_highlighted(0) && state.is_highlighted(2));
		state.set_hover(None);
		assert!(state.has_active_highlight());
		state.tick(10.0);
		assert!(!state.has_active_highlight());
		Ok(())
	}

	#[test]
	fn test_drag_moves_node_in_graph_space() -> GraphResult<()> {
		let mut state = GraphViewState::new(triangle()?, 800.0, 600.0);
		let start = state.graph.nodes[1].position;
		let (x, y) = state.node_screen(1).unwrap_or_default();
		state.begin_drag(1, x, y);
		state.drag_to(x + state.transform.k, y);
		assert!((state.graph.nodes[1].position.x - (start.x + 1.0)).abs() < 1e-9);
		state.end_interaction();
		assert!(!state.drag.active);
		Ok(())
	}

	#[test]
	fn test_set_graph_resets_interaction() -> GraphResult<()> {
		let mut state = GraphViewState::new(triangle()?, 800.0, 600.0);
		state.selected_edge = Some(1);
		state.set_hover(Some(0));
		state.set_graph(build_graph(&[], "0xaaa")?);
		assert_eq!(state.selected_edge, None);
		assert!(!state.has_active_highlight());
		assert_eq!(state.links().count(), 0);
		Ok(())
	}
}
