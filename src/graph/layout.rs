//! Force-directed layout.
//!
//! Each iteration runs three passes over a flat position arena indexed like
//! `graph.nodes`: all-pairs repulsion, logarithmic attraction along edges, and
//! a clamp. Updates inside a pass are applied immediately, so later pairs see
//! the effect of earlier ones.

use std::collections::HashMap;

use log::{debug, warn};
use serde::Serialize;

use super::config::{ClampMode, LayoutParameters};
use super::error::GraphResult;
use super::types::{Position, TransactionGraph};

/// Lay out `graph` with [`LayoutParameters::default`].
pub fn simulate_layout(mut graph: TransactionGraph) -> TransactionGraph {
	ForceLayout::default().run(&mut graph);
	graph
}

/// Summary of one simulation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LayoutStats {
	/// Iterations actually executed.
	pub iterations: usize,
	/// Edges ignored because an endpoint is not in the node list.
	pub skipped_edges: usize,
	/// The run stopped on the convergence threshold.
	pub converged: bool,
}

/// Deterministic force-directed layout over a [`TransactionGraph`].
#[derive(Clone, Debug, Default)]
pub struct ForceLayout {
	params: LayoutParameters,
}

impl ForceLayout {
	/// Validate `params` and wrap them.
	pub fn new(params: LayoutParameters) -> GraphResult<Self> {
		params.validate()?;
		Ok(Self { params })
	}

	/// Parameters in use.
	pub fn params(&self) -> &LayoutParameters {
		&self.params
	}

	/// Move node positions in place. Nodes and edges are neither added nor removed.
	pub fn run(&self, graph: &mut TransactionGraph) -> LayoutStats {
		let (springs, skipped_edges) = resolve_springs(graph);
		let mut positions: Vec<Position> = graph.nodes.iter().map(|n| n.position).collect();
		let mut stats = LayoutStats {
			skipped_edges,
			..Default::default()
		};

		for _ in 0..self.params.iterations {
			let before = positions.clone();
			self.repulse(&mut positions);
			self.attract(&mut positions, &springs);
			self.clamp(&mut positions, &before);
			stats.iterations += 1;

			if let Some(threshold) = self.params.convergence_threshold {
				let moved = max_movement(&before, &positions);
				if moved < threshold {
					stats.converged = true;
					break;
				}
			}
		}

		for (node, position) in graph.nodes.iter_mut().zip(positions) {
			node.position = position;
		}
		debug!(
			"layout of {} nodes / {} springs: {} iterations, converged={}",
			graph.nodes.len(),
			springs.len(),
			stats.iterations,
			stats.converged
		);
		stats
	}

	fn repulse(&self, positions: &mut [Position]) {
		let n = positions.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let (dx, dy) = (
					positions[j].x - positions[i].x,
					positions[j].y - positions[i].y,
				);
				let distance_sq = dx * dx + dy * dy;
				if distance_sq == 0.0 {
					continue;
				}
				let force = self.params.repulsion / distance_sq.sqrt();
				let (fx, fy) = (force * dx / distance_sq, force * dy / distance_sq);
				// Subnormal separations overflow the force to infinity.
				if !(fx.is_finite() && fy.is_finite()) {
					continue;
				}

				positions[i].x -= fx;
				positions[i].y -= fy;
				positions[j].x += fx;
				positions[j].y += fy;
			}
		}
	}

	fn attract(&self, positions: &mut [Position], springs: &[(usize, usize)]) {
		for &(s, t) in springs {
			let (dx, dy) = (
				positions[t].x - positions[s].x,
				positions[t].y - positions[s].y,
			);
			let distance = (dx * dx + dy * dy).sqrt();
			// Self-loops and coincident endpoints have no direction.
			if distance == 0.0 {
				continue;
			}
			let force = self.params.attraction * (distance + 1.0).ln();
			let (fx, fy) = (force * dx / distance, force * dy / distance);

			positions[s].x += fx;
			positions[s].y += fy;
			positions[t].x -= fx;
			positions[t].y -= fy;
		}
	}

	fn clamp(&self, positions: &mut [Position], before: &[Position]) {
		let max = self.params.max_displacement;
		match self.params.clamp {
			ClampMode::Origin => {
				for p in positions.iter_mut() {
					let magnitude = p.magnitude();
					if magnitude > max {
						let scale = max / magnitude;
						p.x *= scale;
						p.y *= scale;
					}
				}
			}
			ClampMode::Displacement => {
				for (p, start) in positions.iter_mut().zip(before) {
					let (dx, dy) = (p.x - start.x, p.y - start.y);
					let moved = (dx * dx + dy * dy).sqrt();
					if moved > max {
						let scale = max / moved;
						p.x = start.x + dx * scale;
						p.y = start.y + dy * scale;
					}
				}
			}
		}
	}
}

/// Edge endpoints as arena indices. Edges with an unknown endpoint are dropped.
fn resolve_springs(graph: &TransactionGraph) -> (Vec<(usize, usize)>, usize) {
	let index: HashMap<&str, usize> = graph
		.nodes
		.iter()
		.enumerate()
		.map(|(i, n)| (n.id.as_str(), i))
		.collect();

	let mut springs = Vec::with_capacity(graph.edges.len());
	let mut skipped = 0;
	for edge in &graph.edges {
		match (
			index.get(edge.source.as_str()),
			index.get(edge.target.as_str()),
		) {
			(Some(&s), Some(&t)) => springs.push((s, t)),
			_ => {
				warn!("edge {} has an endpoint outside the node set, ignoring it", edge.id);
				skipped += 1;
			}
		}
	}
	(springs, skipped)
}

fn max_movement(before: &[Position], after: &[Position]) -> f64 {
	before
		.iter()
		.zip(after)
		.map(|(a, b)| a.distance_to(b))
		.fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::builder::build_graph;
	use crate::graph::types::{Address, GraphEdge, GraphNode, NodeKind, TransactionRecord};

	const EPSILON: f64 = 1e-9;

	fn node(id: &str, x: f64, y: f64) -> GraphResult<GraphNode> {
		Ok(GraphNode::new(Address::parse(id, 3)?, NodeKind::Peripheral, Position::new(x, y)))
	}

	fn edge(source: &str, target: &str) -> GraphResult<GraphEdge> {
		Ok(GraphEdge::new(Address::parse(source, 3)?, Address::parse(target, 3)?))
	}

	fn star(n: usize) -> GraphResult<TransactionGraph> {
		let txs: Vec<TransactionRecord> = (0..n)
			.map(|i| TransactionRecord::new("0xcenter", format!("0xpeer{i}"), 1.0))
			.collect();
		build_graph(&txs, "0xcenter")
	}

	#[test]
	fn test_single_node_is_noop() -> GraphResult<()> {
		let graph = build_graph(&[], "0xaaa")?;
		let laid_out = simulate_layout(graph.clone());
		assert_eq!(laid_out, graph);
		Ok(())
	}

	#[test]
	fn test_repulsion_pushes_pair_apart_symmetrically() -> GraphResult<()> {
		let layout = ForceLayout::default();
		let mut positions = vec![Position::new(-1.0, 0.0), Position::new(1.0, 0.0)];
		layout.repulse(&mut positions);
		// d² = 4, force = 20000 / 2, fx = force * 2 / 4 = 5000.
		assert!((positions[0].x + 5001.0).abs() < EPSILON);
		assert!((positions[1].x - 5001.0).abs() < EPSILON);
		assert_eq!(positions[0].y, 0.0);
		Ok(())
	}

	#[test]
	fn test_repulsion_skips_coincident_nodes() {
		let layout = ForceLayout::default();
		let mut positions = vec![Position::new(3.0, 3.0), Position::new(3.0, 3.0)];
		layout.repulse(&mut positions);
		assert_eq!(positions, vec![Position::new(3.0, 3.0); 2]);
	}

	#[test]
	fn test_repulsion_skips_overflowing_pairs() -> GraphResult<()> {
		let mut graph = TransactionGraph::new(Address::parse("0xaaa", 3)?);
		graph.nodes.push(node("0xbbb", 1e-160, 0.0)?);
		let laid_out = simulate_layout(graph);
		for n in &laid_out.nodes {
			assert!(n.position.x.is_finite() && n.position.y.is_finite(), "{} diverged", n.id);
		}
		Ok(())
	}

	#[test]
	fn test_attraction_is_logarithmic() {
		let layout = ForceLayout::default();
		let mut positions = vec![Position::new(0.0, 0.0), Position::new(100.0, 0.0)];
		layout.attract(&mut positions, &[(0, 1)]);
		let expected = 0.05 * 101.0_f64.ln();
		assert!((positions[0].x - expected).abs() < EPSILON);
		assert!((positions[1].x - (100.0 - expected)).abs() < EPSILON);
	}

	#[test]
	fn test_attraction_ignores_isolated_and_zero_length() {
		let layout = ForceLayout::default();
		let mut positions = vec![
			Position::new(0.0, 0.0),
			Position::new(50.0, 0.0),
			Position::new(-7.0, 9.0),
		];
		// 0 <-> 1 spring plus a self-loop on 1; node 2 has no edges.
		layout.attract(&mut positions, &[(0, 1), (1, 1)]);
		assert_eq!(positions[2], Position::new(-7.0, 9.0));
		assert!(positions.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
	}

	#[test]
	fn test_origin_clamp_bounds_every_node() -> GraphResult<()> {
		let graph = simulate_layout(star(12)?);
		for n in &graph.nodes {
			assert!(n.position.magnitude() <= 10.0 + 1e-9, "{} escaped", n.id);
			assert!(n.position.x.is_finite() && n.position.y.is_finite());
		}
		Ok(())
	}

	#[test]
	fn test_displacement_clamp_limits_step() -> GraphResult<()> {
		let layout = ForceLayout::new(LayoutParameters {
			clamp: ClampMode::Displacement,
			iterations: 1,
			..Default::default()
		})?;
		let mut graph = TransactionGraph::new(Address::parse("0xaaa", 3)?);
		graph.nodes.push(node("0xbbb", 1.0, 0.0)?);
		let before: Vec<Position> = graph.nodes.iter().map(|n| n.position).collect();
		layout.run(&mut graph);
		for (n, start) in graph.nodes.iter().zip(&before) {
			assert!(n.position.distance_to(start) <= 10.0 + 1e-9);
		}
		// Far from the origin is allowed in this mode.
		assert!(graph.nodes[1].position.x > 10.0);
		Ok(())
	}

	#[test]
	fn test_dangling_edge_is_skipped() -> GraphResult<()> {
		let mut graph = TransactionGraph::new(Address::parse("0xaaa", 3)?);
		graph.nodes.push(node("0xbbb", 100.0, 0.0)?);
		graph.edges.push(edge("0xaaa", "0xzzz")?);
		graph.edges.push(edge("0xaaa", "0xbbb")?);
		let stats = ForceLayout::default().run(&mut graph);
		assert_eq!(stats.skipped_edges, 1);
		assert_eq!(stats.iterations, 200);
		assert_eq!(graph.edges.len(), 2);
		Ok(())
	}

	#[test]
	fn test_layout_is_deterministic() -> GraphResult<()> {
		let a = simulate_layout(star(9)?);
		let b = simulate_layout(star(9)?);
		assert_eq!(a, b);
		Ok(())
	}

	#[test]
	fn test_convergence_exit() -> GraphResult<()> {
		let layout = ForceLayout::new(LayoutParameters {
			repulsion: 0.0,
			attraction: 0.0,
			convergence_threshold: Some(1e-6),
			..Default::default()
		})?;
		let mut graph = star(3)?;
		let stats = layout.run(&mut graph);
		// First iteration clamps the ring onto the disc, the second moves nothing.
		assert!(stats.converged);
		assert_eq!(stats.iterations, 2);
		Ok(())
	}

	#[test]
	fn test_invalid_parameters_rejected() {
		let params = LayoutParameters {
			max_displacement: -1.0,
			..Default::default()
		};
		assert!(ForceLayout::new(params).is_err());
	}
}
