//! Transaction list -> node/edge graph.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use log::{debug, warn};

use super::config::{BuildOptions, RingSpacing, SelfLoopPolicy};
use super::error::{AddressRole, GraphError, GraphResult, GraphWarning};
use super::types::{
	Address, GraphEdge, GraphNode, NodeKind, Position, TransactionGraph, TransactionRecord,
};

/// Build a graph around `central` with [`BuildOptions::default`].
pub fn build_graph(
	transactions: &[TransactionRecord],
	central: &str,
) -> GraphResult<TransactionGraph> {
	GraphBuilder::default().build(transactions, central)
}

/// Deduplicates addresses into nodes and aggregates transfers into edges.
#[derive(Clone, Debug, Default)]
pub struct GraphBuilder {
	options: BuildOptions,
}

impl GraphBuilder {
	/// A builder using `options`.
	pub fn new(options: BuildOptions) -> Self {
		Self { options }
	}

	/// Options in use.
	pub fn options(&self) -> &BuildOptions {
		&self.options
	}

	/// Build a fresh graph. Only the central address can make this fail;
	/// bad records end up in [`TransactionGraph::warnings`].
	pub fn build(
		&self,
		transactions: &[TransactionRecord],
		central: &str,
	) -> GraphResult<TransactionGraph> {
		self.options.validate()?;
		if central.trim().is_empty() {
			return Err(GraphError::MissingCentralAddress);
		}
		let central = Address::parse(central, self.options.min_address_len)?;
		let mut graph = TransactionGraph::new(central);

		let step = self.angle_step(transactions, &graph.central);
		let radius = self.options.ring_radius;
		let mut angle = 0.0_f64;
		let mut place = |_: AddressRole| {
			let position = Position::new(angle.cos() * radius, angle.sin() * radius);
			angle += step;
			position
		};

		let mut ingest = Ingest::new(&mut graph, &self.options);
		for (i, tx) in transactions.iter().enumerate() {
			if let Some((source, target)) = ingest.admit(i, tx, &mut place) {
				ingest.aggregate(tx, source, target);
			}
		}
		ingest.finish();

		debug!(
			"built graph for {}: {} nodes, {} edges, {} warnings from {} transactions",
			graph.central,
			graph.nodes.len(),
			graph.edges.len(),
			graph.warnings.len(),
			transactions.len()
		);
		Ok(graph)
	}

	fn angle_step(&self, transactions: &[TransactionRecord], central: &Address) -> f64 {
		let slots = match self.options.ring_spacing {
			RingSpacing::PerTransaction => transactions.len(),
			RingSpacing::PerNode => self.peripheral_count(transactions, central),
		};
		if slots == 0 {
			return 0.0;
		}
		2.0 * PI / slots as f64
	}

	fn peripheral_count(&self, transactions: &[TransactionRecord], central: &Address) -> usize {
		let min_len = self.options.min_address_len;
		let mut seen = HashSet::new();
		for tx in transactions.iter().filter(|tx| tx.amount.is_finite()) {
			let (Ok(sender), Ok(recipient)) = (
				Address::parse(&tx.sender, min_len),
				Address::parse(&tx.recipient, min_len),
			) else {
				// Matches `Ingest::admit`: the valid side still becomes a node.
				for raw in [&tx.sender, &tx.recipient] {
					if let Ok(address) = Address::parse(raw, min_len) {
						seen.insert(address);
					}
				}
				continue;
			};
			if sender == recipient && self.options.self_loops == SelfLoopPolicy::Skip {
				continue;
			}
			seen.insert(sender);
			seen.insert(recipient);
		}
		seen.remove(central);
		seen.len()
	}
}

/// Incremental node/edge indexer shared by building and expansion.
pub(crate) struct Ingest<'a> {
	graph: &'a mut TransactionGraph,
	options: &'a BuildOptions,
	nodes: HashMap<Address, usize>,
	edges: HashMap<(Address, Address), usize>,
}

/// What [`Ingest::aggregate`] did with a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EdgeChange {
	Created,
	Updated,
}

impl<'a> Ingest<'a> {
	pub(crate) fn new(graph: &'a mut TransactionGraph, options: &'a BuildOptions) -> Self {
		let nodes = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();
		let edges = graph
			.edges
			.iter()
			.enumerate()
			.map(|(i, e)| ((e.source.clone(), e.target.clone()), i))
			.collect();
		Self {
			graph,
			options,
			nodes,
			edges,
		}
	}

	/// Validate a record and create nodes for its valid endpoints.
	///
	/// Returns the canonical `(sender, recipient)` pair when the record should
	/// contribute to an edge. `place` is asked for a position only when a new
	/// peripheral node is created.
	pub(crate) fn admit(
		&mut self,
		record: usize,
		tx: &TransactionRecord,
		place: &mut dyn FnMut(AddressRole) -> Position,
	) -> Option<(Address, Address)> {
		if !tx.amount.is_finite() {
			self.warn(GraphWarning::InvalidAmount {
				record,
				amount: tx.amount,
			});
			return None;
		}

		let sender = self.resolve(record, &tx.sender, AddressRole::Sender);
		let recipient = self.resolve(record, &tx.recipient, AddressRole::Recipient);

		if let (Some(s), Some(r)) = (&sender, &recipient) {
			if s == r && self.options.self_loops == SelfLoopPolicy::Skip {
				self.warn(GraphWarning::SelfLoopSkipped {
					record,
					address: s.to_string(),
				});
				return None;
			}
		}

		if let Some(address) = &sender {
			self.ensure_node(address, AddressRole::Sender, place);
		}
		if let Some(address) = &recipient {
			self.ensure_node(address, AddressRole::Recipient, place);
		}
		sender.zip(recipient)
	}

	pub(crate) fn aggregate(
		&mut self,
		tx: &TransactionRecord,
		source: Address,
		target: Address,
	) -> EdgeChange {
		let key = (source, target);
		if let Some(&idx) = self.edges.get(&key) {
			if let Some(edge) = self.graph.edges.get_mut(idx) {
				edge.record(tx);
			}
			return EdgeChange::Updated;
		}
		let mut edge = GraphEdge::new(key.0.clone(), key.1.clone());
		edge.record(tx);
		self.edges.insert(key, self.graph.edges.len());
		self.graph.edges.push(edge);
		EdgeChange::Created
	}

	/// Re-render edge labels after aggregation.
	pub(crate) fn finish(self) {
		for edge in &mut self.graph.edges {
			edge.relabel(&self.options.amount_unit);
		}
	}

	fn resolve(&mut self, record: usize, raw: &str, role: AddressRole) -> Option<Address> {
		match Address::parse(raw, self.options.min_address_len) {
			Ok(address) => Some(address),
			Err(_) => {
				self.warn(GraphWarning::InvalidAddress {
					record,
					role,
					raw: raw.to_string(),
				});
				None
			}
		}
	}

	fn ensure_node(
		&mut self,
		address: &Address,
		role: AddressRole,
		place: &mut dyn FnMut(AddressRole) -> Position,
	) {
		if self.nodes.contains_key(address) {
			return;
		}
		let (kind, position) = if *address == self.graph.central {
			(NodeKind::Central, Position::ORIGIN)
		} else {
			(NodeKind::Peripheral, place(role))
		};
		self.nodes.insert(address.clone(), self.graph.nodes.len());
		self.graph
			.nodes
			.push(GraphNode::new(address.clone(), kind, position));
	}

	fn warn(&mut self, warning: GraphWarning) {
		warn!("{warning}");
		self.graph.warnings.push(warning);
	}
}
