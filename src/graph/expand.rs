//! Merging a freshly fetched batch into an existing graph.

use log::debug;
use serde::Serialize;

use super::builder::{EdgeChange, Ingest};
use super::config::BuildOptions;
use super::error::{AddressRole, GraphError, GraphResult};
use super::types::{Address, Position, TransactionGraph, TransactionRecord};

/// Result of [`TransactionGraph::expand`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ExpandOutcome {
	/// The address had been expanded before; nothing changed.
	AlreadyExpanded,
	/// The batch was merged.
	Merged {
		/// Nodes added.
		new_nodes: usize,
		/// Edges added.
		new_edges: usize,
		/// Existing edges that absorbed more records.
		updated_edges: usize,
	},
}

impl TransactionGraph {
	/// Merge the transactions of `address` into the graph.
	///
	/// New senders are stacked to the left of the expanded node, new
	/// recipients to the right. Transfers between pairs already in the graph
	/// are folded into the existing edge.
	pub fn expand(
		&mut self,
		address: &str,
		transactions: &[TransactionRecord],
		options: &BuildOptions,
	) -> GraphResult<ExpandOutcome> {
		options.validate()?;
		let address = Address::parse(address, options.min_address_len)?;
		if self.is_expanded(&address) {
			return Ok(ExpandOutcome::AlreadyExpanded);
		}
		let parent = self
			.node(address.as_str())
			.map(|n| n.position)
			.ok_or_else(|| GraphError::UnknownNode(address.to_string()))?;

		let (offset, gap) = (options.expansion_offset, options.expansion_row_gap);
		let (mut left, mut right) = (0_u32, 0_u32);
		let mut place = |role: AddressRole| match role {
			AddressRole::Sender => {
				let y = parent.y + f64::from(left) * gap;
				left += 1;
				Position::new(parent.x - offset, y)
			}
			AddressRole::Recipient => {
				let y = parent.y + f64::from(right) * gap;
				right += 1;
				Position::new(parent.x + offset, y)
			}
		};

		let nodes_before = self.nodes.len();
		let (mut new_edges, mut updated_edges) = (0, 0);
		let mut ingest = Ingest::new(self, options);
		for (i, tx) in transactions.iter().enumerate() {
			if let Some((source, target)) = ingest.admit(i, tx, &mut place) {
				match ingest.aggregate(tx, source, target) {
					EdgeChange::Created => new_edges += 1,
					EdgeChange::Updated => updated_edges += 1,
				}
			}
		}
		ingest.finish();

		let new_nodes = self.nodes.len() - nodes_before;
		debug!(
			"expanded {address}: {new_nodes} new nodes, {new_edges} new edges, {updated_edges} updates"
		);
		self.expanded.push(address);
		Ok(ExpandOutcome::Merged {
			new_nodes,
			new_edges,
			updated_edges,
		})
	}
}
