//! Transaction-graph core: turns a list of transfers around one address into
//! a node/edge graph and lays it out with a force-directed simulation.
//!
//! Everything here is synchronous and owns its data. The canvas component is
//! one consumer; any renderer that can draw [`TransactionGraph`] works.
//!
//! ```
//! use tx_graph_explorer::graph::{build_graph, simulate_layout, TransactionRecord};
//!
//! let txs = [
//! 	TransactionRecord::new("0xA", "0xB", 2.0),
//! 	TransactionRecord::new("0xA", "0xB", 3.0),
//! ];
//! let graph = simulate_layout(build_graph(&txs, "0xA")?);
//! assert_eq!(graph.nodes.len(), 2);
//! assert_eq!(graph.edges[0].total_amount, 5.0);
//! # Ok::<(), tx_graph_explorer::graph::GraphError>(())
//! ```

pub mod analysis;
pub mod builder;
pub mod config;
pub mod error;
pub mod expand;
pub mod filter;
pub mod layout;
pub mod records;
pub mod types;

pub use analysis::{CounterpartyStats, FlowSummary, top_counterparties};
pub use builder::{GraphBuilder, build_graph};
pub use config::{BuildOptions, ClampMode, LayoutParameters, RingSpacing, SelfLoopPolicy};
pub use error::{AddressRole, GraphError, GraphResult, GraphWarning};
pub use expand::ExpandOutcome;
pub use filter::{FlowDirection, TransactionFilter};
pub use layout::{ForceLayout, LayoutStats, simulate_layout};
pub use records::parse_transactions_response;
pub use types::{
	Address, DEFAULT_ITEMS_PER_PAGE, GraphEdge, GraphNode, NodeKind, Position, TransactionGraph,
	TransactionRecord,
};
