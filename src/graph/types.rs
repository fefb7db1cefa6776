//! Addresses, transaction records and the graph they become.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::{GraphError, GraphResult, GraphWarning};

/// Records shown per page in an edge detail panel.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 4;

/// Canonical (trimmed, lowercase) account address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
	/// The canonical spelling of `raw` without any validation.
	///
	/// Everything that compares addresses goes through this, so filters and
	/// tallies agree with the nodes the builder creates.
	pub fn canonical(raw: &str) -> String {
		raw.trim().to_lowercase()
	}

	/// Normalise `raw` and reject it when shorter than `min_len` characters.
	pub fn parse(raw: &str, min_len: usize) -> GraphResult<Self> {
		let canonical = Self::canonical(raw);
		if canonical.is_empty() {
			return Err(GraphError::InvalidAddress {
				raw: raw.to_string(),
				reason: "empty".into(),
			});
		}
		let len = canonical.chars().count();
		if len < min_len {
			return Err(GraphError::InvalidAddress {
				raw: raw.to_string(),
				reason: format!("{len} characters, need at least {min_len}"),
			});
		}
		Ok(Self(canonical))
	}

	/// The canonical string.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Display truncation, `0x1234...abcd`. Short addresses are shown whole.
	pub fn short_label(&self) -> String {
		let chars: Vec<char> = self.0.chars().collect();
		if chars.len() <= 10 {
			return self.0.clone();
		}
		let head: String = chars[..6].iter().collect();
		let tail: String = chars[chars.len() - 4..].iter().collect();
		format!("{head}...{tail}")
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for Address {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// A transfer as supplied by the transaction service.
///
/// Addresses are kept exactly as received; canonicalisation happens when the
/// record enters the graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
	/// Sending address, as received.
	#[serde(rename = "from")]
	pub sender: String,
	/// Receiving address, as received.
	#[serde(rename = "to")]
	pub recipient: String,
	/// Transferred value in the chain's main unit.
	#[serde(deserialize_with = "number_or_string")]
	pub amount: f64,
	/// Unix seconds.
	#[serde(deserialize_with = "number_or_string")]
	pub timestamp: i64,
	/// Transaction hash.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hash: Option<String>,
	/// Block number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub block: Option<String>,
	/// Fee paid, preformatted by the service.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fee: Option<String>,
}

impl TransactionRecord {
	/// Minimal record, mostly useful for fixtures.
	pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
		Self {
			sender: sender.into(),
			recipient: recipient.into(),
			amount,
			timestamp: 0,
			hash: None,
			block: None,
			fee: None,
		}
	}

	/// Builder-style timestamp setter.
	pub fn at(mut self, timestamp: i64) -> Self {
		self.timestamp = timestamp;
		self
	}

	/// Builder-style hash setter.
	pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
		self.hash = Some(hash.into());
		self
	}

	/// Timestamp as a UTC date, `None` when out of range.
	pub fn time(&self) -> Option<DateTime<Utc>> {
		DateTime::from_timestamp(self.timestamp, 0)
	}
}

// The Python backend sends numbers as strings; the proxy route parses them.
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: std::str::FromStr + Deserialize<'de>,
	T::Err: fmt::Display,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw<T> {
		Number(T),
		Text(String),
	}

	match Raw::<T>::deserialize(deserializer)? {
		Raw::Number(value) => Ok(value),
		Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
	}
}

/// Role of a node in the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NodeKind {
	/// The queried address.
	Central,
	/// A counterparty.
	Peripheral,
}

/// A point in layout space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Position {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Position {
	/// The coordinate origin.
	pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

	/// A point at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Distance from the origin.
	pub fn magnitude(&self) -> f64 {
		(self.x * self.x + self.y * self.y).sqrt()
	}

	/// Euclidean distance to `other`.
	pub fn distance_to(&self, other: &Position) -> f64 {
		let (dx, dy) = (other.x - self.x, other.y - self.y);
		(dx * dx + dy * dy).sqrt()
	}
}

/// One address in the graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphNode {
	/// Canonical address, unique within a graph.
	pub id: Address,
	/// Central or peripheral.
	pub kind: NodeKind,
	/// Layout coordinates.
	pub position: Position,
	/// Truncated address for display.
	pub label: String,
}

impl GraphNode {
	/// A node labelled with the short form of `id`.
	pub fn new(id: Address, kind: NodeKind, position: Position) -> Self {
		let label = id.short_label();
		Self {
			id,
			kind,
			position,
			label,
		}
	}

	/// This is the queried address.
	pub fn is_central(&self) -> bool {
		self.kind == NodeKind::Central
	}
}

/// All transfers between one ordered pair of addresses.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphEdge {
	/// `e{source}-{target}`.
	pub id: String,
	/// Sending address.
	pub source: Address,
	/// Receiving address.
	pub target: Address,
	/// Sum of every aggregated amount.
	pub total_amount: f64,
	/// Rendered total, e.g. `5.0000 ETH`.
	pub label: String,
	/// Aggregated records in input order.
	pub transaction_refs: Vec<TransactionRecord>,
}

impl GraphEdge {
	pub(crate) fn new(source: Address, target: Address) -> Self {
		Self {
			id: format!("e{source}-{target}"),
			source,
			target,
			total_amount: 0.0,
			label: String::new(),
			transaction_refs: Vec::new(),
		}
	}

	pub(crate) fn record(&mut self, tx: &TransactionRecord) {
		self.total_amount += tx.amount;
		self.transaction_refs.push(tx.clone());
	}

	pub(crate) fn relabel(&mut self, unit: &str) {
		self.label = format!("{:.4} {unit}", self.total_amount);
	}

	/// Source and target coincide.
	pub fn is_self_loop(&self) -> bool {
		self.source == self.target
	}

	/// Number of detail pages; at least one even when empty.
	pub fn page_count(&self, per_page: usize) -> usize {
		if per_page == 0 {
			return 1;
		}
		self.transaction_refs.len().div_ceil(per_page).max(1)
	}

	/// Records on the 1-based `page`. Out-of-range pages are empty.
	pub fn transactions_page(&self, page: usize, per_page: usize) -> &[TransactionRecord] {
		let Some(start) = page.checked_sub(1).map(|p| p.saturating_mul(per_page)) else {
			return &[];
		};
		let refs = &self.transaction_refs;
		if start >= refs.len() {
			return &[];
		}
		let end = start.saturating_add(per_page).min(refs.len());
		&refs[start..end]
	}
}

/// Nodes and edges built from a transaction batch, ready for layout.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransactionGraph {
	/// The queried address.
	pub central: Address,
	/// Nodes; the central one is always present.
	pub nodes: Vec<GraphNode>,
	/// One edge per ordered address pair.
	pub edges: Vec<GraphEdge>,
	/// Per-record anomalies met while building or expanding.
	pub warnings: Vec<GraphWarning>,
	/// Addresses whose transactions have been merged, in merge order.
	pub expanded: Vec<Address>,
}

impl TransactionGraph {
	/// A graph holding only the central node at the origin.
	pub fn new(central: Address) -> Self {
		let node = GraphNode::new(central.clone(), NodeKind::Central, Position::ORIGIN);
		Self {
			expanded: vec![central.clone()],
			central,
			nodes: vec![node],
			edges: Vec::new(),
			warnings: Vec::new(),
		}
	}

	/// Node with canonical id `id`.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id.as_str() == id)
	}

	/// Edge from `source` to `target`, both canonical.
	pub fn edge(&self, source: &str, target: &str) -> Option<&GraphEdge> {
		self.edges
			.iter()
			.find(|e| e.source.as_str() == source && e.target.as_str() == target)
	}

	/// Edge with the given `id`.
	pub fn edge_by_id(&self, id: &str) -> Option<&GraphEdge> {
		self.edges.iter().find(|e| e.id == id)
	}

	/// Transactions of `address` have already been merged.
	pub fn is_expanded(&self, address: &Address) -> bool {
		self.expanded.contains(address)
	}
}
