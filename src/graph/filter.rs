//! Pre-build narrowing of a transaction batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Address, TransactionRecord};

/// Which transfers to keep relative to the central address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
	/// Every transfer.
	#[default]
	All,
	/// Central address is the recipient.
	Incoming,
	/// Central address is the sender.
	Outgoing,
}

/// Direction, amount and date bounds. All bounds are inclusive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionFilter {
	/// Flow relative to the central address.
	pub direction: FlowDirection,
	/// Smallest amount kept.
	pub min_amount: Option<f64>,
	/// Largest amount kept.
	pub max_amount: Option<f64>,
	/// Earliest timestamp kept.
	pub start: Option<DateTime<Utc>>,
	/// Latest timestamp kept.
	pub end: Option<DateTime<Utc>>,
}

impl TransactionFilter {
	/// Keep only transfers flowing in `direction`.
	pub fn direction(mut self, direction: FlowDirection) -> Self {
		self.direction = direction;
		self
	}

	/// Bound the amount; `None` leaves that side open.
	pub fn amount_between(mut self, min: Option<f64>, max: Option<f64>) -> Self {
		self.min_amount = min;
		self.max_amount = max;
		self
	}

	/// Bound the timestamp; `None` leaves that side open.
	pub fn time_between(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
		self.start = start;
		self.end = end;
		self
	}

	/// Whether `tx` passes every configured bound.
	pub fn matches(&self, tx: &TransactionRecord, central: &str) -> bool {
		let central = Address::canonical(central);
		let direction_ok = match self.direction {
			FlowDirection::All => true,
			FlowDirection::Incoming => Address::canonical(&tx.recipient) == central,
			FlowDirection::Outgoing => Address::canonical(&tx.sender) == central,
		};
		direction_ok
			&& self.min_amount.is_none_or(|min| tx.amount >= min)
			&& self.max_amount.is_none_or(|max| tx.amount <= max)
			&& self.start.is_none_or(|start| tx.timestamp >= start.timestamp())
			&& self.end.is_none_or(|end| tx.timestamp <= end.timestamp())
	}

	/// Records passing the filter, in input order.
	pub fn apply(&self, transactions: &[TransactionRecord], central: &str) -> Vec<TransactionRecord> {
		transactions
			.iter()
			.filter(|tx| self.matches(tx, central))
			.cloned()
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> Vec<TransactionRecord> {
		vec![
			TransactionRecord::new("0xME", "0xaaa", 1.0).at(100),
			TransactionRecord::new("0xbbb", "0xme", 5.0).at(200),
			TransactionRecord::new("0xme", "0xccc", 10.0).at(300),
		]
	}

	#[test]
	fn test_default_keeps_everything() {
		assert_eq!(TransactionFilter::default().apply(&sample(), "0xme").len(), 3);
	}

	#[test]
	fn test_direction_is_case_insensitive() {
		let incoming = TransactionFilter::default().direction(FlowDirection::Incoming);
		let kept = incoming.apply(&sample(), "0xMe");
		assert_eq!(kept.len(), 1);
		assert_eq!(kept[0].sender, "0xbbb");

		let outgoing = TransactionFilter::default().direction(FlowDirection::Outgoing);
		assert_eq!(outgoing.apply(&sample(), "0xme").len(), 2);
	}

	#[test]
	fn test_direction_folds_like_graph_nodes() {
		// Non-ASCII case must fold exactly as node ids do.
		let txs = [
			TransactionRecord::new("0xÄbc", "0xaaa", 1.0),
			TransactionRecord::new("0xbbb", "0xäBC", 2.0),
		];
		let outgoing = TransactionFilter::default().direction(FlowDirection::Outgoing);
		assert_eq!(outgoing.apply(&txs, "0xäbc").len(), 1);
		let incoming = TransactionFilter::default().direction(FlowDirection::Incoming);
		assert_eq!(incoming.apply(&txs, " 0xÄBC ").len(), 1);
	}

	#[test]
	fn test_amount_bounds_are_inclusive() {
		let filter = TransactionFilter::default().amount_between(Some(5.0), Some(10.0));
		let amounts: Vec<f64> = filter.apply(&sample(), "0xme").iter().map(|t| t.amount).collect();
		assert_eq!(amounts, [5.0, 10.0]);
	}

	#[test]
	fn test_time_bounds() {
		let filter = TransactionFilter::default().time_between(
			DateTime::from_timestamp(150, 0),
			DateTime::from_timestamp(300, 0),
		);
		let stamps: Vec<i64> = filter.apply(&sample(), "0xme").iter().map(|t| t.timestamp).collect();
		assert_eq!(stamps, [200, 300]);
	}
}
