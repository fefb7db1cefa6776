//! Per-counterparty totals and in/out flow for the central address.

use std::collections::HashMap;

use serde::Serialize;

use super::types::{Address, TransactionRecord};

/// Counterparties listed by default.
pub const DEFAULT_TOP_COUNTERPARTIES: usize = 10;

/// Activity between the central address and one counterparty.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CounterpartyStats {
	/// Canonical counterparty address.
	pub address: String,
	/// Records exchanged with the central address.
	pub tx_count: usize,
	/// Sum of their amounts, regardless of direction.
	pub total_amount: f64,
}

/// Counterparties of `central` ranked by total amount, largest first.
///
/// The counterparty of a record is its recipient when `central` sent it and
/// its sender otherwise. Only addresses containing `search` (case-insensitive)
/// are kept, at most `limit` of them. Records with a non-finite amount are
/// ignored, as in [`FlowSummary::from_transactions`].
pub fn top_counterparties(
	transactions: &[TransactionRecord],
	central: &str,
	search: &str,
	limit: usize,
) -> Vec<CounterpartyStats> {
	let central = Address::canonical(central);
	let search = search.trim().to_lowercase();

	let mut order: Vec<String> = Vec::new();
	let mut totals: HashMap<String, (usize, f64)> = HashMap::new();
	for tx in transactions.iter().filter(|tx| tx.amount.is_finite()) {
		let counterparty = if Address::canonical(&tx.sender) == central {
			Address::canonical(&tx.recipient)
		} else {
			Address::canonical(&tx.sender)
		};
		let entry = totals.entry(counterparty.clone()).or_insert_with(|| {
			order.push(counterparty);
			(0, 0.0)
		});
		entry.0 += 1;
		entry.1 += tx.amount;
	}

	let mut stats: Vec<CounterpartyStats> = order
		.into_iter()
		.filter(|address| address.contains(&search))
		.filter_map(|address| {
			totals.get(&address).map(|&(tx_count, total_amount)| CounterpartyStats {
				address,
				tx_count,
				total_amount,
			})
		})
		.collect();
	stats.sort_by(|a, b| {
		b.total_amount
			.total_cmp(&a.total_amount)
			.then_with(|| a.address.cmp(&b.address))
	});
	stats.truncate(limit);
	stats
}

/// Money moving in and out of one address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FlowSummary {
	/// Sum received.
	pub total_inflow: f64,
	/// Sum sent.
	pub total_outflow: f64,
	/// Records received.
	pub incoming_count: usize,
	/// Records sent.
	pub outgoing_count: usize,
	/// `total_inflow - total_outflow`.
	pub net_flow: f64,
}

impl FlowSummary {
	/// Self-transfers are counted on neither side.
	pub fn from_transactions(transactions: &[TransactionRecord], central: &str) -> Self {
		let central = Address::canonical(central);
		let mut summary = Self::default();
		for tx in transactions.iter().filter(|tx| tx.amount.is_finite()) {
			let (from, to) = (Address::canonical(&tx.sender), Address::canonical(&tx.recipient));
			if from == to {
				continue;
			}
			if to == central {
				summary.total_inflow += tx.amount;
				summary.incoming_count += 1;
			} else if from == central {
				summary.total_outflow += tx.amount;
				summary.outgoing_count += 1;
			}
		}
		summary.net_flow = summary.total_inflow - summary.total_outflow;
		summary
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> Vec<TransactionRecord> {
		vec![
			TransactionRecord::new("0xME", "0xaaa", 1.0),
			TransactionRecord::new("0xAAA", "0xme", 2.0),
			TransactionRecord::new("0xme", "0xbbb", 5.0),
			TransactionRecord::new("0xccc", "0xme", 0.5),
			TransactionRecord::new("0xme", "0xme", 9.0),
		]
	}

	#[test]
	fn test_counterparties_ranked_by_total() {
		let top = top_counterparties(&sample(), "0xme", "", DEFAULT_TOP_COUNTERPARTIES);
		let ranked: Vec<(&str, usize)> = top.iter().map(|s| (s.address.as_str(), s.tx_count)).collect();
		assert_eq!(
			ranked,
			[("0xme", 1), ("0xbbb", 1), ("0xaaa", 2), ("0xccc", 1)]
		);
		assert_eq!(top[2].total_amount, 3.0);
	}

	#[test]
	fn test_counterparties_search_and_limit() {
		let top = top_counterparties(&sample(), "0xme", "0XA", 10);
		assert_eq!(top.len(), 1);
		assert_eq!(top[0].address, "0xaaa");

		let top = top_counterparties(&sample(), "0xme", "", 2);
		assert_eq!(top.len(), 2);
	}

	#[test]
	fn test_counterparties_skip_non_finite_amounts() {
		let mut txs = sample();
		txs.push(TransactionRecord::new("0xme", "0xddd", f64::NAN));
		txs.push(TransactionRecord::new("0xaaa", "0xme", f64::INFINITY));
		let top = top_counterparties(&txs, "0xme", "", DEFAULT_TOP_COUNTERPARTIES);
		assert!(top.iter().all(|s| s.total_amount.is_finite()));
		assert!(top.iter().all(|s| s.address != "0xddd"));
		let aaa = top.iter().find(|s| s.address == "0xaaa").map(|s| (s.tx_count, s.total_amount));
		assert_eq!(aaa, Some((2, 3.0)));
	}

	#[test]
	fn test_flow_summary() {
		let summary = FlowSummary::from_transactions(&sample(), "0xMe");
		assert_eq!(summary.total_inflow, 2.5);
		assert_eq!(summary.total_outflow, 6.0);
		assert_eq!(summary.incoming_count, 2);
		assert_eq!(summary.outgoing_count, 2);
		assert_eq!(summary.net_flow, -3.5);
	}
}
