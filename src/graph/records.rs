//! Decoding the transaction service's JSON envelope.

use serde::Deserialize;

use super::error::{GraphError, GraphResult};
use super::types::TransactionRecord;

/// `{ "success": bool, "transactions": [...], "message": "..." }`
#[derive(Clone, Debug, Deserialize)]
pub struct TransactionsResponse {
	/// The service could answer.
	pub success: bool,
	/// Present on success.
	#[serde(default)]
	pub transactions: Option<Vec<TransactionRecord>>,
	/// Failure reason.
	#[serde(default)]
	pub message: Option<String>,
}

impl TransactionsResponse {
	/// The records, or [`GraphError::Upstream`] when `success` is false.
	pub fn into_records(self) -> GraphResult<Vec<TransactionRecord>> {
		if !self.success {
			let message = self
				.message
				.unwrap_or_else(|| "Failed to fetch transactions".into());
			return Err(GraphError::Upstream(message));
		}
		Ok(self.transactions.unwrap_or_default())
	}
}

/// Parse a response body into transaction records.
pub fn parse_transactions_response(json: &str) -> GraphResult<Vec<TransactionRecord>> {
	serde_json::from_str::<TransactionsResponse>(json)?.into_records()
}
