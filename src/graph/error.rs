//! Errors and warnings produced by the graph core.
//!
//! [`GraphError`] is reserved for contract violations at the call boundary.
//! Problems with individual transaction records never abort a build; they are
//! reported as [`GraphWarning`]s on the returned graph instead.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors returned by the graph core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
	/// The central address argument was empty.
	#[error("central address is required")]
	MissingCentralAddress,

	/// An address failed normalisation or the minimum length check.
	#[error("invalid address '{raw}': {reason}")]
	InvalidAddress {
		/// The input as given.
		raw: String,
		/// Why it was rejected.
		reason: String,
	},

	/// The address does not belong to any node of the graph.
	#[error("no node for address {0}")]
	UnknownNode(String),

	/// A tunable was out of range.
	#[error("invalid parameter {name}: {reason}")]
	InvalidParameter {
		/// Field name.
		name: &'static str,
		/// Allowed range.
		reason: String,
	},

	/// The upstream service answered with `success: false`.
	#[error("transaction service error: {0}")]
	Upstream(String),

	/// JSON input could not be decoded.
	#[error("decode error: {0}")]
	Decode(String),
}

impl From<serde_json::Error> for GraphError {
	fn from(err: serde_json::Error) -> Self {
		Self::Decode(err.to_string())
	}
}

/// Convenience alias used throughout the core.
pub type GraphResult<T> = Result<T, GraphError>;

/// Which side of a transaction an address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AddressRole {
	/// The address that sent the funds.
	Sender,
	/// The address that received the funds.
	Recipient,
}

impl fmt::Display for AddressRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Sender => write!(f, "sender"),
			Self::Recipient => write!(f, "recipient"),
		}
	}
}

/// A recoverable anomaly in one input record.
///
/// `record` is the zero-based position of the record in the batch it came in.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum GraphWarning {
	/// The address was empty or too short; no node was created for it and
	/// the record contributed no edge.
	#[error("record {record}: invalid {role} address '{raw}'")]
	InvalidAddress {
		/// Record index.
		record: usize,
		/// Side of the record.
		role: AddressRole,
		/// The address as given.
		raw: String,
	},

	/// The amount was NaN or infinite; the whole record was skipped.
	#[error("record {record}: non-finite amount {amount}")]
	InvalidAmount {
		/// Record index.
		record: usize,
		/// The offending amount.
		amount: f64,
	},

	/// A transfer from an address to itself was dropped.
	#[error("record {record}: self-transfer on {address} skipped")]
	SelfLoopSkipped {
		/// Record index.
		record: usize,
		/// Canonical address on both ends.
		address: String,
	},
}
