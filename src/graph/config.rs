//! Tunables for building and laying out a transaction graph.
//!
//! Both structs deserialize with every field optional, so a partial JSON
//! object only overrides what it names.

use serde::{Deserialize, Serialize};

use super::error::{GraphError, GraphResult};

/// How the angular step of the initial ring is derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingSpacing {
	/// `2π / number of transactions`. Leaves gaps when few addresses trade often.
	#[default]
	PerTransaction,
	/// `2π / number of distinct peripheral addresses`.
	PerNode,
}

/// What to do with transfers from an address to itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfLoopPolicy {
	/// Emit a zero-length edge `a -> a`; layout ignores it.
	#[default]
	Keep,
	/// Drop the record with a warning.
	Skip,
}

/// Options for [`GraphBuilder`](super::builder::GraphBuilder) and graph expansion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
	/// Radius of the ring peripheral nodes start on.
	pub ring_radius: f64,
	/// Angular step of the ring.
	pub ring_spacing: RingSpacing,
	/// Addresses shorter than this (after trimming) are rejected.
	pub min_address_len: usize,
	/// Handling of self-transfers.
	pub self_loops: SelfLoopPolicy,
	/// Horizontal distance of expanded nodes from their parent.
	pub expansion_offset: f64,
	/// Vertical distance between successive expanded nodes.
	pub expansion_row_gap: f64,
	/// Unit appended to edge labels.
	pub amount_unit: String,
}

impl Default for BuildOptions {
	fn default() -> Self {
		Self {
			ring_radius: 500.0,
			ring_spacing: RingSpacing::PerTransaction,
			min_address_len: 3,
			self_loops: SelfLoopPolicy::Keep,
			expansion_offset: 200.0,
			expansion_row_gap: 50.0,
			amount_unit: "ETH".into(),
		}
	}
}

impl BuildOptions {
	/// Decode and validate; missing fields take their defaults.
	pub fn from_json(json: &str) -> GraphResult<Self> {
		let options: Self = serde_json::from_str(json)?;
		options.validate()?;
		Ok(options)
	}

	/// Reject negative distances and a zero minimum address length.
	pub fn validate(&self) -> GraphResult<()> {
		non_negative("ring_radius", self.ring_radius)?;
		non_negative("expansion_offset", self.expansion_offset)?;
		non_negative("expansion_row_gap", self.expansion_row_gap)?;
		if self.min_address_len == 0 {
			return Err(GraphError::InvalidParameter {
				name: "min_address_len",
				reason: "must be at least 1".into(),
			});
		}
		Ok(())
	}
}

/// What the clamp pass limits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampMode {
	/// Keep every node within `max_displacement` of the origin.
	///
	/// This pulls everything onto a small disc around the origin once the
	/// repulsion pushes it out.
	#[default]
	Origin,
	/// Limit how far a node may move during one iteration.
	Displacement,
}

/// Physics constants for [`ForceLayout`](super::layout::ForceLayout).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParameters {
	/// Repulsion constant; the pair force is `repulsion / d`.
	pub repulsion: f64,
	/// Attraction constant; the spring force is `attraction * ln(d + 1)`.
	pub attraction: f64,
	/// Iteration count.
	pub iterations: usize,
	/// Clamp radius, see [`ClampMode`].
	pub max_displacement: f64,
	/// What the clamp limits.
	pub clamp: ClampMode,
	/// Stop early once no node moves more than this in one iteration.
	pub convergence_threshold: Option<f64>,
}

impl Default for LayoutParameters {
	fn default() -> Self {
		Self {
			repulsion: 20_000.0,
			attraction: 0.05,
			iterations: 200,
			max_displacement: 10.0,
			clamp: ClampMode::Origin,
			convergence_threshold: None,
		}
	}
}

impl LayoutParameters {
	/// Decode and validate; missing fields take their defaults.
	pub fn from_json(json: &str) -> GraphResult<Self> {
		let params: Self = serde_json::from_str(json)?;
		params.validate()?;
		Ok(params)
	}

	/// Reject negative constants and non-positive thresholds.
	pub fn validate(&self) -> GraphResult<()> {
		non_negative("repulsion", self.repulsion)?;
		non_negative("attraction", self.attraction)?;
		positive("max_displacement", self.max_displacement)?;
		if let Some(threshold) = self.convergence_threshold {
			positive("convergence_threshold", threshold)?;
		}
		Ok(())
	}
}

fn non_negative(name: &'static str, value: f64) -> GraphResult<()> {
	if !value.is_finite() || value < 0.0 {
		return Err(GraphError::InvalidParameter {
			name,
			reason: format!("must be finite and non-negative, got {value}"),
		});
	}
	Ok(())
}

fn positive(name: &'static str, value: f64) -> GraphResult<()> {
	if !value.is_finite() || value <= 0.0 {
		return Err(GraphError::InvalidParameter {
			name,
			reason: format!("must be finite and positive, got {value}"),
		});
	}
	Ok(())
}
