//! End-to-end checks of the build -> layout pipeline through the public API.

use std::collections::HashSet;

use tx_graph_explorer::graph::{
	BuildOptions, ClampMode, ExpandOutcome, FlowDirection, ForceLayout, GraphBuilder, GraphError,
	GraphResult, GraphWarning, LayoutParameters, NodeKind, SelfLoopPolicy, TransactionFilter,
	TransactionRecord, build_graph, parse_transactions_response, simulate_layout,
};

const EPSILON: f64 = 1e-9;

fn tx(from: &str, to: &str, amount: f64) -> TransactionRecord {
	TransactionRecord::new(from, to, amount)
}

fn mixed_batch() -> Vec<TransactionRecord> {
	vec![
		tx("0xCafe01", "0xBEEF02", 1.0),
		tx("0xbeef02", "0xcafe01", 0.5),
		tx("0xcafe01", "0xF00D03", 2.0),
		tx("0xF00D03", "0xDEAD04", 0.25),
		tx("0xdead04", "0xCAFE01", 4.0),
		tx("0xcafe01", "0xbeef02", 3.0),
		tx("0xABBA05", "0xbeef02", 1.5),
	]
}

#[test]
fn test_scenario_two_transfers_one_edge() -> GraphResult<()> {
	let txs = [tx("0xA", "0xB", 2.0), tx("0xA", "0xB", 3.0)];
	let graph = simulate_layout(build_graph(&txs, "0xA")?);

	let nodes: Vec<(&str, NodeKind)> = graph.nodes.iter().map(|n| (n.id.as_str(), n.kind)).collect();
	assert_eq!(nodes, [("0xa", NodeKind::Central), ("0xb", NodeKind::Peripheral)]);

	assert_eq!(graph.edges.len(), 1);
	let edge = &graph.edges[0];
	assert_eq!((edge.source.as_str(), edge.target.as_str()), ("0xa", "0xb"));
	assert!((edge.total_amount - 5.0).abs() < EPSILON);
	assert_eq!(edge.transaction_refs.len(), 2);
	Ok(())
}

#[test]
fn test_central_only_for_empty_input() -> GraphResult<()> {
	let graph = simulate_layout(build_graph(&[], "0xCENTRAL")?);
	assert_eq!(graph.nodes.len(), 1);
	assert_eq!(graph.nodes[0].id.as_str(), "0xcentral");
	assert_eq!(graph.nodes[0].kind, NodeKind::Central);
	assert!(graph.edges.is_empty());
	Ok(())
}

#[test]
fn test_edges_stay_directional() -> GraphResult<()> {
	let txs = [tx("0xAAA", "0xBBB", 1.5), tx("0xAAA", "0xBBB", 2.5), tx("0xBBB", "0xAAA", 1.0)];
	let graph = build_graph(&txs, "0xAAA")?;
	assert_eq!(graph.edges.len(), 2);
	let total = |s: &str, t: &str| graph.edge(s, t).map(|e| e.total_amount);
	assert_eq!(total("0xaaa", "0xbbb"), Some(4.0));
	assert_eq!(total("0xbbb", "0xaaa"), Some(1.0));
	Ok(())
}

#[test]
fn test_nodes_are_unique_canonical_addresses() -> GraphResult<()> {
	let txs = mixed_batch();
	let graph = build_graph(&txs, "0xCAFE01")?;

	let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
	assert_eq!(ids.len(), graph.nodes.len());

	let expected: HashSet<String> = txs
		.iter()
		.flat_map(|t| [t.sender.to_lowercase(), t.recipient.to_lowercase()])
		.chain(["0xcafe01".to_string()])
		.collect();
	assert_eq!(ids.len(), expected.len());
	assert_eq!(graph.nodes.iter().filter(|n| n.kind == NodeKind::Central).count(), 1);
	Ok(())
}

#[test]
fn test_pipeline_is_deterministic() -> GraphResult<()> {
	let first = simulate_layout(build_graph(&mixed_batch(), "0xcafe01")?);
	let second = simulate_layout(build_graph(&mixed_batch(), "0xcafe01")?);
	assert_eq!(first, second);
	Ok(())
}

#[test]
fn test_origin_clamp_after_simulation() -> GraphResult<()> {
	let graph = simulate_layout(build_graph(&mixed_batch(), "0xcafe01")?);
	for node in &graph.nodes {
		assert!(
			node.position.magnitude() <= 10.0 + EPSILON,
			"{} at {:?}",
			node.id,
			node.position
		);
	}
	// Edges carry no position state and survive untouched.
	assert_eq!(graph.edges, build_graph(&mixed_batch(), "0xcafe01")?.edges);
	Ok(())
}

#[test]
fn test_displacement_clamp_spreads_wider() -> GraphResult<()> {
	let layout = ForceLayout::new(LayoutParameters {
		clamp: ClampMode::Displacement,
		..Default::default()
	})?;
	let mut graph = build_graph(&mixed_batch(), "0xcafe01")?;
	let stats = layout.run(&mut graph);
	assert_eq!(stats.iterations, 200);
	assert!(graph.nodes.iter().any(|n| n.position.magnitude() > 10.0));
	assert!(graph.nodes.iter().all(|n| n.position.x.is_finite() && n.position.y.is_finite()));
	Ok(())
}

#[test]
fn test_bad_records_do_not_abort() -> GraphResult<()> {
	let mut txs = mixed_batch();
	txs.push(tx("", "0xcafe01", 1.0));
	txs.push(tx("0xcafe01", "0xbeef02", f64::INFINITY));
	let graph = simulate_layout(build_graph(&txs, "0xcafe01")?);
	assert_eq!(graph.nodes.len(), 5);
	assert_eq!(graph.warnings.len(), 2);
	assert!(matches!(graph.warnings[0], GraphWarning::InvalidAddress { record: 7, .. }));
	assert!(matches!(graph.warnings[1], GraphWarning::InvalidAmount { record: 8, .. }));
	Ok(())
}

#[test]
fn test_self_loop_policies() -> GraphResult<()> {
	let txs = [tx("0xaaa", "0xbbb", 1.0), tx("0xbbb", "0xBBB", 2.0)];

	let kept = simulate_layout(build_graph(&txs, "0xaaa")?);
	assert_eq!(kept.edges.len(), 2);
	assert!(kept.edges[1].is_self_loop());
	assert!(kept.nodes.iter().all(|n| n.position.x.is_finite()));

	let skipping = GraphBuilder::new(BuildOptions {
		self_loops: SelfLoopPolicy::Skip,
		..Default::default()
	});
	let skipped = skipping.build(&txs, "0xaaa")?;
	assert_eq!(skipped.edges.len(), 1);
	assert_eq!(skipped.warnings.len(), 1);
	Ok(())
}

#[test]
fn test_contract_violation_is_an_error() {
	assert_eq!(build_graph(&[], "").unwrap_err(), GraphError::MissingCentralAddress);
}

#[test]
fn test_fetch_filter_build_expand() -> GraphResult<()> {
	let body = r#"{"success": true, "transactions": [
		{"from": "0xME0001", "to": "0xaaa111", "amount": "1.0", "timestamp": "100"},
		{"from": "0xbbb222", "to": "0xme0001", "amount": 4.0, "timestamp": 200},
		{"from": "0xme0001", "to": "0xccc333", "amount": 0.1, "timestamp": 300}
	]}"#;
	let records = parse_transactions_response(body)?;
	let outgoing = TransactionFilter::default()
		.direction(FlowDirection::Outgoing)
		.amount_between(Some(0.5), None)
		.apply(&records, "0xme0001");
	assert_eq!(outgoing.len(), 1);

	let mut graph = simulate_layout(build_graph(&outgoing, "0xME0001")?);
	assert_eq!(graph.nodes.len(), 2);

	let more = [tx("0xaaa111", "0xddd444", 0.3), tx("0xME0001", "0xaaa111", 2.0)];
	let outcome = graph.expand("0xaaa111", &more, &BuildOptions::default())?;
	assert_eq!(
		outcome,
		ExpandOutcome::Merged {
			new_nodes: 1,
			new_edges: 1,
			updated_edges: 1
		}
	);
	ForceLayout::default().run(&mut graph);
	assert_eq!(graph.edge("0xme0001", "0xaaa111").map(|e| e.total_amount), Some(3.0));
	assert!(graph.nodes.iter().all(|n| n.position.magnitude() <= 10.0 + EPSILON));
	Ok(())
}
