use leptos::prelude::*;
use log::{debug, error, warn};

use crate::components::tx_graph::TxGraphCanvas;
use crate::graph::analysis::DEFAULT_TOP_COUNTERPARTIES;
use crate::graph::{
	Address, BuildOptions, DEFAULT_ITEMS_PER_PAGE, ExpandOutcome, FlowDirection, FlowSummary, ForceLayout,
	TransactionFilter, TransactionGraph, TransactionRecord, build_graph,
	parse_transactions_response, simulate_layout, top_counterparties,
};

const DEMO_CENTRAL: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
const DEMO_RESPONSE: &str = include_str!("demo_transactions.json");

fn demo_transactions() -> Vec<TransactionRecord> {
	parse_transactions_response(DEMO_RESPONSE).unwrap_or_else(|err| {
		error!("demo data: {err}");
		Vec::new()
	})
}

/// Stand-in for the transaction service: every record touching `address`.
fn transactions_of(all: &[TransactionRecord], address: &str) -> Vec<TransactionRecord> {
	let address = Address::canonical(address);
	all.iter()
		.filter(|tx| {
			Address::canonical(&tx.sender) == address || Address::canonical(&tx.recipient) == address
		})
		.cloned()
		.collect()
}

fn laid_out_graph(
	transactions: &[TransactionRecord],
	filter: &TransactionFilter,
) -> Option<TransactionGraph> {
	let selected = filter.apply(transactions, DEMO_CENTRAL);
	match build_graph(&selected, DEMO_CENTRAL) {
		Ok(graph) => Some(simulate_layout(graph)),
		Err(err) => {
			error!("could not build graph: {err}");
			None
		}
	}
}

fn short_hash(hash: &str) -> String {
	let chars: Vec<char> = hash.chars().collect();
	if chars.len() <= 20 {
		return hash.to_string();
	}
	let head: String = chars[..12].iter().collect();
	let tail: String = chars[chars.len() - 8..].iter().collect();
	format!("{head}...{tail}")
}

/// Wallet graph page for the demo address.
#[component]
pub fn Home() -> impl IntoView {
	let all = StoredValue::new(demo_transactions());
	let central_txs = StoredValue::new(all.with_value(|txs| transactions_of(txs, DEMO_CENTRAL)));
	let (direction, set_direction) = signal(FlowDirection::All);
	let (search, set_search) = signal(String::new());
	let graph = RwSignal::new(None::<TransactionGraph>);
	let selected_edge = RwSignal::new(None::<String>);
	let page = RwSignal::new(1_usize);

	Effect::new(move |_| {
		let filter = TransactionFilter::default().direction(direction.get());
		graph.set(central_txs.with_value(|txs| laid_out_graph(txs, &filter)));
		selected_edge.set(None);
	});

	let on_expand = Callback::new(move |address: String| {
		let batch = all.with_value(|txs| transactions_of(txs, &address));
		graph.update(|current| {
			let Some(g) = current.as_mut() else {
				return;
			};
			match g.expand(&address, &batch, &BuildOptions::default()) {
				Ok(ExpandOutcome::Merged { new_nodes, .. }) => {
					let stats = ForceLayout::default().run(g);
					debug!("expanded {address}: {new_nodes} new nodes, {stats:?}");
				}
				Ok(ExpandOutcome::AlreadyExpanded) => debug!("{address} already expanded"),
				Err(err) => warn!("cannot expand {address}: {err}"),
			}
		});
	});

	let on_select_edge = Callback::new(move |id: Option<String>| {
		page.set(1);
		selected_edge.set(id);
	});

	let summary =
		central_txs.with_value(|txs| FlowSummary::from_transactions(txs, DEMO_CENTRAL));
	let top = move || {
		central_txs.with_value(|txs| {
			top_counterparties(txs, DEMO_CENTRAL, &search.get(), DEFAULT_TOP_COUNTERPARTIES)
		})
	};
	let warnings = move || {
		graph.with(|g| g.as_ref().map(|g| g.warnings.len()).unwrap_or_default())
	};

	let edge_panel = move || {
		let id = selected_edge.get()?;
		let edge = graph.with(|g| g.as_ref().and_then(|g| g.edge_by_id(&id)).cloned())?;
		let pages = edge.page_count(DEFAULT_ITEMS_PER_PAGE);
		let current = page.get().clamp(1, pages);
		let rows = edge
			.transactions_page(current, DEFAULT_ITEMS_PER_PAGE)
			.iter()
			.map(|tx| {
				let hash = tx.hash.as_deref().map(short_hash).unwrap_or_else(|| "-".into());
				let when = tx
					.time()
					.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
					.unwrap_or_default();
				view! {
					<tr>
						<td class="mono">{hash}</td>
						<td>{when}</td>
						<td>{format!("{:.4}", tx.amount)}</td>
						<td>{tx.fee.clone().unwrap_or_default()}</td>
					</tr>
				}
			})
			.collect_view();

		Some(view! {
			<div class="edge-details">
				<h2>
					{format!("{} -> {}", edge.source.short_label(), edge.target.short_label())}
				</h2>
				<p>{edge.label.clone()}</p>
				<table>
					<tr>
						<th>"Hash"</th>
						<th>"Time"</th>
						<th>"Amount"</th>
						<th>"Fee"</th>
					</tr>
					{rows}
				</table>
				<button on:click=move |_| page.update(|p| *p = p.saturating_sub(1).max(1))>
					"Prev"
				</button>
				<span>{format!(" {current} / {pages} ")}</span>
				<button on:click=move |_| page.update(|p| *p = (*p + 1).min(pages))>"Next"</button>
				<button on:click=move |_| selected_edge.set(None)>"Close"</button>
			</div>
		})
	};

	let directions = [
		(FlowDirection::All, "All"),
		(FlowDirection::Incoming, "In"),
		(FlowDirection::Outgoing, "Out"),
	];

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<TxGraphCanvas
					graph=graph
					fullscreen=true
					on_expand=on_expand
					on_select_edge=on_select_edge
				/>
				<div class="graph-overlay">
					<h1>"Transaction Graph"</h1>
					<p class="subtitle mono">{DEMO_CENTRAL}</p>
					<p class="subtitle">
						"Double-click a node to expand it. Click an edge for its transfers."
					</p>
					<div class="direction-filter">
						{directions
							.into_iter()
							.map(|(d, label)| {
								view! {
									<button
										class:active=move || direction.get() == d
										on:click=move |_| set_direction.set(d)
									>
										{label}
									</button>
								}
							})
							.collect_view()}
					</div>
					<p>
						{format!(
							"In {:.4} ETH ({} tx) / Out {:.4} ETH ({} tx) / Net {:.4} ETH",
							summary.total_inflow,
							summary.incoming_count,
							summary.total_outflow,
							summary.outgoing_count,
							summary.net_flow,
						)}
					</p>
					<p>{move || format!("{} skipped records", warnings())}</p>
					<input
						type="text"
						placeholder="Search counterparties"
						prop:value=move || search.get()
						on:input=move |ev| set_search.set(event_target_value(&ev))
					/>
					<ol class="counterparties">
						{move || {
							top()
								.into_iter()
								.map(|s| {
									view! {
										<li>
											<span class="mono">{s.address}</span>
											{format!(" {} tx, {:.4} ETH", s.tx_count, s.total_amount)}
										</li>
									}
								})
								.collect_view()
						}}
					</ol>
				</div>
				{edge_panel}
			</div>
		</ErrorBoundary>
	}
}
