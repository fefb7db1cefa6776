use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{GraphViewState, NODE_RADIUS};
use crate::graph::NodeKind;

const CENTRAL_COLOR: &str = "#ff7f0e";
const PERIPHERAL_COLOR: &str = "#1f77b4";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn node_color(kind: NodeKind) -> &'static str {
	match kind {
		NodeKind::Central => CENTRAL_COLOR,
		NodeKind::Peripheral => PERIPHERAL_COLOR,
	}
}

/// Draw one frame. Geometry is projected to screen space so nodes and
/// labels keep their pixel size at every zoom level.
pub fn render(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
}

fn draw_edges(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let (line_width, dash, gap, arrow_size) = (1.5, 8.0, 4.0, 8.0);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);

	for (edge_idx, (s, d)) in state.links() {
		let (Some((x1, y1)), Some((x2, y2)), Some(edge)) = (
			state.node_screen(s),
			state.node_screen(d),
			state.graph.edges.get(edge_idx),
		) else {
			continue;
		};
		let selected = state.selected_edge == Some(edge_idx);
		let is_highlighted = selected || (state.is_highlighted(s) && state.is_highlighted(d));

		// t=0: all edges at base (0.6), t=1: highlighted at 0.9, others at 0.15
		let (edge_alpha, arrow_alpha, width) = if is_highlighted {
			(0.6 + 0.3 * t, 0.8 + 0.1 * t, line_width * (1.0 + 0.3 * t))
		} else {
			(0.6 - 0.45 * t, 0.8 - 0.45 * t, line_width * (1.0 - 0.3 * t))
		};
		let rgb = if selected { "255, 214, 102" } else { "100, 180, 255" };

		if s == d {
			// Self-transfer: small loop above the node
			ctx.set_stroke_style_str(&format!("rgba({rgb}, {edge_alpha})"));
			ctx.set_line_width(width);
			ctx.begin_path();
			let _ = ctx.arc(x1, y1 - NODE_RADIUS * 1.6, NODE_RADIUS, 0.0, 2.0 * PI);
			ctx.stroke();
			continue;
		}

		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		ctx.set_stroke_style_str(&format!("rgba({rgb}, {edge_alpha})"));
		ctx.set_line_width(width);
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(dash),
			&JsValue::from_f64(gap),
		));
		ctx.set_line_dash_offset(dash_offset);

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(x1 + ux * NODE_RADIUS, y1 + uy * NODE_RADIUS);
		ctx.line_to(
			x2 - ux * (NODE_RADIUS + arrow_size),
			y2 - uy * (NODE_RADIUS + arrow_size),
		);
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&format!("rgba({rgb}, {arrow_alpha})"));
		let (tip_x, tip_y) = (x2 - ux * NODE_RADIUS, y2 - uy * NODE_RADIUS);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();

		if is_highlighted || !state.has_active_highlight() {
			ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", arrow_alpha * 0.9));
			ctx.set_font("10px sans-serif");
			let _ = ctx.fill_text(&edge.label, (x1 + x2) / 2.0 + 4.0, (y1 + y2) / 2.0 - 4.0);
		}
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
	);

	for (idx, node) in state.graph.nodes.iter().enumerate() {
		if has_highlight && state.is_highlighted(idx) {
			continue;
		}
		let (x, y) = state.graph_to_screen(node.position);
		let (alpha, radius) = (1.0 - 0.7 * t, NODE_RADIUS * (1.0 - 0.15 * t));

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node_color(node.kind));
		ctx.fill();
		ctx.set_global_alpha(1.0);

		ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha * 0.8));
		ctx.set_font("11px monospace");
		let _ = ctx.fill_text(&node.label, x + radius + 3.0, y + 3.0);
	}

	if !has_highlight {
		return;
	}

	for (idx, node) in state.graph.nodes.iter().enumerate() {
		if !state.is_highlighted(idx) {
			continue;
		}
		let (x, y) = state.graph_to_screen(node.position);
		let is_hovered = state.is_hovered(idx);
		let is_neighbor =
			state.hover.neighbors.contains(&idx) || state.hover.prev_neighbors.contains(&idx);

		let (radius, glow_radius) = if is_hovered {
			(
				NODE_RADIUS * (1.0 + 0.35 * t),
				NODE_RADIUS * (1.8 + 1.2 * t),
			)
		} else if is_neighbor {
			(NODE_RADIUS * (1.0 + 0.2 * t), NODE_RADIUS * (1.4 + 0.6 * t))
		} else {
			(NODE_RADIUS, 0.0)
		};

		if glow_radius > 0.0 && t > 0.01 {
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius)
			{
				let alpha = if is_hovered { 0.35 * t } else { 0.2 * t };
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", alpha));
				let _ = gradient
					.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node_color(node.kind));
		ctx.fill();

		if is_hovered && t > 0.01 {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
			ctx.set_line_width(1.5);
			ctx.stroke();
		}

		ctx.set_fill_style_str("white");
		ctx.set_font("11px monospace");
		let _ = ctx.fill_text(&node.label, x + radius + 3.0, y + 3.0);
	}
}
