pub mod tx_graph;
