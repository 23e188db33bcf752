use crate::graph::MutableGraph;
use std::cmp::max;

pub trait LowerboundHeuristic {
    fn compute<G: MutableGraph>(graph: &G) -> usize;
}

/// Repeatedly contracts a vertex of minimum degree into its neighbor of minimum degree and
/// reports the largest minimum degree seen. Treewidth is minor-monotone, so every contracted
/// graph bounds the original one from below.
pub struct MinorMinWidth {}

impl LowerboundHeuristic for MinorMinWidth {
    fn compute<G: MutableGraph>(graph: &G) -> usize {
        let mut graph = graph.clone();
        let mut lb = 0;
        loop {
            let v = match graph
                .vertices()
                .filter(|v| graph.degree(*v) > 0)
                .min_by_key(|v| (graph.degree(*v), *v))
            {
                Some(v) => v,
                None => break,
            };
            lb = max(lb, graph.degree(v));
            let u = match graph.neighborhood(v).min_by_key(|u| (graph.degree(*u), *u)) {
                Some(u) => u,
                None => break,
            };
            graph.contract(v, u);
        }
        lb
    }
}
