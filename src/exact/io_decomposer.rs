use crate::datastructures::VertexSet;
use crate::exact::{ComputationResult, Pid, SearchBudget};
use crate::graph::{Bag, BagId};
use crate::tree_decomposition::TreeDecomposition;
use std::cmp::{max, min};

#[cfg(feature = "log")]
use log::debug;

/// Outcome of refining one bag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refinement {
    /// The nested decomposition was replaced by a narrower one of the given width.
    Improved(usize),
    /// Nothing narrower than the current nested decomposition exists above `lowerbound`.
    NotImproved { lowerbound: usize },
    /// The search ran out of budget. The bag keeps its nested decomposition, and no
    /// decomposition narrower than `lowerbound` exists.
    Exhausted { lowerbound: usize },
}

impl Refinement {
    /// Lower bound on the width the search established.
    pub fn lowerbound(&self) -> usize {
        match self {
            Refinement::Improved(width) => *width,
            Refinement::NotImproved { lowerbound } => *lowerbound,
            Refinement::Exhausted { lowerbound } => *lowerbound,
        }
    }
}

/// Exact refinement of a single bag against its local graph.
///
/// The local graph (see [`Bag::make_refinable`]) is split into components, each of which is
/// solved by [`Pid`] for widths from `lowerbound` up to, but excluding, `upperbound`. The
/// bag's nested decomposition is only replaced if every component was solved.
pub struct IoDecomposer<'a> {
    bag: &'a mut Bag,
    id: BagId,
    lowerbound: usize,
    upperbound: usize,
    budget: SearchBudget,
}

impl<'a> IoDecomposer<'a> {
    pub fn new(bag: &'a mut Bag, id: BagId, lowerbound: usize, upperbound: usize) -> Self {
        Self {
            bag,
            id,
            lowerbound,
            upperbound,
            budget: SearchBudget::default(),
        }
    }

    impl_setter!(self, budget, SearchBudget);

    pub fn decompose(self) -> Refinement {
        if !self.bag.is_refinable(self.id) {
            self.bag.make_refinable(self.id);
        }
        let graph = match self.bag.local_graph(self.id) {
            Some(local) => local.graph.clone(),
            None => {
                return Refinement::NotImproved {
                    lowerbound: self.lowerbound,
                }
            }
        };

        let n = graph.n();
        let upperbound = min(self.upperbound, n.saturating_sub(1));
        let lowerbound = max(self.lowerbound, graph.min_degree());
        if lowerbound >= upperbound {
            return Refinement::NotImproved {
                lowerbound: max(lowerbound, upperbound),
            };
        }

        let mut td = TreeDecomposition::default();
        let mut width = 0;
        for component in graph.components(&VertexSet::new(n)) {
            let (sub_graph, inv) = graph.induced(&component);
            let result = Pid::with_bounds(&sub_graph, lowerbound, upperbound)
                .budget(self.budget)
                .compute();
            match result {
                ComputationResult::ComputedTreeDecomposition(sub_td) => {
                    width = max(width, sub_td.max_bag_size.saturating_sub(1));
                    td.combine_with(sub_td, &inv, None);
                }
                ComputationResult::Bounds(bounds) if bounds.lowerbound >= upperbound => {
                    #[cfg(feature = "log")]
                    debug!(
                        "bag {} of size {} is optimal at width {}",
                        self.id, n, self.upperbound
                    );
                    return Refinement::NotImproved {
                        lowerbound: upperbound,
                    };
                }
                ComputationResult::Bounds(bounds) => {
                    return Refinement::Exhausted {
                        lowerbound: bounds.lowerbound,
                    };
                }
            }
        }

        #[cfg(feature = "log")]
        debug!(
            "bag {} of size {} refined from width {} to {}",
            self.id, n, self.upperbound, width
        );
        self.bag.replace_nested(self.id, &td);
        Refinement::Improved(width)
    }
}

#[cfg(test)]
mod tests {
    use crate::exact::{IoDecomposer, Refinement, SearchBudget};
    use crate::graph::{Bag, Graph};
    use crate::heuristic_elimination_order::{GreedyDecomposer, Mode};
    use std::rc::Rc;

    fn grid(rows: usize, columns: usize) -> Graph {
        let mut edges = vec![];
        for r in 0..rows {
            for c in 0..columns {
                let v = r * columns + c;
                if c + 1 < columns {
                    edges.push((v, v + 1));
                }
                if r + 1 < rows {
                    edges.push((v, v + columns));
                }
            }
        }
        Graph::from_edges(rows * columns, &edges)
    }

    #[test]
    fn refines_whole_graph() {
        // a single bag holding all of C6
        let edges: Vec<_> = (0..6).map(|i| (i, (i + 1) % 6)).collect();
        let mut bag = Bag::new(Rc::new(Graph::from_edges(6, &edges)));
        let refinement = IoDecomposer::new(&mut bag, Bag::ROOT, 0, 5).decompose();
        assert_eq!(refinement, Refinement::Improved(2));
        assert_eq!(bag.width(Bag::ROOT), 2);
        assert_eq!(bag.validate(), Ok(()));
    }

    #[test]
    fn components_are_solved_separately() {
        // a triangle and a path, disjoint
        let graph = Graph::from_edges(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5)]);
        let mut bag = Bag::new(Rc::new(graph));
        let refinement = IoDecomposer::new(&mut bag, Bag::ROOT, 0, 5).decompose();
        assert_eq!(refinement, Refinement::Improved(2));
        assert_eq!(bag.validate(), Ok(()));
        assert_eq!(bag.to_tree_decomposition().unwrap().width(), 2);
    }

    #[test]
    fn heuristic_width_proven() {
        let mut bag = Bag::new(Rc::new(grid(3, 3)));
        GreedyDecomposer::new(&mut bag, Mode::Fill).decompose();
        let heuristic_width = bag.width(Bag::ROOT);
        assert_eq!(heuristic_width, 3);
        let refinement = IoDecomposer::new(&mut bag, Bag::ROOT, 0, heuristic_width).decompose();
        assert_eq!(refinement, Refinement::NotImproved { lowerbound: 3 });
        assert_eq!(refinement.lowerbound(), 3);
        assert_eq!(bag.validate(), Ok(()));
    }

    #[test]
    fn exhausted_search_keeps_structure() {
        let mut bag = Bag::new(Rc::new(grid(4, 4)));
        GreedyDecomposer::new(&mut bag, Mode::Degree).decompose();
        let nested = bag.nested_bags(Bag::ROOT).to_vec();
        let refinement = IoDecomposer::new(&mut bag, Bag::ROOT, 2, 15)
            .budget(SearchBudget::default().max_steps(Some(1)))
            .decompose();
        assert!(matches!(refinement, Refinement::Exhausted { .. }));
        assert_eq!(bag.nested_bags(Bag::ROOT), &nested[..]);
        assert_eq!(bag.validate(), Ok(()));
    }

    #[test]
    fn nothing_to_do_below_lowerbound() {
        let mut bag = Bag::new(Rc::new(grid(2, 2)));
        let refinement = IoDecomposer::new(&mut bag, Bag::ROOT, 3, 3).decompose();
        assert_eq!(refinement, Refinement::NotImproved { lowerbound: 3 });
        assert!(bag.is_refinable(Bag::ROOT));
    }
}
