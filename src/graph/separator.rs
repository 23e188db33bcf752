use crate::datastructures::VertexSet;
use crate::graph::bit_graph::Graph;
use crate::graph::hash_map_graph::HashMapGraph;
use fxhash::FxHashSet;
use rand::prelude::StdRng;

/// Why a separator is known to be safe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SafetyProof {
    Clique,
    AlmostClique,
    CliqueMinor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Safety {
    Unknown,
    Unsafe,
    Safe(SafetyProof),
}

impl Safety {
    pub fn is_safe(&self) -> bool {
        matches!(self, Safety::Safe(_))
    }
}

impl Default for Safety {
    fn default() -> Self {
        Safety::Unknown
    }
}

/// Bounds on how hard the safety test tries before giving up on a separator.
#[derive(Clone, Copy, Debug)]
pub struct SafeSeparatorLimits {
    pub check_almost_clique: bool,
    pub check_minor_safe: bool,
    pub max_missing_edges: usize,
    pub max_minor_tries: usize,
    pub seed: u64,
}

impl Default for SafeSeparatorLimits {
    fn default() -> Self {
        Self {
            check_almost_clique: true,
            check_minor_safe: true,
            max_missing_edges: 100,
            max_minor_tries: 25,
            seed: 1337 * 42 * 777,
        }
    }
}

impl SafeSeparatorLimits {
    impl_setter!(self, check_almost_clique, bool);
    impl_setter!(self, check_minor_safe, bool);
    impl_setter!(self, max_missing_edges, usize);
    impl_setter!(self, max_minor_tries, usize);
    impl_setter!(self, seed, u64);

    /// Only clique separators are accepted.
    pub fn cliques_only() -> Self {
        Self::default()
            .check_almost_clique(false)
            .check_minor_safe(false)
    }
}

/// A tree edge between two bags that are nested in the same parent bag.
#[derive(Clone, Debug)]
pub struct Separator {
    pub vertex_set: VertexSet,
    pub(crate) incident_bags: [usize; 2],
    pub(crate) safety: Safety,
}

impl Separator {
    pub fn new(vertex_set: VertexSet, a: usize, b: usize) -> Self {
        Self {
            vertex_set,
            incident_bags: [a, b],
            safety: Safety::Unknown,
        }
    }

    pub fn size(&self) -> usize {
        self.vertex_set.cardinality()
    }

    pub fn safety(&self) -> Safety {
        self.safety
    }

    pub fn incident_bags(&self) -> (usize, usize) {
        (self.incident_bags[0], self.incident_bags[1])
    }

    /// The incident bag that is not `bag`.
    pub fn other_side(&self, bag: usize) -> usize {
        if self.incident_bags[0] == bag {
            self.incident_bags[1]
        } else {
            self.incident_bags[0]
        }
    }
}

/// Decides whether `separator` is safe for `graph`, i.e. whether the treewidth of `graph` is
/// the maximum over the pieces obtained by completing `separator` to a clique in every
/// component side.
///
/// A separator that leaves fewer than two components is never safe. Otherwise it is safe if
/// it is a clique, a minimal separator that is an almost clique, or if every component `C`
/// has a clique on `separator` as a minor of `G - C`.
pub fn figure_out_safety(
    graph: &Graph,
    separator: &VertexSet,
    limits: &SafeSeparatorLimits,
    rng: &mut StdRng,
) -> Safety {
    if graph.components(separator).len() < 2 {
        return Safety::Unsafe;
    }
    classify_separating_set(graph, separator, limits, rng)
}

/// Like [`figure_out_safety`] for a set already known to leave at least two components.
/// Components are only computed once the cheaper clique tests fail.
pub fn classify_separating_set(
    graph: &Graph,
    separator: &VertexSet,
    limits: &SafeSeparatorLimits,
    rng: &mut StdRng,
) -> Safety {
    if graph.is_clique_set(separator) {
        return Safety::Safe(SafetyProof::Clique);
    }
    if limits.check_almost_clique
        && graph.almost_clique_center(separator).is_some()
        && graph.is_minimal_separator(separator)
    {
        return Safety::Safe(SafetyProof::AlmostClique);
    }
    if limits.check_minor_safe {
        let components = graph.components(separator);
        if is_minor_safe(graph, separator, &components, limits, rng) {
            return Safety::Safe(SafetyProof::CliqueMinor);
        }
    }
    Safety::Unsafe
}

fn is_minor_safe(
    graph: &Graph,
    separator: &VertexSet,
    components: &[VertexSet],
    limits: &SafeSeparatorLimits,
    rng: &mut StdRng,
) -> bool {
    if graph.missing_edges(separator).len() > limits.max_missing_edges {
        return false;
    }
    let terminals: FxHashSet<usize> = separator.iter().collect();
    let whole = HashMapGraph::from_graph(graph);
    components.iter().all(|component| {
        let rest: FxHashSet<usize> = graph.all().difference(component).iter().collect();
        whole.vertex_induced(&rest).has_clique_minor(
            &terminals,
            limits.max_minor_tries,
            limits.max_missing_edges,
            rng,
        )
    })
}

#[cfg(test)]
mod tests {
    use crate::datastructures::VertexSet;
    use crate::graph::bit_graph::Graph;
    use crate::graph::separator::{
        figure_out_safety, SafeSeparatorLimits, Safety, SafetyProof,
    };
    use rand::prelude::StdRng;
    use rand::SeedableRng;

    // separator 0..4, two four-cliques attached through a perfect matching
    fn attached_cliques(separator_edges: &[(usize, usize)]) -> Graph {
        let mut graph = Graph::new(12);
        for (u, v) in separator_edges.iter().copied() {
            graph.add_edge(u, v);
        }
        for offset in &[4, 8] {
            for u in 0..4 {
                for v in (u + 1)..4 {
                    graph.add_edge(offset + u, offset + v);
                }
                graph.add_edge(u, offset + u);
            }
        }
        graph
    }

    fn safety(graph: &Graph, separator: &[usize], limits: SafeSeparatorLimits) -> Safety {
        let mut rng = StdRng::seed_from_u64(limits.seed);
        let separator = VertexSet::from_slice(graph.n(), separator);
        figure_out_safety(graph, &separator, &limits, &mut rng)
    }

    #[test]
    fn safe_clique_separator() {
        let graph = attached_cliques(&[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert_eq!(
            safety(&graph, &[0, 1, 2, 3], SafeSeparatorLimits::default()),
            Safety::Safe(SafetyProof::Clique)
        );
    }

    #[test]
    fn safe_almost_clique_separator() {
        let graph = attached_cliques(&[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3)]);
        assert_eq!(
            safety(&graph, &[0, 1, 2, 3], SafeSeparatorLimits::default()),
            Safety::Safe(SafetyProof::AlmostClique)
        );
        assert_eq!(
            safety(&graph, &[0, 1, 2, 3], SafeSeparatorLimits::cliques_only()),
            Safety::Unsafe
        );
    }

    #[test]
    fn minor_safe_separator() {
        // no edges inside the separator, but every side can contract onto it
        let graph = attached_cliques(&[]);
        let limits = SafeSeparatorLimits::default().check_almost_clique(false);
        assert_eq!(
            safety(&graph, &[0, 1, 2, 3], limits),
            Safety::Safe(SafetyProof::CliqueMinor)
        );
    }

    #[test]
    fn single_component_is_unsafe() {
        let graph = attached_cliques(&[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert_eq!(
            safety(&graph, &[4, 5, 6, 7], SafeSeparatorLimits::default()),
            Safety::Unsafe
        );
    }

    #[test]
    fn cycle_separator_is_unsafe() {
        // 2 and 5 split the 8-cycle into two paths
        let edges: Vec<_> = (0..8).map(|i| (i, (i + 1) % 8)).collect();
        let graph = Graph::from_edges(8, &edges);
        let limits = SafeSeparatorLimits::default()
            .check_almost_clique(false)
            .check_minor_safe(false);
        assert_eq!(safety(&graph, &[2, 5], limits), Safety::Unsafe);
        assert_eq!(
            safety(&graph, &[2, 5], SafeSeparatorLimits::default()),
            Safety::Safe(SafetyProof::AlmostClique)
        );
    }
}
