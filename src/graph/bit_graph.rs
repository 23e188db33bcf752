use crate::datastructures::VertexSet;
use crate::graph::base_graph::BaseGraph;

/// Simple undirected graph on the vertices `0..n`, with adjacency rows stored as bit sets.
///
/// Edges are only added while the graph is built. All algorithms of the crate treat a
/// finished `Graph` as read-only and derive new graphs instead of mutating it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    neighbors: Vec<VertexSet>,
    edge_count: usize,
}

impl Graph {
    pub fn new(n: usize) -> Self {
        Self {
            neighbors: vec![VertexSet::new(n); n],
            edge_count: 0,
        }
    }

    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut graph = Self::new(n);
        for (u, v) in edges.iter().copied() {
            graph.add_edge(u, v);
        }
        graph
    }

    /// Adds the undirected edge `{u, v}`. Self loops and duplicates are ignored.
    pub fn add_edge(&mut self, u: usize, v: usize) {
        if u != v && self.neighbors[u].insert(v) {
            self.neighbors[v].insert(u);
            self.edge_count += 1;
        }
    }

    pub fn fill(&mut self, vertices: &VertexSet) {
        for u in vertices.iter() {
            for v in vertices.iter().filter(|v| *v > u) {
                self.add_edge(u, v);
            }
        }
    }

    /// Number of vertices.
    #[inline]
    pub fn n(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .flat_map(|(u, nb)| nb.iter().filter(move |v| *v > u).map(move |v| (u, v)))
    }

    pub fn all(&self) -> VertexSet {
        VertexSet::new_all_set(self.n())
    }

    #[inline]
    pub fn neighborhood_set(&self, u: usize) -> &VertexSet {
        &self.neighbors[u]
    }

    /// `N[u]`, the neighborhood of `u` including `u`.
    pub fn closed_neighborhood(&self, u: usize) -> VertexSet {
        let mut set = self.neighbors[u].clone();
        set.insert(u);
        set
    }

    #[inline]
    pub fn are_adjacent(&self, u: usize, v: usize) -> bool {
        self.neighbors[u].contains(v)
    }

    pub fn min_degree(&self) -> usize {
        self.neighbors
            .iter()
            .map(VertexSet::cardinality)
            .min()
            .unwrap_or(0)
    }

    /// `N(c) \ c`.
    pub fn exterior_border(&self, c: &VertexSet) -> VertexSet {
        let mut border = VertexSet::new(self.n());
        for v in c.iter() {
            border.union_with(&self.neighbors[v])
        }
        border.difference_with(c);
        border
    }

    /// Connected component of `G - excluded` that contains `v`.
    pub fn component_containing(&self, v: usize, excluded: &VertexSet) -> VertexSet {
        let mut component = VertexSet::new(self.n());
        component.insert(v);
        let mut frontier = component.clone();
        loop {
            let mut next = VertexSet::new(self.n());
            for w in frontier.iter() {
                next.union_with(&self.neighbors[w]);
            }
            next.difference_with(excluded);
            next.difference_with(&component);
            if next.is_empty() {
                return component;
            }
            component.union_with(&next);
            frontier = next;
        }
    }

    /// Connected components of `G - excluded`, ordered by their smallest vertex.
    pub fn components(&self, excluded: &VertexSet) -> Vec<VertexSet> {
        let mut rest = self.all();
        rest.difference_with(excluded);
        let mut components = Vec::new();
        while let Some(v) = rest.first() {
            let component = self.component_containing(v, excluded);
            rest.difference_with(&component);
            components.push(component);
        }
        components
    }

    pub fn is_connected(&self) -> bool {
        self.n() == 0 || self.components(&VertexSet::new(self.n())).len() == 1
    }

    /// Components `C` of `G - separator` with `N(C) = separator`.
    pub fn full_components(&self, separator: &VertexSet) -> Vec<VertexSet> {
        self.components(separator)
            .into_iter()
            .filter(|c| self.exterior_border(c).cardinality() == separator.cardinality())
            .collect()
    }

    /// A separator is minimal iff it has at least two full components.
    pub fn is_minimal_separator(&self, separator: &VertexSet) -> bool {
        let mut full = 0;
        for c in self.components(separator) {
            if self.exterior_border(&c).cardinality() == separator.cardinality() {
                full += 1;
                if full >= 2 {
                    return true;
                }
            }
        }
        false
    }

    pub fn is_clique_set(&self, vertices: &VertexSet) -> bool {
        vertices.iter().all(|v| {
            let mut rest = vertices.difference(&self.neighbors[v]);
            rest.remove(v);
            rest.is_empty()
        })
    }

    /// Pairs `(u, v)` with `u < v` of `vertices` that are not adjacent.
    pub fn missing_edges(&self, vertices: &VertexSet) -> Vec<(usize, usize)> {
        let mut missing = Vec::new();
        for u in vertices.iter() {
            for v in vertices.iter().filter(|v| *v > u) {
                if !self.are_adjacent(u, v) {
                    missing.push((u, v));
                }
            }
        }
        missing
    }

    /// Some vertex `v` of `vertices` such that `vertices - v` is a clique.
    pub fn almost_clique_center(&self, vertices: &VertexSet) -> Option<usize> {
        let missing = self.missing_edges(vertices);
        let (a, b) = match missing.first() {
            None => return vertices.first(),
            Some(edge) => *edge,
        };
        [a, b]
            .iter()
            .copied()
            .find(|c| missing.iter().all(|(u, v)| u == c || v == c))
    }

    /// Graph on `inv.len()` vertices where local vertex `i` stands for `inv[i]` of `self`.
    ///
    /// `conv` is the inverse mapping, holding `Some(i)` for every vertex kept.
    pub fn inherit_edges(&self, conv: &[Option<usize>], inv: &[usize]) -> Graph {
        let mut local = Graph::new(inv.len());
        for (i, v) in inv.iter().copied().enumerate() {
            for w in self.neighbors[v].iter() {
                if let Some(j) = conv[w] {
                    if i < j {
                        local.add_edge(i, j);
                    }
                }
            }
        }
        local
    }

    /// Subgraph induced by `vertices`, together with the local-to-original vertex map.
    pub fn induced(&self, vertices: &VertexSet) -> (Graph, Vec<usize>) {
        let inv = vertices.to_vec();
        let mut conv = vec![None; self.n()];
        for (i, v) in inv.iter().enumerate() {
            conv[*v] = Some(i);
        }
        (self.inherit_edges(&conv, &inv), inv)
    }
}

impl BaseGraph for Graph {
    fn degree(&self, u: usize) -> usize {
        self.neighbors[u].cardinality()
    }

    fn order(&self) -> usize {
        self.neighbors.len()
    }

    fn is_clique(&self, vertices: &[usize]) -> bool {
        for (i, u) in vertices.iter().enumerate() {
            for v in vertices.iter().skip(i + 1) {
                if !self.neighbors[*u].contains(*v) {
                    return false;
                }
            }
        }
        true
    }

    fn has_edge(&self, u: usize, v: usize) -> bool {
        self.neighbors[u].contains(v)
    }

    fn vertices(&self) -> Box<dyn Iterator<Item = usize>> {
        Box::new(0..self.neighbors.len())
    }

    fn neighborhood(&self, u: usize) -> Box<dyn Iterator<Item = usize> + '_> {
        Box::new(self.neighbors[u].iter())
    }
}

#[cfg(test)]
mod tests {
    use crate::datastructures::VertexSet;
    use crate::graph::base_graph::BaseGraph;
    use crate::graph::bit_graph::Graph;

    fn two_triangles() -> Graph {
        Graph::from_edges(
            6,
            &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (1, 4), (1, 5)],
        )
    }

    #[test]
    fn edges_and_degree() {
        let mut graph = Graph::new(3);
        graph.add_edge(0, 1);
        graph.add_edge(1, 0);
        graph.add_edge(2, 2);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.degree(0), 1);
        assert_eq!(graph.degree(2), 0);
        assert_eq!(graph.min_degree(), 0);
        assert_eq!(graph.edges().collect::<Vec<_>>(), vec![(0, 1)]);
    }

    #[test]
    fn components_after_removing_cut_vertex() {
        let graph = two_triangles();
        let cut = VertexSet::from_slice(6, &[1]);

        let components = graph.components(&cut);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].to_vec(), vec![0, 2]);
        assert_eq!(components[1].to_vec(), vec![3, 4, 5]);
        assert!(graph.is_minimal_separator(&cut));
        assert_eq!(graph.full_components(&cut).len(), 2);
    }

    #[test]
    fn components_of_disconnected_graph() {
        let graph = Graph::from_edges(5, &[(0, 3), (1, 4)]);
        let components = graph.components(&VertexSet::new(5));
        assert_eq!(components.len(), 3);
        assert_eq!(components[0].to_vec(), vec![0, 3]);
        assert_eq!(components[1].to_vec(), vec![1, 4]);
        assert_eq!(components[2].to_vec(), vec![2]);
        assert!(!graph.is_connected());
    }

    #[test]
    fn exterior_border() {
        let graph = two_triangles();
        let c = VertexSet::from_slice(6, &[4, 5]);
        assert_eq!(graph.exterior_border(&c).to_vec(), vec![1, 3]);
    }

    #[test]
    fn cliques_and_almost_cliques() {
        let graph = Graph::from_edges(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3)]);
        let all = graph.all();

        assert!(!graph.is_clique_set(&all));
        assert_eq!(graph.missing_edges(&all), vec![(2, 3)]);
        assert!(graph.almost_clique_center(&all).is_some());
        assert!(graph.is_clique_set(&VertexSet::from_slice(4, &[0, 1, 2])));

        let square = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        assert_eq!(square.almost_clique_center(&square.all()), None);
    }

    #[test]
    fn induced_subgraph() {
        let graph = two_triangles();
        let (sub, inv) = graph.induced(&VertexSet::from_slice(6, &[1, 4, 5]));
        assert_eq!(inv, vec![1, 4, 5]);
        assert_eq!(sub.n(), 3);
        assert!(sub.is_clique(&[0, 1, 2]));
    }

    #[test]
    fn non_minimal_separator() {
        // path 0 - 1 - 2 - 3, {1, 2} has only one full component
        let graph = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        let separator = VertexSet::from_slice(4, &[1, 2]);
        assert_eq!(graph.components(&separator).len(), 2);
        assert!(!graph.is_minimal_separator(&separator));
    }
}
