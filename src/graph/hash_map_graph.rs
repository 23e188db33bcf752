use crate::graph::base_graph::BaseGraph;
use crate::graph::mutable_graph::MutableGraph;
use fxhash::FxHashMap;
use fxhash::FxHashSet;
use rand::prelude::{SliceRandom, StdRng};
use rand::Rng;
use std::collections::VecDeque;

#[cfg(feature = "handle-ctrlc")]
use crate::signals::received_ctrl_c;

/// Adjacency-set graph over arbitrary vertex ids, used where the graph changes shape:
/// elimination games, contractions and minor searches.
#[derive(Clone, Debug)]
pub struct HashMapGraph {
    data: FxHashMap<usize, FxHashSet<usize>>,
}

impl HashMapGraph {
    pub fn has_vertex(&self, u: usize) -> bool {
        self.data.contains_key(&u)
    }

    pub fn neighborhood_set(&self, u: usize) -> &FxHashSet<usize> {
        &self.data[&u]
    }

    pub fn from_graph<G: BaseGraph>(graph: &G) -> Self {
        let data = graph
            .vertices()
            .map(|v| (v, graph.neighborhood(v).collect()))
            .collect();
        HashMapGraph { data }
    }

    /// Subgraph induced by `vertices`. Vertices keep their ids.
    pub fn vertex_induced(&self, vertices: &FxHashSet<usize>) -> Self {
        let data = vertices
            .iter()
            .copied()
            .filter(|v| self.data.contains_key(v))
            .map(|v| {
                let nb = self.data[&v]
                    .iter()
                    .copied()
                    .filter(|u| vertices.contains(u))
                    .collect();
                (v, nb)
            })
            .collect();
        HashMapGraph { data }
    }

    /// Tries to turn `clique` into a clique by contracting edges that have at least one
    /// endpoint outside of `clique`.
    ///
    /// Each missing edge is closed either by contracting a common neighbor into one of its
    /// endpoints, or by contracting a shortest path through non-members. Failed attempts are
    /// retried on a fresh copy with a new random edge order, at most `max_tries` times.
    pub fn has_clique_minor(
        &self,
        clique: &FxHashSet<usize>,
        max_tries: usize,
        max_missing: usize,
        rng: &mut StdRng,
    ) -> bool {
        let mut missing_edges: Vec<(usize, usize)> = Vec::new();
        for u in clique.iter().copied() {
            for v in clique
                .iter()
                .copied()
                .filter(|v| u < *v && !self.data[v].contains(&u))
            {
                missing_edges.push((u, v));
            }
        }
        missing_edges.sort_unstable();
        if missing_edges.len() > max_missing {
            return false;
        }

        'outer: for _ in 0..max_tries {
            let mut tmp = self.clone();
            missing_edges.shuffle(rng);
            for (u, v) in missing_edges.iter().copied() {
                #[cfg(feature = "handle-ctrlc")]
                if received_ctrl_c() {
                    return false;
                }
                if tmp.data[&v].contains(&u) {
                    continue;
                }
                let mut common_neighbors: Vec<_> = tmp.data[&u]
                    .iter()
                    .copied()
                    .filter(|x| !clique.contains(x) && tmp.data[&v].contains(x))
                    .collect();
                if !common_neighbors.is_empty() {
                    common_neighbors.sort_unstable();
                    let contractor = common_neighbors[rng.gen_range(0..common_neighbors.len())];
                    if rng.gen_bool(0.5) {
                        tmp.contract(contractor, v);
                    } else {
                        tmp.contract(contractor, u);
                    }
                } else {
                    let mut queue = VecDeque::new();
                    queue.push_back(v);
                    let mut pre: FxHashMap<_, _> = clique.iter().copied().map(|v| (v, v)).collect();
                    pre.remove(&u);
                    while !pre.contains_key(&u) {
                        let x = match queue.pop_front() {
                            Some(x) => x,
                            None => break,
                        };
                        let mut nb: Vec<_> = tmp.data[&x].iter().copied().collect();
                        nb.sort_unstable();
                        for k in nb {
                            if pre.contains_key(&k) {
                                continue;
                            }
                            pre.insert(k, x);
                            queue.push_back(k);
                            if k == u {
                                break;
                            }
                        }
                    }
                    match pre.get(&u).copied() {
                        Some(mut current) => {
                            while current != v {
                                let next = pre[&current];
                                tmp.contract(current, u);
                                current = next;
                            }
                        }
                        None => continue 'outer,
                    }
                }
            }
            return true;
        }
        false
    }
}

impl MutableGraph for HashMapGraph {
    fn add_vertex(&mut self, u: usize) {
        self.data.entry(u).or_insert_with(FxHashSet::default);
    }

    fn remove_vertex(&mut self, u: usize) {
        if let Some(neighbors) = self.data.remove(&u) {
            for i in neighbors.iter() {
                if let Some(nb) = self.data.get_mut(i) {
                    nb.remove(&u);
                }
            }
        }
    }

    fn add_edge(&mut self, u: usize, v: usize) {
        assert_ne!(u, v);
        self.data.entry(u).or_insert_with(FxHashSet::default).insert(v);
        self.data.entry(v).or_insert_with(FxHashSet::default).insert(u);
    }

    fn remove_edge(&mut self, u: usize, v: usize) {
        assert_ne!(u, v);
        if let Some(x) = self.data.get_mut(&u) {
            x.remove(&v);
        }
        if let Some(x) = self.data.get_mut(&v) {
            x.remove(&u);
        }
    }

    fn eliminate_vertex(&mut self, u: usize) {
        let nb = match self.data.remove(&u) {
            Some(nb) => nb,
            None => return,
        };
        for i in &nb {
            if let Some(x) = self.data.get_mut(i) {
                x.remove(&u);
            }
        }
        let nb: Vec<_> = nb.into_iter().collect();
        self.make_clique(&nb);
    }

    fn contract(&mut self, u: usize, v: usize) {
        assert_ne!(u, v);
        assert!(self.data.contains_key(&v));
        let nb = match self.data.remove(&u) {
            Some(nb) => nb,
            None => return,
        };

        for vertex in nb {
            if vertex == v {
                continue;
            }
            if let Some(a) = self.data.get_mut(&vertex) {
                a.remove(&u);
                a.insert(v);
            }
            if let Some(b) = self.data.get_mut(&v) {
                b.insert(vertex);
            }
        }
        if let Some(b) = self.data.get_mut(&v) {
            b.remove(&u);
        }
    }

    fn new() -> Self {
        HashMapGraph {
            data: FxHashMap::default(),
        }
    }

    fn with_capacity(capacity: usize) -> Self {
        HashMapGraph {
            data: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }
}

impl BaseGraph for HashMapGraph {
    fn degree(&self, u: usize) -> usize {
        self.data[&u].len()
    }

    fn order(&self) -> usize {
        self.data.len()
    }

    fn is_clique(&self, vertices: &[usize]) -> bool {
        for (i, v) in vertices.iter().enumerate() {
            for u in vertices.iter().skip(i + 1) {
                if !self.data[v].contains(u) {
                    return false;
                }
            }
        }
        true
    }

    fn has_edge(&self, u: usize, v: usize) -> bool {
        self.data.get(&u).map_or(false, |nb| nb.contains(&v))
    }

    fn vertices(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        Box::new(self.data.keys().copied())
    }

    fn neighborhood(&self, u: usize) -> Box<dyn Iterator<Item = usize> + '_> {
        Box::new(self.data[&u].iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::base_graph::BaseGraph;
    use crate::graph::hash_map_graph::HashMapGraph;
    use crate::graph::mutable_graph::MutableGraph;
    use fxhash::FxHashSet;
    use rand::prelude::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_order() {
        let mut graph = HashMapGraph::new();
        assert_eq!(graph.order(), 0);

        graph.add_vertex(0);
        graph.add_vertex(0);
        assert_eq!(graph.order(), 1);
        graph.remove_vertex(0);
        assert_eq!(graph.order(), 0);
    }

    #[test]
    fn test_degree() {
        let mut graph = HashMapGraph::new();
        graph.add_edge(0, 1);

        assert_eq!(graph.degree(0), 1);
        assert_eq!(graph.degree(1), 1);
        assert_eq!(graph.order(), 2);

        graph.add_edge(0, 1);
        assert_eq!(graph.degree(0), 1);

        graph.remove_edge(0, 1);
        assert_eq!(graph.degree(0), 0);
        assert_eq!(graph.degree(1), 0);
        assert_eq!(graph.order(), 2);
    }

    #[test]
    fn eliminate_makes_neighborhood_clique() {
        let mut graph = HashMapGraph::new();
        graph.add_edge(0, 1);
        graph.add_edge(0, 2);
        graph.add_edge(0, 3);
        assert_eq!(graph.fill_in_count(0), 3);
        assert_eq!(graph.defect_count(0), 3);

        graph.eliminate_vertex(0);
        assert_eq!(graph.order(), 3);
        assert!(graph.is_clique(&[1, 2, 3]));
        assert!(!graph.has_vertex(0));
    }

    #[test]
    fn defect_ignores_universal_neighbors() {
        // 0 is adjacent to 1, 2, 3; only 2 and 3 miss each other
        let mut graph = HashMapGraph::new();
        graph.add_edge(0, 1);
        graph.add_edge(0, 2);
        graph.add_edge(0, 3);
        graph.add_edge(1, 2);
        graph.add_edge(1, 3);
        assert_eq!(graph.fill_in_count(0), 1);
        assert_eq!(graph.defect_count(0), 2);
    }

    #[test]
    fn contract() {
        let mut graph = HashMapGraph::new();
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);

        graph.contract(1, 2);
        assert_eq!(graph.order(), 3);
        assert!(graph.has_edge(0, 2));
        assert!(graph.has_edge(2, 3));
        assert!(!graph.has_edge(2, 2));
    }

    #[test]
    fn clique_minor_over_cycle() {
        // cycle 0 - 1 - 2 - 3 - 4 - 5, terminals 0, 2, 4 form a triangle minor
        let mut graph = HashMapGraph::new();
        for i in 0..6 {
            graph.add_edge(i, (i + 1) % 6);
        }
        let terminals: FxHashSet<usize> = [0, 2, 4].iter().copied().collect();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(graph.has_clique_minor(&terminals, 5, 5, &mut rng));
        assert_eq!(graph.order(), 6);
    }

    #[test]
    fn no_clique_minor_in_star_leaves() {
        // leaves of a star share a single center, so no two disjoint connections exist
        let mut graph = HashMapGraph::new();
        graph.add_edge(0, 1);
        graph.add_edge(0, 2);
        graph.add_edge(0, 3);
        let terminals: FxHashSet<usize> = [1, 2, 3].iter().copied().collect();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(!graph.has_clique_minor(&terminals, 10, 5, &mut rng));
    }

    #[test]
    fn too_many_missing_edges() {
        let mut graph = HashMapGraph::new();
        for i in 0..4 {
            graph.add_vertex(i);
        }
        let terminals: FxHashSet<usize> = (0..4).collect();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(!graph.has_clique_minor(&terminals, 10, 5, &mut rng));
    }
}
