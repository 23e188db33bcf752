use crate::graph::BaseGraph;
use fxhash::{FxHashMap, FxHashSet};
use std::cmp::max;
use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    HasCycle,
    NotConnected,
    MissingVertex(usize),
    MissingEdge((usize, usize)),
    NotInducingSubtree(usize),
    /// No bag below the endpoints of a nested tree edge contains its separator.
    UnplacedSeparator(Vec<usize>),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::HasCycle => write!(f, "Has Cycle"),
            ValidationError::NotConnected => write!(f, "Not Connected"),
            ValidationError::MissingVertex(v) => write!(f, "Missing Vertex: {}", v),
            ValidationError::MissingEdge((u, v)) => write!(f, "Missing Edge: ({}, {})", u, v),
            ValidationError::NotInducingSubtree(v) => write!(f, "Not Inducing Subtree: {}", v),
            ValidationError::UnplacedSeparator(s) => write!(f, "Unplaced Separator: {:?}", s),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatBag {
    pub id: usize,
    pub vertex_set: FxHashSet<usize>,
    pub neighbors: FxHashSet<usize>,
}

/// Plain tree decomposition: a list of bags and undirected tree edges between them.
#[derive(Debug, Clone, Default)]
pub struct TreeDecomposition {
    pub bags: Vec<FlatBag>,
    pub root: Option<usize>,
    pub max_bag_size: usize,
}

impl TreeDecomposition {
    pub fn with_root(vertex_set: FxHashSet<usize>) -> Self {
        let mut td = Self::default();
        td.add_bag(vertex_set);
        td
    }

    pub fn add_bag(&mut self, vertex_set: FxHashSet<usize>) -> usize {
        let id = self.bags.len();
        if id == 0 {
            self.root = Some(id);
        }
        self.max_bag_size = max(self.max_bag_size, vertex_set.len());
        self.bags.push(FlatBag {
            id,
            vertex_set,
            neighbors: FxHashSet::default(),
        });
        id
    }

    pub fn add_edge(&mut self, b1: usize, b2: usize) {
        assert!(b1 < self.bags.len());
        assert!(b2 < self.bags.len());
        assert_ne!(b1, b2);
        self.bags[b1].neighbors.insert(b2);
        self.bags[b2].neighbors.insert(b1);
    }

    pub fn bags(&self) -> &[FlatBag] {
        &self.bags
    }

    /// Each tree edge once, as `(smaller id, larger id)`.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<_> = self
            .bags
            .iter()
            .flat_map(|b| {
                b.neighbors
                    .iter()
                    .copied()
                    .filter(move |n| *n > b.id)
                    .map(move |n| (b.id, n))
            })
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Largest bag size minus one, `-1` for a decomposition without bags.
    pub fn width(&self) -> isize {
        self.max_bag_size as isize - 1
    }

    /// Appends `other`, whose vertex `v` stands for `vertex_map[v]` of this decomposition.
    ///
    /// The root of `other` is connected to `join_bag`, or to the root of `self` if no bag is
    /// given. Panics if `join_bag` is not a bag of `self`. If both decompositions cover disjoint vertex sets any connecting edge keeps
    /// the result valid.
    pub fn combine_with(
        &mut self,
        other: TreeDecomposition,
        vertex_map: &[usize],
        join_bag: Option<usize>,
    ) {
        let offset = self.bags.len();
        let join = join_bag.or(self.root);
        if let Some(join) = join {
            assert!(join < offset, "join bag {} out of range", join);
        }
        let other_root = other.root.map(|r| r + offset);
        for bag in other.bags {
            let vertex_set = bag.vertex_set.iter().map(|v| vertex_map[*v]).collect();
            let id = self.add_bag(vertex_set);
            self.bags[id].neighbors = bag.neighbors.iter().map(|n| n + offset).collect();
        }
        if let (Some(other_root), Some(join)) = (other_root, join) {
            self.add_edge(join, other_root);
        }
    }

    pub fn dfs(&self) -> TreeDecompositionIterator {
        let mut visited = vec![false; self.bags.len()];
        let stack = match self.root {
            Some(root) => {
                visited[root] = true;
                vec![root]
            }
            None => vec![],
        };
        TreeDecompositionIterator {
            td: self,
            stack,
            visited,
        }
    }

    /// Checks vertex coverage, edge coverage, running intersection and the tree shape.
    pub fn verify<G: BaseGraph>(&self, graph: &G) -> Result<(), ValidationError> {
        if !self.is_connected() {
            return Err(ValidationError::NotConnected);
        }

        if self.is_cyclic() {
            return Err(ValidationError::HasCycle);
        }

        let occurrences = self.occurrences();

        if let Some(v) = graph.vertices().find(|v| !occurrences.contains_key(v)) {
            return Err(ValidationError::MissingVertex(v));
        }

        if let Some(e) = self.get_missing_edge(graph, &occurrences) {
            return Err(ValidationError::MissingEdge(e));
        }

        if let Some(v) = self.get_vertex_not_inducing_subtree(&occurrences) {
            return Err(ValidationError::NotInducingSubtree(v));
        }

        Ok(())
    }

    fn occurrences(&self) -> FxHashMap<usize, Vec<usize>> {
        let mut occurrences: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
        for bag in &self.bags {
            for v in bag.vertex_set.iter().copied() {
                occurrences.entry(v).or_default().push(bag.id);
            }
        }
        occurrences
    }

    fn is_connected(&self) -> bool {
        self.dfs().count() == self.bags.len()
    }

    fn is_cyclic(&self) -> bool {
        let edges: usize = self.bags.iter().map(|b| b.neighbors.len()).sum::<usize>() / 2;
        !self.bags.is_empty() && edges != self.bags.len() - 1
    }

    fn get_missing_edge<G: BaseGraph>(
        &self,
        graph: &G,
        occurrences: &FxHashMap<usize, Vec<usize>>,
    ) -> Option<(usize, usize)> {
        for u in graph.vertices() {
            let bags_of_u = occurrences.get(&u)?;
            for v in graph.neighborhood(u).filter(|v| u < *v) {
                if !bags_of_u
                    .iter()
                    .any(|b| self.bags[*b].vertex_set.contains(&v))
                {
                    return Some((u, v));
                }
            }
        }
        None
    }

    fn get_vertex_not_inducing_subtree(
        &self,
        occurrences: &FxHashMap<usize, Vec<usize>>,
    ) -> Option<usize> {
        for (u, bags_of_u) in occurrences {
            let first = bags_of_u[0];
            let mut visited: FxHashSet<usize> = FxHashSet::default();
            visited.insert(first);
            let mut stack: Vec<usize> = vec![first];
            while let Some(c) = stack.pop() {
                for n in self.bags[c].neighbors.iter().copied() {
                    if !visited.contains(&n) && self.bags[n].vertex_set.contains(u) {
                        stack.push(n);
                        visited.insert(n);
                    }
                }
            }
            if visited.len() != bags_of_u.len() {
                return Some(*u);
            }
        }
        None
    }
}

pub struct TreeDecompositionIterator<'a> {
    td: &'a TreeDecomposition,
    stack: Vec<usize>,
    visited: Vec<bool>,
}

impl<'a> Iterator for TreeDecompositionIterator<'a> {
    type Item = &'a FlatBag;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        for c in self.td.bags[current].neighbors.iter().copied() {
            if !self.visited[c] {
                self.stack.push(c);
                self.visited[c] = true;
            }
        }
        Some(&self.td.bags[current])
    }
}
