use crate::datastructures::{BinaryQueue, VertexSet};
use crate::graph::{Bag, BaseGraph, HashMapGraph, MutableGraph};
use fxhash::FxHashSet;
use std::cmp::max;
use std::fmt;
use std::str::FromStr;

/// Scores vertices of an elimination game. Lower values are eliminated first.
pub trait Selector: From<HashMapGraph> {
    fn graph(&self) -> &HashMapGraph;
    fn value(&self, v: usize) -> usize;
    /// Eliminates `v` and returns every vertex whose value may have changed.
    fn eliminate_vertex(&mut self, v: usize) -> Vec<usize>;
}

/// Neighbors of `v` and their neighbors, read after `v` was eliminated.
fn within_distance_two(graph: &HashMapGraph, neighbors: &FxHashSet<usize>) -> Vec<usize> {
    let mut affected: FxHashSet<usize> = neighbors.clone();
    for u in neighbors {
        affected.extend(graph.neighborhood_set(*u).iter().copied());
    }
    let mut affected: Vec<_> = affected.into_iter().collect();
    affected.sort_unstable();
    affected
}

pub struct MinDegreeSelector {
    graph: HashMapGraph,
}

impl From<HashMapGraph> for MinDegreeSelector {
    fn from(graph: HashMapGraph) -> Self {
        Self { graph }
    }
}

impl Selector for MinDegreeSelector {
    fn graph(&self) -> &HashMapGraph {
        &self.graph
    }

    fn value(&self, v: usize) -> usize {
        self.graph.degree(v)
    }

    fn eliminate_vertex(&mut self, v: usize) -> Vec<usize> {
        let mut neighbors: Vec<_> = self.graph.neighborhood_set(v).iter().copied().collect();
        neighbors.sort_unstable();
        self.graph.eliminate_vertex(v);
        neighbors
    }
}

/// Counts the neighbors that are not adjacent to all other neighbors.
pub struct MinDefectSelector {
    graph: HashMapGraph,
}

impl From<HashMapGraph> for MinDefectSelector {
    fn from(graph: HashMapGraph) -> Self {
        Self { graph }
    }
}

impl Selector for MinDefectSelector {
    fn graph(&self) -> &HashMapGraph {
        &self.graph
    }

    fn value(&self, v: usize) -> usize {
        self.graph.defect_count(v)
    }

    fn eliminate_vertex(&mut self, v: usize) -> Vec<usize> {
        let neighbors = self.graph.neighborhood_set(v).clone();
        self.graph.eliminate_vertex(v);
        within_distance_two(&self.graph, &neighbors)
    }
}

/// Keeps, for every vertex, the number of edges among its neighbors up to date, so the
/// fill-in is available without scanning the neighborhood.
pub struct MinFillSelector {
    graph: HashMapGraph,
    cache: Vec<usize>,
}

impl From<HashMapGraph> for MinFillSelector {
    fn from(graph: HashMapGraph) -> Self {
        let size = graph.vertices().max().map_or(0, |v| v + 1);
        let mut cache = vec![0; size];
        for u in graph.vertices() {
            for v in graph.neighborhood(u).filter(|v| u < *v) {
                graph
                    .neighborhood_set(u)
                    .iter()
                    .copied()
                    .filter(|x| v < *x && graph.has_edge(*x, v))
                    .for_each(|x| {
                        cache[x] += 1;
                        cache[u] += 1;
                        cache[v] += 1;
                    })
            }
        }
        Self { graph, cache }
    }
}

impl Selector for MinFillSelector {
    fn graph(&self) -> &HashMapGraph {
        &self.graph
    }

    fn value(&self, v: usize) -> usize {
        let deg = self.graph.degree(v);
        (deg * deg - deg) / 2 - self.cache[v]
    }

    fn eliminate_vertex(&mut self, v: usize) -> Vec<usize> {
        let neighbors = self.graph.neighborhood_set(v).clone();
        let mut to_add: Vec<(usize, usize)> = vec![];
        for u in neighbors.iter().copied() {
            for w in neighbors
                .iter()
                .copied()
                .filter(|w| u < *w && !self.graph.has_edge(u, *w))
            {
                to_add.push((u, w));
            }
        }
        for (u, w) in to_add {
            self.add_edge(u, w);
        }
        for u in neighbors.iter().copied() {
            self.remove_edge(v, u);
        }
        self.graph.remove_vertex(v);
        within_distance_two(&self.graph, &neighbors)
    }
}

impl MinFillSelector {
    fn add_edge(&mut self, u: usize, v: usize) {
        self.graph.add_edge(u, v);
        let common: Vec<_> = self
            .graph
            .neighborhood_set(u)
            .iter()
            .copied()
            .filter(|x| self.graph.has_edge(*x, v))
            .collect();
        for x in common {
            self.cache[x] += 1;
            self.cache[u] += 1;
            self.cache[v] += 1;
        }
    }

    fn remove_edge(&mut self, u: usize, v: usize) {
        self.graph.remove_edge(u, v);
        let common: Vec<_> = self
            .graph
            .neighborhood_set(u)
            .iter()
            .copied()
            .filter(|x| self.graph.has_edge(*x, v))
            .collect();
        for x in common {
            self.cache[x] -= 1;
            self.cache[u] -= 1;
            self.cache[v] -= 1;
        }
    }
}

/// Scoring rule of the greedy elimination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Fill,
    Defect,
    Degree,
}

impl Mode {
    pub fn all() -> Vec<Mode> {
        vec![Mode::Fill, Mode::Defect, Mode::Degree]
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Fill => write!(f, "fill"),
            Mode::Defect => write!(f, "defect"),
            Mode::Degree => write!(f, "degree"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fill" => Ok(Mode::Fill),
            "defect" => Ok(Mode::Defect),
            "degree" => Ok(Mode::Degree),
            other => Err(format!("unknown heuristic '{}'", other)),
        }
    }
}

/// Fills the root of a fresh [`Bag`] with the decomposition induced by a greedy elimination
/// ordering.
///
/// Eliminating `v` yields the bag `N[v]`, attached through the separator `N(v)` to the bag of
/// the earliest eliminated vertex of `N(v)`. Once the remaining graph is no larger than the
/// largest bag produced so far, all remaining vertices form one final bag.
pub struct GreedyDecomposer<'a> {
    bag: &'a mut Bag,
    mode: Mode,
}

impl<'a> GreedyDecomposer<'a> {
    pub fn new(bag: &'a mut Bag, mode: Mode) -> Self {
        Self { bag, mode }
    }

    pub fn decompose(self) {
        match self.mode {
            Mode::Fill => self.run::<MinFillSelector>(),
            Mode::Defect => self.run::<MinDefectSelector>(),
            Mode::Degree => self.run::<MinDegreeSelector>(),
        }
    }

    fn run<S: Selector>(self) {
        let bag = self.bag;
        let graph = bag.shared_graph();
        let n = graph.n();
        if n == 0 {
            return;
        }
        let mut selector = S::from(HashMapGraph::from_graph(graph.as_ref()));
        let mut queue = BinaryQueue::new(n);
        for v in 0..n {
            queue.insert(v, (selector.value(v), selector.graph().degree(v)));
        }

        let mut max_bag = 2;
        let mut eliminated: Vec<(usize, VertexSet)> = Vec::new();
        while let Some((v, _)) = queue.pop_min() {
            if selector.graph().order() <= max_bag {
                break;
            }
            let neighbors = VertexSet::from_iter(
                n,
                selector.graph().neighborhood_set(v).iter().copied(),
            );
            max_bag = max(max_bag, neighbors.cardinality() + 1);
            for u in selector.eliminate_vertex(v) {
                if queue.contains(u) {
                    queue.insert(u, (selector.value(u), selector.graph().degree(u)));
                }
            }
            eliminated.push((v, neighbors));
        }

        let mut position = vec![usize::MAX; n];
        for (i, (v, _)) in eliminated.iter().enumerate() {
            position[*v] = i;
        }
        let rest = VertexSet::from_iter(n, selector.graph().vertices());
        let rest_bag = if rest.is_empty() {
            None
        } else {
            Some(bag.add_nested_bag(Bag::ROOT, rest))
        };

        let mut bag_of = vec![usize::MAX; eliminated.len()];
        let mut last_created = rest_bag;
        for (i, (v, neighbors)) in eliminated.into_iter().enumerate().rev() {
            let mut vertex_set = neighbors.clone();
            vertex_set.insert(v);
            let id = bag.add_nested_bag(Bag::ROOT, vertex_set);
            bag_of[i] = id;

            let parent = neighbors
                .iter()
                .map(|u| position[u])
                .min()
                .and_then(|j| if j == usize::MAX { rest_bag } else { Some(bag_of[j]) })
                .or(rest_bag)
                .or(last_created);
            if let Some(parent) = parent {
                bag.add_separator(Bag::ROOT, neighbors, id, parent);
            }
            last_created = Some(id);
        }
    }
}
