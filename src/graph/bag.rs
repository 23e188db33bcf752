use crate::datastructures::{UnionFind, VertexSet};
use crate::graph::bit_graph::Graph;
use crate::graph::separator::{classify_separating_set, SafeSeparatorLimits, Safety, Separator};
use crate::tree_decomposition::{TreeDecomposition, ValidationError};
use fxhash::FxHashMap;
use rand::prelude::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::rc::Rc;

pub type BagId = usize;
pub type SeparatorId = usize;

/// Graph a bag is decomposed against, in local numbering. Local vertex `i` is `inv[i]` of the
/// whole graph.
#[derive(Clone, Debug)]
pub struct LocalGraph {
    pub graph: Graph,
    pub inv: Vec<usize>,
}

#[derive(Clone, Debug)]
struct BagNode {
    parent: Option<BagId>,
    vertex_set: VertexSet,
    nested: Vec<BagId>,
    /// Tree edges between the bags in `nested`.
    separators: Vec<SeparatorId>,
    /// Tree edges of the parent that end in this bag.
    incident: Vec<SeparatorId>,
    local: Option<LocalGraph>,
}

impl BagNode {
    fn new(parent: Option<BagId>, vertex_set: VertexSet) -> Self {
        Self {
            parent,
            vertex_set,
            nested: Vec::new(),
            separators: Vec::new(),
            incident: Vec::new(),
            local: None,
        }
    }

    fn detach(&mut self) {
        self.parent = None;
        self.nested.clear();
        self.separators.clear();
        self.incident.clear();
    }
}

/// Tree decomposition whose bags may themselves carry a nested tree decomposition.
///
/// All bags and separators live in one arena and are addressed by id. The root bag covers the
/// whole graph and always has id [`Bag::ROOT`]. Every vertex set is kept in the numbering of
/// the whole graph. Bags that were replaced or merged away stay in the arena, detached from
/// the tree.
#[derive(Clone, Debug)]
pub struct Bag {
    graph: Rc<Graph>,
    nodes: Vec<BagNode>,
    separators: Vec<Separator>,
    separator_width: usize,
}

impl Bag {
    pub const ROOT: BagId = 0;

    pub fn new(graph: Rc<Graph>) -> Self {
        let root = BagNode::new(None, graph.all());
        Self {
            graph,
            nodes: vec![root],
            separators: Vec::new(),
            separator_width: 0,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn shared_graph(&self) -> Rc<Graph> {
        Rc::clone(&self.graph)
    }

    pub fn vertex_set(&self, id: BagId) -> &VertexSet {
        &self.nodes[id].vertex_set
    }

    pub fn size(&self, id: BagId) -> usize {
        self.nodes[id].vertex_set.cardinality()
    }

    pub fn parent(&self, id: BagId) -> Option<BagId> {
        self.nodes[id].parent
    }

    pub fn nested_bags(&self, id: BagId) -> &[BagId] {
        &self.nodes[id].nested
    }

    pub fn separators_of(&self, id: BagId) -> &[SeparatorId] {
        &self.nodes[id].separators
    }

    pub fn incident_separators(&self, id: BagId) -> &[SeparatorId] {
        &self.nodes[id].incident
    }

    pub fn separator(&self, id: SeparatorId) -> &Separator {
        &self.separators[id]
    }

    pub fn local_graph(&self, id: BagId) -> Option<&LocalGraph> {
        self.nodes[id].local.as_ref()
    }

    pub fn is_refinable(&self, id: BagId) -> bool {
        self.nodes[id].local.is_some()
    }

    /// Largest safe separator size minus one, as computed by the last [`Bag::pack`].
    pub fn separator_width(&self) -> usize {
        self.separator_width
    }

    pub fn add_nested_bag(&mut self, parent: BagId, vertex_set: VertexSet) -> BagId {
        let id = self.nodes.len();
        self.nodes.push(BagNode::new(Some(parent), vertex_set));
        self.nodes[parent].nested.push(id);
        id
    }

    pub fn add_separator(
        &mut self,
        parent: BagId,
        vertex_set: VertexSet,
        a: BagId,
        b: BagId,
    ) -> SeparatorId {
        debug_assert_eq!(self.nodes[a].parent, Some(parent));
        debug_assert_eq!(self.nodes[b].parent, Some(parent));
        let id = self.separators.len();
        self.separators.push(Separator::new(vertex_set, a, b));
        self.nodes[parent].separators.push(id);
        self.nodes[a].incident.push(id);
        self.nodes[b].incident.push(id);
        id
    }

    /// Width of the decomposition below `id`: the largest leaf bag size minus one.
    pub fn width(&self, id: BagId) -> usize {
        let node = &self.nodes[id];
        if node.nested.is_empty() {
            node.vertex_set.cardinality().saturating_sub(1)
        } else {
            node.nested
                .iter()
                .map(|c| self.width(*c))
                .max()
                .unwrap_or(0)
        }
    }

    /// Size of the largest bag directly nested in `id`.
    pub fn max_nested_bag_size(&self, id: BagId) -> usize {
        self.nodes[id]
            .nested
            .iter()
            .map(|c| self.size(*c))
            .max()
            .unwrap_or(0)
    }

    pub fn count_safe_separators(&self) -> usize {
        self.nodes[Self::ROOT]
            .separators
            .iter()
            .filter(|s| self.separators[**s].safety.is_safe())
            .count()
    }

    /// Classifies every tree edge directly below the root. Edges whose two sides do not both
    /// reach beyond the shared vertices are unsafe; equal vertex sets are only tested once.
    pub fn detect_safe_separators(&mut self, limits: &SafeSeparatorLimits) {
        let mut rng = StdRng::seed_from_u64(limits.seed);
        let mut known: FxHashMap<VertexSet, Safety> = FxHashMap::default();
        let splits = self.splitting_edges();
        let root_separators = self.nodes[Self::ROOT].separators.clone();
        for (sid, splits) in root_separators.into_iter().zip(splits) {
            if !splits {
                self.separators[sid].safety = Safety::Unsafe;
                continue;
            }
            let vertex_set = self.separators[sid].vertex_set.clone();
            let safety = match known.get(&vertex_set) {
                Some(safety) => *safety,
                None => {
                    let safety =
                        classify_separating_set(&self.graph, &vertex_set, limits, &mut rng);
                    known.insert(vertex_set, safety);
                    safety
                }
            };
            self.separators[sid].safety = safety;
        }
    }

    /// For every tree edge below the root, in order, whether both sides of the edge hold a
    /// vertex outside the two bags' intersection. In a valid decomposition the intersection
    /// then leaves at least two components.
    ///
    /// Each vertex is counted at the topmost bag holding it in a breadth-first rooting, so a
    /// subtree holds `below` vertices not in its parent bag and the other side holds the rest.
    fn splitting_edges(&self) -> Vec<bool> {
        let root = &self.nodes[Self::ROOT];
        let k = root.nested.len();
        let mut position = vec![usize::MAX; self.nodes.len()];
        for (i, id) in root.nested.iter().enumerate() {
            position[*id] = i;
        }
        let mut adjacent: Vec<Vec<(usize, usize)>> = vec![Vec::new(); k];
        for (e, sid) in root.separators.iter().enumerate() {
            let (a, b) = self.separators[*sid].incident_bags();
            let (a, b) = (position[a], position[b]);
            adjacent[a].push((b, e));
            adjacent[b].push((a, e));
        }

        let mut order = Vec::with_capacity(k);
        let mut tree = vec![usize::MAX; k];
        let mut parent: Vec<Option<(usize, usize)>> = vec![None; k];
        for start in 0..k {
            if tree[start] != usize::MAX {
                continue;
            }
            tree[start] = start;
            let mut queue = VecDeque::new();
            queue.push_back(start);
            while let Some(x) = queue.pop_front() {
                order.push(x);
                for (y, e) in adjacent[x].iter().copied() {
                    if tree[y] == usize::MAX {
                        tree[y] = start;
                        parent[y] = Some((x, e));
                        queue.push_back(y);
                    }
                }
            }
        }

        let vertex_set = |x: usize| &self.nodes[root.nested[x]].vertex_set;
        let mut seen = VertexSet::new(self.graph.n());
        let mut below = vec![0; k];
        for x in order.iter().copied() {
            below[x] = vertex_set(x).difference(&seen).cardinality();
            seen.union_with(vertex_set(x));
        }
        for x in order.iter().rev().copied() {
            if let Some((p, _)) = parent[x] {
                below[p] += below[x];
            }
        }

        let mut splits = vec![false; root.separators.len()];
        for x in 0..k {
            if let Some((p, e)) = parent[x] {
                let shared = vertex_set(x).intersection_cardinality(vertex_set(p));
                splits[e] = below[x] > 0 && below[tree[x]] > below[x] + shared;
            }
        }
        splits
    }

    /// Merges the bags below the root that are joined by separators not known to be safe.
    ///
    /// Every group of two or more bags becomes a new bag nested in the root, holding the
    /// union of their vertices and keeping the group as its nested decomposition. The safe
    /// separators become the tree edges between these bags.
    pub fn pack(&mut self) {
        let root_nested = self.nodes[Self::ROOT].nested.clone();
        let root_separators = self.nodes[Self::ROOT].separators.clone();
        let mut position = vec![usize::MAX; self.nodes.len()];
        for (i, id) in root_nested.iter().enumerate() {
            position[*id] = i;
        }

        let mut union_find = UnionFind::new(root_nested.len());
        for sid in root_separators.iter().copied() {
            let separator = &self.separators[sid];
            if !separator.safety.is_safe() {
                let (a, b) = separator.incident_bags();
                union_find.union(position[a], position[b]);
            }
        }
        self.separator_width = root_separators
            .iter()
            .map(|s| &self.separators[*s])
            .filter(|s| s.safety.is_safe())
            .map(|s| s.size().saturating_sub(1))
            .max()
            .unwrap_or(0);

        let mut group_index: FxHashMap<usize, usize> = FxHashMap::default();
        let mut groups: Vec<Vec<BagId>> = Vec::new();
        for (i, id) in root_nested.iter().copied().enumerate() {
            let representative = union_find.find(i);
            let next = groups.len();
            let index = *group_index.entry(representative).or_insert(next);
            if index == next {
                groups.push(Vec::new());
            }
            groups[index].push(id);
        }

        let mut piece_of = vec![usize::MAX; self.nodes.len() + groups.len()];
        let mut pieces = Vec::with_capacity(groups.len());
        for group in groups {
            if group.len() == 1 {
                piece_of[group[0]] = group[0];
                pieces.push(group[0]);
                continue;
            }
            let mut vertex_set = VertexSet::new(self.graph.n());
            for member in group.iter() {
                vertex_set.union_with(&self.nodes[*member].vertex_set);
            }
            let piece = self.nodes.len();
            let mut node = BagNode::new(Some(Self::ROOT), vertex_set);
            for member in group.iter().copied() {
                self.nodes[member].parent = Some(piece);
                piece_of[member] = piece;
            }
            node.nested = group;
            self.nodes.push(node);
            pieces.push(piece);
        }

        let mut safe_separators = Vec::new();
        for sid in root_separators {
            let (a, b) = self.separators[sid].incident_bags();
            if self.separators[sid].safety.is_safe() {
                for x in [a, b].iter().copied() {
                    let piece = piece_of[x];
                    if piece != x {
                        self.nodes[x].incident.retain(|s| *s != sid);
                        self.nodes[piece].incident.push(sid);
                    }
                }
                self.separators[sid].incident_bags = [piece_of[a], piece_of[b]];
                safe_separators.push(sid);
            } else {
                self.nodes[piece_of[a]].separators.push(sid);
            }
        }
        let root = &mut self.nodes[Self::ROOT];
        root.nested = pieces;
        root.separators = safe_separators;
    }

    /// Builds the local graph of `id`: the subgraph induced by its vertices, with every
    /// incident separator completed to a clique.
    pub fn make_refinable(&mut self, id: BagId) {
        let node = &self.nodes[id];
        let inv = node.vertex_set.to_vec();
        let mut conv = vec![None; self.graph.n()];
        for (i, v) in inv.iter().enumerate() {
            conv[*v] = Some(i);
        }
        let mut graph = self.graph.inherit_edges(&conv, &inv);
        for sid in node.incident.iter() {
            let members: Vec<usize> = self.separators[*sid]
                .vertex_set
                .iter()
                .filter_map(|v| conv[v])
                .collect();
            for (i, u) in members.iter().enumerate() {
                for v in members.iter().skip(i + 1) {
                    graph.add_edge(*u, *v);
                }
            }
        }
        self.nodes[id].local = Some(LocalGraph { graph, inv });
    }

    /// Replaces the nested decomposition of `id` by `td`, given in the local numbering of
    /// [`Bag::make_refinable`].
    pub fn replace_nested(&mut self, id: BagId, td: &TreeDecomposition) {
        let inv = match &self.nodes[id].local {
            Some(local) => local.inv.clone(),
            None => self.nodes[id].vertex_set.to_vec(),
        };
        for old in std::mem::take(&mut self.nodes[id].nested) {
            self.nodes[old].detach();
        }
        self.nodes[id].separators.clear();

        let n = self.graph.n();
        let ids: Vec<BagId> = td
            .bags()
            .iter()
            .map(|bag| {
                let vertex_set = VertexSet::from_iter(n, bag.vertex_set.iter().map(|v| inv[*v]));
                self.add_nested_bag(id, vertex_set)
            })
            .collect();
        for (a, b) in td.edges() {
            let vertex_set = self.nodes[ids[a]]
                .vertex_set
                .intersection(&self.nodes[ids[b]].vertex_set);
            self.add_separator(id, vertex_set, ids[a], ids[b]);
        }
    }

    /// Some leaf below `id` that contains `vertex_set`.
    fn find_host(&self, id: BagId, vertex_set: &VertexSet) -> Option<BagId> {
        let node = &self.nodes[id];
        if !vertex_set.is_subset_of(&node.vertex_set) {
            return None;
        }
        if node.nested.is_empty() {
            return Some(id);
        }
        node.nested
            .iter()
            .find_map(|c| self.find_host(*c, vertex_set))
    }

    /// Leaf bags of the fully expanded decomposition, and its tree edges. Every nested tree
    /// edge is re-attached to leaves below its endpoints that contain its separator.
    fn expand(&self) -> Result<(Vec<BagId>, Vec<(BagId, BagId, SeparatorId)>), ValidationError> {
        let mut leaves = Vec::new();
        let mut edges = Vec::new();
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.nested.is_empty() {
                leaves.push(id);
                continue;
            }
            stack.extend(node.nested.iter().rev());
            for sid in node.separators.iter().copied() {
                let separator = &self.separators[sid];
                let unplaced = || ValidationError::UnplacedSeparator(separator.vertex_set.to_vec());
                let (a, b) = separator.incident_bags();
                let a = self
                    .find_host(a, &separator.vertex_set)
                    .ok_or_else(unplaced)?;
                let b = self
                    .find_host(b, &separator.vertex_set)
                    .ok_or_else(unplaced)?;
                edges.push((a, b, sid));
            }
        }
        Ok((leaves, edges))
    }

    /// Lifts every leaf of the nested structure to the root and merges away bags that are
    /// contained in a neighboring bag.
    pub fn flatten(&mut self) -> Result<(), ValidationError> {
        let (leaves, edges) = self.expand()?;
        if leaves == [Self::ROOT] {
            return Ok(());
        }
        let mut is_leaf = vec![false; self.nodes.len()];
        for leaf in leaves.iter().copied() {
            is_leaf[leaf] = true;
        }
        for id in 0..self.nodes.len() {
            if id != Self::ROOT && !is_leaf[id] {
                self.nodes[id].detach();
            }
        }
        for leaf in leaves.iter().copied() {
            self.nodes[leaf].parent = Some(Self::ROOT);
            self.nodes[leaf].incident.clear();
        }
        self.nodes[Self::ROOT].nested = leaves;
        self.nodes[Self::ROOT].separators.clear();
        for (a, b, sid) in edges {
            if a == b {
                continue;
            }
            let vertex_set = self.nodes[a]
                .vertex_set
                .intersection(&self.nodes[b].vertex_set);
            let safety = self.separators[sid].safety;
            let new_id = self.add_separator(Self::ROOT, vertex_set, a, b);
            self.separators[new_id].safety = safety;
        }
        self.merge_redundant();
        Ok(())
    }

    fn merge_redundant(&mut self) {
        let mut removed = vec![false; self.separators.len()];
        let mut worklist = self.nodes[Self::ROOT].separators.clone();
        while let Some(sid) = worklist.pop() {
            if removed[sid] {
                continue;
            }
            let (a, b) = self.separators[sid].incident_bags();
            let (small, big) = if self.nodes[a].vertex_set.is_subset_of(&self.nodes[b].vertex_set)
            {
                (a, b)
            } else if self.nodes[b].vertex_set.is_subset_of(&self.nodes[a].vertex_set) {
                (b, a)
            } else {
                continue;
            };
            removed[sid] = true;
            for other in std::mem::take(&mut self.nodes[small].incident) {
                if other == sid {
                    continue;
                }
                let neighbor = self.separators[other].other_side(small);
                self.separators[other].incident_bags = [neighbor, big];
                self.separators[other].vertex_set = self.nodes[neighbor]
                    .vertex_set
                    .intersection(&self.nodes[big].vertex_set);
                self.nodes[big].incident.push(other);
                worklist.push(other);
            }
            self.nodes[big].incident.retain(|s| *s != sid);
            self.nodes[small].detach();
        }
        let nested: Vec<BagId> = self.nodes[Self::ROOT]
            .nested
            .iter()
            .copied()
            .filter(|b| self.nodes[*b].parent == Some(Self::ROOT))
            .collect();
        let root = &mut self.nodes[Self::ROOT];
        root.nested = nested;
        root.separators.retain(|s| !removed[*s]);
    }

    /// Checks the fully expanded decomposition against the graph.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.to_tree_decomposition()?.verify(self.graph.as_ref())
    }

    /// Plain tree decomposition made of the leaves of the nested structure.
    pub fn to_tree_decomposition(&self) -> Result<TreeDecomposition, ValidationError> {
        let (leaves, edges) = self.expand()?;
        let mut td = TreeDecomposition::default();
        let mut position = vec![usize::MAX; self.nodes.len()];
        for leaf in leaves {
            position[leaf] = td.add_bag(self.nodes[leaf].vertex_set.iter().collect());
        }
        for (a, b, _) in edges {
            if a != b {
                td.add_edge(position[a], position[b]);
            }
        }
        Ok(td)
    }
}

#[cfg(test)]
mod tests {
    use crate::datastructures::VertexSet;
    use crate::graph::bag::Bag;
    use crate::graph::bit_graph::Graph;
    use crate::graph::separator::{SafeSeparatorLimits, Safety, SafetyProof};
    use crate::tree_decomposition::{TreeDecomposition, ValidationError};
    use fxhash::FxHashSet;
    use std::rc::Rc;

    fn set(n: usize, vertices: &[usize]) -> VertexSet {
        VertexSet::from_slice(n, vertices)
    }

    // two triangles 0 1 2 and 1 2 3 sharing the edge 1 2, then a pendant 3 - 4
    fn diamond_with_tail() -> Bag {
        let graph = Graph::from_edges(5, &[(0, 1), (0, 2), (1, 2), (1, 3), (2, 3), (3, 4)]);
        let mut bag = Bag::new(Rc::new(graph));
        let a = bag.add_nested_bag(Bag::ROOT, set(5, &[0, 1, 2]));
        let b = bag.add_nested_bag(Bag::ROOT, set(5, &[1, 2, 3]));
        let c = bag.add_nested_bag(Bag::ROOT, set(5, &[3, 4]));
        bag.add_separator(Bag::ROOT, set(5, &[1, 2]), a, b);
        bag.add_separator(Bag::ROOT, set(5, &[3]), b, c);
        bag
    }

    // cycle 0 1 2 3 4 5 triangulated by the chords 0 2, 0 3, 0 4
    fn fan() -> Bag {
        let graph = Graph::from_edges(
            6,
            &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (0, 2), (0, 3), (0, 4)],
        );
        let mut bag = Bag::new(Rc::new(graph));
        let a = bag.add_nested_bag(Bag::ROOT, set(6, &[0, 1, 2]));
        let b = bag.add_nested_bag(Bag::ROOT, set(6, &[0, 2, 3]));
        let c = bag.add_nested_bag(Bag::ROOT, set(6, &[0, 3, 4]));
        let d = bag.add_nested_bag(Bag::ROOT, set(6, &[0, 4, 5]));
        bag.add_separator(Bag::ROOT, set(6, &[0, 2]), a, b);
        bag.add_separator(Bag::ROOT, set(6, &[0, 3]), b, c);
        bag.add_separator(Bag::ROOT, set(6, &[0, 4]), c, d);
        bag
    }

    #[test]
    fn clique_separators_keep_bags_apart() {
        let mut bag = diamond_with_tail();
        assert_eq!(bag.validate(), Ok(()));
        bag.detect_safe_separators(&SafeSeparatorLimits::default());
        assert_eq!(bag.count_safe_separators(), 2);
        assert_eq!(
            bag.separator(0).safety(),
            Safety::Safe(SafetyProof::Clique)
        );

        bag.pack();
        assert_eq!(bag.nested_bags(Bag::ROOT), &[1, 2, 3]);
        assert_eq!(bag.separator_width(), 1);
        assert_eq!(bag.width(Bag::ROOT), 2);
        assert_eq!(bag.validate(), Ok(()));
    }

    #[test]
    fn contained_bags_do_not_separate() {
        // both outer bags lie inside the middle one, so no edge has vertices on both sides
        let graph = Graph::from_edges(3, &[(0, 1), (1, 2), (0, 2)]);
        let mut bag = Bag::new(Rc::new(graph));
        let a = bag.add_nested_bag(Bag::ROOT, set(3, &[1, 2]));
        let b = bag.add_nested_bag(Bag::ROOT, set(3, &[0, 1, 2]));
        let c = bag.add_nested_bag(Bag::ROOT, set(3, &[0, 1]));
        bag.add_separator(Bag::ROOT, set(3, &[1, 2]), a, b);
        bag.add_separator(Bag::ROOT, set(3, &[0, 1]), b, c);

        bag.detect_safe_separators(&SafeSeparatorLimits::default());
        assert_eq!(bag.separator(0).safety(), Safety::Unsafe);
        assert_eq!(bag.separator(1).safety(), Safety::Unsafe);
        bag.pack();
        assert_eq!(bag.nested_bags(Bag::ROOT).len(), 1);
        assert_eq!(bag.separator_width(), 0);
    }

    #[test]
    fn long_path_splits_at_every_edge() {
        let n = 3000;
        let edges: Vec<_> = (0..n - 1).map(|v| (v, v + 1)).collect();
        let mut bag = Bag::new(Rc::new(Graph::from_edges(n, &edges)));
        let bags: Vec<_> = (0..n - 1)
            .map(|v| bag.add_nested_bag(Bag::ROOT, set(n, &[v, v + 1])))
            .collect();
        for v in (1..n - 1).rev() {
            bag.add_separator(Bag::ROOT, set(n, &[v]), bags[v - 1], bags[v]);
        }

        bag.detect_safe_separators(&SafeSeparatorLimits::default());
        assert_eq!(bag.count_safe_separators(), n - 2);
        bag.pack();
        assert_eq!(bag.nested_bags(Bag::ROOT).len(), n - 1);
        assert_eq!(bag.separator_width(), 0);
        assert_eq!(bag.validate(), Ok(()));
    }

    #[test]
    fn unsafe_separators_are_packed() {
        let mut bag = fan();
        bag.detect_safe_separators(&SafeSeparatorLimits::cliques_only());
        // every chord is an edge, so all separators are cliques
        assert_eq!(bag.count_safe_separators(), 3);

        let sid = bag.separators_of(Bag::ROOT)[1];
        bag.separators[sid].safety = Safety::Unsafe;
        bag.pack();

        let pieces = bag.nested_bags(Bag::ROOT).to_vec();
        assert_eq!(pieces.len(), 3);
        let packed = pieces
            .iter()
            .copied()
            .find(|p| !bag.nested_bags(*p).is_empty())
            .unwrap();
        assert_eq!(bag.vertex_set(packed).to_vec(), vec![0, 2, 3, 4]);
        assert_eq!(bag.nested_bags(packed).len(), 2);
        assert_eq!(bag.separators_of(packed), &[sid]);
        assert_eq!(bag.incident_separators(packed).len(), 2);
        assert_eq!(bag.max_nested_bag_size(Bag::ROOT), 4);
        assert_eq!(bag.width(packed), 2);
        assert_eq!(bag.separator_width(), 1);
        assert_eq!(bag.validate(), Ok(()));
    }

    #[test]
    fn local_graph_completes_incident_separators() {
        let graph = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let mut bag = Bag::new(Rc::new(graph));
        let a = bag.add_nested_bag(Bag::ROOT, set(4, &[0, 1, 2]));
        let b = bag.add_nested_bag(Bag::ROOT, set(4, &[0, 2, 3]));
        bag.add_separator(Bag::ROOT, set(4, &[0, 2]), a, b);

        bag.make_refinable(a);
        assert!(bag.is_refinable(a));
        assert!(!bag.is_refinable(b));
        let local = bag.local_graph(a).unwrap();
        assert_eq!(local.inv, vec![0, 1, 2]);
        assert!(local.graph.are_adjacent(0, 2));
        assert_eq!(local.graph.edge_count(), 3);
    }

    #[test]
    fn replace_nested_and_flatten() {
        let mut bag = fan();
        let all: Vec<_> = bag.nested_bags(Bag::ROOT).to_vec();
        for sid in bag.separators_of(Bag::ROOT).to_vec() {
            bag.separators[sid].safety = Safety::Unsafe;
        }
        bag.pack();
        let piece = bag.nested_bags(Bag::ROOT)[0];
        assert_eq!(bag.nested_bags(piece), all.as_slice());

        bag.make_refinable(piece);
        // a worse but valid decomposition of the local graph, in local numbering
        let mut td = TreeDecomposition::default();
        let x = td.add_bag([0, 1, 2, 3].iter().copied().collect());
        let y = td.add_bag([0, 3, 4, 5].iter().copied().collect());
        td.add_edge(x, y);
        bag.replace_nested(piece, &td);
        assert_eq!(bag.width(Bag::ROOT), 3);
        assert_eq!(bag.validate(), Ok(()));
        for old in all {
            assert_eq!(bag.parent(old), None);
        }

        bag.flatten().unwrap();
        assert_eq!(bag.nested_bags(Bag::ROOT).len(), 2);
        let flat = bag.to_tree_decomposition().unwrap();
        assert_eq!(flat.bags().len(), 2);
        assert_eq!(flat.width(), 3);
        assert_eq!(flat.verify(bag.graph()), Ok(()));
    }

    #[test]
    fn flatten_merges_contained_bags() {
        let graph = Graph::from_edges(3, &[(0, 1), (1, 2), (0, 2)]);
        let mut bag = Bag::new(Rc::new(graph));
        let a = bag.add_nested_bag(Bag::ROOT, set(3, &[1, 2]));
        let b = bag.add_nested_bag(Bag::ROOT, set(3, &[0, 1, 2]));
        let c = bag.add_nested_bag(Bag::ROOT, set(3, &[0, 1]));
        bag.add_separator(Bag::ROOT, set(3, &[1, 2]), a, b);
        bag.add_separator(Bag::ROOT, set(3, &[0, 1]), b, c);

        bag.flatten().unwrap();
        assert_eq!(bag.nested_bags(Bag::ROOT), &[b]);
        assert!(bag.separators_of(Bag::ROOT).is_empty());
        let td = bag.to_tree_decomposition().unwrap();
        assert_eq!(td.bags().len(), 1);
        let expected: FxHashSet<usize> = (0..3).collect();
        assert_eq!(td.bags()[0].vertex_set, expected);
    }

    #[test]
    fn root_without_nested_bags() {
        let graph = Graph::from_edges(2, &[(0, 1)]);
        let mut bag = Bag::new(Rc::new(graph));
        assert_eq!(bag.width(Bag::ROOT), 1);
        bag.flatten().unwrap();
        let td = bag.to_tree_decomposition().unwrap();
        assert_eq!(td.bags().len(), 1);
        assert_eq!(td.width(), 1);
    }

    #[test]
    fn validate_reports_missing_edge() {
        let graph = Graph::from_edges(3, &[(0, 1), (1, 2), (0, 2)]);
        let mut bag = Bag::new(Rc::new(graph));
        let a = bag.add_nested_bag(Bag::ROOT, set(3, &[0, 1]));
        let b = bag.add_nested_bag(Bag::ROOT, set(3, &[1, 2]));
        bag.add_separator(Bag::ROOT, set(3, &[1]), a, b);
        assert_eq!(bag.validate(), Err(ValidationError::MissingEdge((0, 2))));
    }
}
