use crate::datastructures::VertexSet;
use crate::exact::{Bounds, BudgetTracker, ComputationResult, Exhausted, SearchBudget};
use crate::graph::Graph;
use crate::tree_decomposition::TreeDecomposition;
use fxhash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::fmt;
use std::fmt::{Debug, Formatter};

#[cfg(feature = "log")]
use log::debug;

/// Positive-instance driven search for a tree decomposition of a connected graph.
///
/// Target widths are tried from `lowerbound` upwards and the first width at which a
/// decomposition exists is returned, so the result is optimal whenever `lowerbound` is a
/// valid lower bound. Only widths below `upperbound` are searched.
pub struct Pid<'a> {
    graph: &'a Graph,
    lowerbound: usize,
    upperbound: usize,
    budget: SearchBudget,
}

impl<'a> Pid<'a> {
    pub fn with_bounds(graph: &'a Graph, lowerbound: usize, upperbound: usize) -> Self {
        Self {
            graph,
            lowerbound,
            upperbound,
            budget: SearchBudget::default(),
        }
    }

    impl_setter!(self, budget, SearchBudget);

    pub fn compute(self) -> ComputationResult {
        let n = self.graph.n();
        if n <= self.lowerbound + 1 && n <= self.upperbound {
            let mut td = TreeDecomposition::default();
            if n > 0 {
                td.add_bag((0..n).collect());
            }
            return ComputationResult::ComputedTreeDecomposition(td);
        }
        if self.lowerbound >= self.upperbound {
            return ComputationResult::Bounds(Bounds {
                lowerbound: self.lowerbound,
                upperbound: self.upperbound,
            });
        }
        debug_assert!(self.graph.is_connected());

        let mut search = Search::new(self.graph, self.budget.tracker());
        let mut target_width = self.lowerbound;
        while target_width < self.upperbound {
            match search.run(target_width) {
                Ok(Some(pmc)) => {
                    #[cfg(feature = "log")]
                    debug!(
                        "width {} after {} steps, {} i-blocks",
                        target_width,
                        search.budget.steps(),
                        search.i_blocks.len()
                    );
                    return ComputationResult::ComputedTreeDecomposition(
                        search.tree_decomposition(pmc),
                    );
                }
                Ok(None) => target_width += 1,
                Err(Exhausted) => {
                    #[cfg(feature = "log")]
                    debug!(
                        "budget exhausted at width {} after {} steps",
                        target_width,
                        search.budget.steps()
                    );
                    return ComputationResult::Bounds(Bounds {
                        lowerbound: target_width,
                        upperbound: self.upperbound,
                    });
                }
            }
        }
        ComputationResult::Bounds(Bounds {
            lowerbound: self.upperbound,
            upperbound: self.upperbound,
        })
    }
}

/// A component together with its neighborhood. `outbound` is the full component of
/// `separator` with the smallest vertex, if `separator` has a full component besides
/// `component`.
#[derive(Clone, PartialEq, Eq)]
struct Block {
    component: VertexSet,
    separator: VertexSet,
    outbound: Option<VertexSet>,
}

impl Debug for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let t = if self.is_outbound() { "o" } else { "i" };
        write!(f, "{}{:?}({:?})", t, self.component, self.separator)
    }
}

impl Block {
    fn new(component: VertexSet, graph: &Graph) -> Self {
        let separator = graph.exterior_border(&component);
        let mut rest = graph.all();
        rest.difference_with(&component);
        rest.difference_with(&separator);

        let min_component = component.first().unwrap_or(usize::MAX);
        let mut outbound = None;
        let mut next = rest.first();
        while let Some(v) = next {
            let c = graph.component_containing(v, &separator);
            if graph.exterior_border(&c).cardinality() == separator.cardinality() {
                outbound = Some(if v < min_component {
                    c
                } else {
                    component.clone()
                });
                break;
            }
            rest.difference_with(&c);
            next = rest.next_from(v + 1);
        }
        Self {
            component,
            separator,
            outbound,
        }
    }

    fn is_outbound(&self) -> bool {
        self.outbound.as_ref() == Some(&self.component)
    }

    fn of_minimal_separator(&self) -> bool {
        self.outbound.is_some()
    }
}

/// Potential maximal clique together with the blocks it hangs off.
#[derive(Clone, Debug)]
struct Pmc {
    vertex_set: VertexSet,
    inbounds: Vec<Block>,
    outbound: Option<Block>,
}

impl Pmc {
    fn new(vertex_set: VertexSet, blocks: Vec<Block>, graph: &Graph) -> Option<Self> {
        if vertex_set.is_empty()
            || blocks
                .iter()
                .any(|b| b.separator.cardinality() == vertex_set.cardinality())
        {
            return None;
        }
        let mut outbound: Option<&Block> = None;
        for block in blocks.iter().filter(|b| b.is_outbound()) {
            if outbound.map_or(true, |o| o.separator.is_subset_of(&block.separator)) {
                outbound = Some(block);
            }
        }
        let outbound = outbound.cloned();
        let inbounds: Vec<Block> = match &outbound {
            None => blocks,
            Some(o) => blocks
                .into_iter()
                .filter(|b| !b.separator.is_subset_of(&o.separator))
                .collect(),
        };
        if inbounds.iter().any(|b| !b.of_minimal_separator()) {
            return None;
        }

        // every missing edge of the clique must be covered by a separator
        for v in vertex_set.iter() {
            let mut rest = vertex_set.difference(graph.neighborhood_set(v));
            rest.remove(v);
            if let Some(o) = outbound.as_ref().filter(|o| o.separator.contains(v)) {
                rest.difference_with(&o.separator);
            }
            for b in inbounds.iter().filter(|b| b.separator.contains(v)) {
                rest.difference_with(&b.separator);
            }
            if !rest.is_empty() {
                return None;
            }
        }
        Some(Self {
            vertex_set,
            inbounds,
            outbound,
        })
    }
}

/// Feasible inbound block and the clique that made it feasible.
#[derive(Clone, Debug)]
struct IBlock {
    block: Block,
    endorser: Pmc,
}

/// Union of the separators of compatible i-blocks, still open towards `open_component`.
#[derive(Clone, Debug)]
struct OBlock {
    separator: VertexSet,
    open_component: VertexSet,
}

struct Search<'a> {
    graph: &'a Graph,
    budget: BudgetTracker,
    target_width: usize,
    block_cache: FxHashMap<VertexSet, Block>,
    i_blocks: FxHashMap<VertexSet, IBlock>,
    i_block_order: Vec<VertexSet>,
    o_blocks: Vec<OBlock>,
    o_block_separators: FxHashSet<VertexSet>,
    seen_pmcs: FxHashSet<VertexSet>,
    pending_endorsers: Vec<Pmc>,
    ready_queue: VecDeque<IBlock>,
    solution: Option<Pmc>,
}

impl<'a> Search<'a> {
    fn new(graph: &'a Graph, budget: BudgetTracker) -> Self {
        Self {
            graph,
            budget,
            target_width: 0,
            block_cache: FxHashMap::default(),
            i_blocks: FxHashMap::default(),
            i_block_order: Vec::new(),
            o_blocks: Vec::new(),
            o_block_separators: FxHashSet::default(),
            seen_pmcs: FxHashSet::default(),
            pending_endorsers: Vec::new(),
            ready_queue: VecDeque::new(),
            solution: None,
        }
    }

    /// Looks for a decomposition of width `target_width`. Feasible blocks found for smaller
    /// widths are kept.
    fn run(&mut self, target_width: usize) -> Result<Option<Pmc>, Exhausted> {
        self.target_width = target_width;
        self.o_blocks.clear();
        self.o_block_separators.clear();
        self.ready_queue = self
            .i_block_order
            .iter()
            .map(|c| self.i_blocks[c].clone())
            .collect();

        for v in 0..self.graph.n() {
            let closed_neighborhood = self.graph.closed_neighborhood(v);
            if closed_neighborhood.cardinality() <= target_width + 1 {
                self.try_pmc(closed_neighborhood)?;
                if let Some(solution) = self.solution.take() {
                    return Ok(Some(solution));
                }
            }
        }

        loop {
            while let Some(i_block) = self.ready_queue.pop_front() {
                self.budget.tick()?;
                self.process_i_block(&i_block)?;
                if let Some(solution) = self.solution.take() {
                    return Ok(Some(solution));
                }
            }

            for pmc in std::mem::take(&mut self.pending_endorsers) {
                if self.is_ready(&pmc) {
                    self.endorse(pmc);
                } else {
                    self.pending_endorsers.push(pmc);
                }
                if let Some(solution) = self.solution.take() {
                    return Ok(Some(solution));
                }
            }
            if self.ready_queue.is_empty() {
                return Ok(None);
            }
        }
    }

    fn block(&mut self, component: &VertexSet) -> Block {
        if let Some(block) = self.block_cache.get(component) {
            return block.clone();
        }
        let block = Block::new(component.clone(), self.graph);
        self.block_cache.insert(component.clone(), block.clone());
        block
    }

    fn separate_into_blocks(&mut self, separator: &VertexSet) -> Vec<Block> {
        self.graph
            .components(separator)
            .iter()
            .map(|c| self.block(c))
            .collect()
    }

    fn try_pmc(&mut self, vertex_set: VertexSet) -> Result<(), Exhausted> {
        let blocks = self.separate_into_blocks(&vertex_set);
        self.try_pmc_with_blocks(vertex_set, blocks)
    }

    fn try_pmc_with_blocks(
        &mut self,
        vertex_set: VertexSet,
        blocks: Vec<Block>,
    ) -> Result<(), Exhausted> {
        if !self.seen_pmcs.insert(vertex_set.clone()) {
            return Ok(());
        }
        self.budget.tick()?;
        if let Some(pmc) = Pmc::new(vertex_set, blocks, self.graph) {
            if self.is_ready(&pmc) {
                self.endorse(pmc);
            } else {
                self.pending_endorsers.push(pmc);
            }
        }
        Ok(())
    }

    fn is_ready(&self, pmc: &Pmc) -> bool {
        pmc.inbounds
            .iter()
            .all(|b| self.i_blocks.contains_key(&b.component))
    }

    fn endorse(&mut self, pmc: Pmc) {
        let outbound = match &pmc.outbound {
            None => {
                self.solution = Some(pmc);
                return;
            }
            Some(outbound) => outbound,
        };
        let mut target = pmc.vertex_set.difference(&outbound.separator);
        for b in pmc.inbounds.iter() {
            target.union_with(&b.component);
        }
        if self.i_blocks.contains_key(&target) {
            return;
        }
        let block = self.block(&target);
        let i_block = IBlock {
            block,
            endorser: pmc,
        };
        self.i_blocks.insert(target.clone(), i_block.clone());
        self.i_block_order.push(target);
        self.ready_queue.push_back(i_block);
    }

    fn process_i_block(&mut self, i_block: &IBlock) -> Result<(), Exhausted> {
        let block = &i_block.block;
        let open_component = match &block.outbound {
            Some(outbound) => outbound.clone(),
            None => return Ok(()),
        };
        if !self.o_block_separators.contains(&block.separator) {
            let o_block = OBlock {
                separator: block.separator.clone(),
                open_component,
            };
            self.add_o_block(o_block.clone());
            self.process_o_block(&o_block)?;
        }

        let max_size = self.target_width + 1;
        let compatible: Vec<OBlock> = self
            .o_blocks
            .iter()
            .filter(|o| {
                block.component.is_subset_of(&o.open_component)
                    && o.separator.union_cardinality(&block.separator) <= max_size
            })
            .cloned()
            .collect();
        for o_block in compatible {
            self.combine(&o_block, i_block)?;
        }
        Ok(())
    }

    fn add_o_block(&mut self, o_block: OBlock) {
        self.o_block_separators.insert(o_block.separator.clone());
        self.o_blocks.push(o_block);
    }

    /// Grows the separator of `o_block` by the open neighbors of one of its vertices.
    fn process_o_block(&mut self, o_block: &OBlock) -> Result<(), Exhausted> {
        for v in o_block.separator.iter() {
            let mut candidate = o_block.separator.clone();
            candidate.union_with(
                &self
                    .graph
                    .neighborhood_set(v)
                    .intersection(&o_block.open_component),
            );
            if candidate.cardinality() <= self.target_width + 1 {
                self.try_pmc(candidate)?;
            }
        }
        Ok(())
    }

    fn combine(&mut self, o_block: &OBlock, i_block: &IBlock) -> Result<(), Exhausted> {
        let separator = o_block.separator.union(&i_block.block.separator);
        if separator.cardinality() > self.target_width + 1 {
            return Ok(());
        }
        let blocks = self.separate_into_blocks(&separator);
        let mut full_component = None;
        for block in blocks.iter() {
            if block.separator.cardinality() == separator.cardinality() {
                if full_component.is_some() {
                    return Ok(());
                }
                full_component = Some(block.component.clone());
            }
        }

        match full_component {
            None => self.try_pmc_with_blocks(separator, blocks),
            Some(open_component) => {
                if separator.cardinality() > self.target_width
                    || self.o_block_separators.contains(&separator)
                {
                    return Ok(());
                }
                let o_block = OBlock {
                    separator,
                    open_component,
                };
                self.add_o_block(o_block.clone());
                self.process_o_block(&o_block)
            }
        }
    }

    fn tree_decomposition(&self, root: Pmc) -> TreeDecomposition {
        let mut td = TreeDecomposition::default();
        let root_id = td.add_bag(root.vertex_set.iter().collect());
        let mut stack = vec![(root_id, root)];
        while let Some((parent, pmc)) = stack.pop() {
            for inbound in pmc.inbounds.iter() {
                if let Some(i_block) = self.i_blocks.get(&inbound.component) {
                    let child = td.add_bag(i_block.endorser.vertex_set.iter().collect());
                    td.add_edge(parent, child);
                    stack.push((child, i_block.endorser.clone()));
                }
            }
        }
        td
    }
}
