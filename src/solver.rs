use crate::datastructures::VertexSet;
use crate::exact::{IoDecomposer, Refinement, SearchBudget};
use crate::graph::{Bag, BagId, Graph, HashMapGraph, SafeSeparatorLimits, Safety, SafetyProof};
use crate::heuristic_elimination_order::{GreedyDecomposer, Mode};
use crate::lowerbound::{LowerboundHeuristic, MinorMinWidth};
use crate::tree_decomposition::{TreeDecomposition, ValidationError};
use std::cmp::{max, Reverse};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

#[cfg(feature = "log")]
use log::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecompositionError {
    /// An intermediate or final decomposition broke one of the tree decomposition
    /// properties. This is always a bug in the engine.
    InvariantViolation(ValidationError),
}

impl Display for DecompositionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DecompositionError::InvariantViolation(e) => write!(f, "Invariant Violation: {}", e),
        }
    }
}

impl std::error::Error for DecompositionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecompositionError::InvariantViolation(e) => Some(e),
        }
    }
}

impl From<ValidationError> for DecompositionError {
    fn from(e: ValidationError) -> Self {
        DecompositionError::InvariantViolation(e)
    }
}

/// What one greedy mode produced for a component, before refinement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeStatistics {
    pub mode: Mode,
    pub heuristic_bags: usize,
    pub heuristic_width: usize,
    pub safe_separators: usize,
    pub clique_separators: usize,
    pub packed_bags: usize,
    pub separator_width: usize,
    pub max_packed_bag_size: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentStatistics {
    pub order: usize,
    pub modes: Vec<ModeStatistics>,
    pub chosen_mode: Option<Mode>,
    pub refined_bags: usize,
    pub improved_bags: usize,
    pub exhausted_searches: usize,
    pub width: isize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecompositionStatistics {
    pub components: Vec<ComponentStatistics>,
    pub width: isize,
}

impl DecompositionStatistics {
    pub fn refined_bags(&self) -> usize {
        self.components.iter().map(|c| c.refined_bags).sum()
    }

    pub fn improved_bags(&self) -> usize {
        self.components.iter().map(|c| c.improved_bags).sum()
    }

    pub fn exhausted_searches(&self) -> usize {
        self.components.iter().map(|c| c.exhausted_searches).sum()
    }
}

/// Configuration of the decomposition pipeline.
///
/// Every connected component is decomposed greedily once per mode. Each candidate has its
/// safe separators detected and its remaining bags packed, the best candidate is kept and
/// its packed bags are refined exactly where that can still lower the width.
#[derive(Clone, Debug)]
pub struct Decomposer {
    verbose: bool,
    modes: Vec<Mode>,
    safe_separator_limits: SafeSeparatorLimits,
    budget: SearchBudget,
    refine: bool,
}

impl Default for Decomposer {
    fn default() -> Self {
        Self {
            verbose: false,
            modes: Mode::all(),
            safe_separator_limits: SafeSeparatorLimits::default(),
            budget: SearchBudget::default(),
            refine: true,
        }
    }
}

impl Decomposer {
    /// Greedy decompositions and safe separators only.
    pub fn heuristic() -> Self {
        Self::default().refine(false)
    }

    impl_setter!(self, verbose, bool);
    impl_setter!(self, modes, Vec<Mode>);
    impl_setter!(self, safe_separator_limits, SafeSeparatorLimits);
    impl_setter!(self, budget, SearchBudget);
    impl_setter!(self, refine, bool);

    pub fn decompose(&self, graph: &Graph) -> Result<TreeDecomposition, DecompositionError> {
        self.decompose_with_statistics(graph).map(|(td, _)| td)
    }

    pub fn decompose_with_statistics(
        &self,
        graph: &Graph,
    ) -> Result<(TreeDecomposition, DecompositionStatistics), DecompositionError> {
        let mut statistics = DecompositionStatistics::default();
        if graph.n() == 0 {
            statistics.width = -1;
            return Ok((TreeDecomposition::default(), statistics));
        }

        let components = graph.components(&VertexSet::new(graph.n()));
        #[cfg(feature = "log")]
        if self.verbose {
            info!(
                "graph with {} vertices, {} edges and {} components",
                graph.n(),
                graph.edge_count(),
                components.len()
            );
        }

        let td = if components.len() == 1 {
            let (td, component_statistics) = self.decompose_component(graph)?;
            statistics.components.push(component_statistics);
            td
        } else {
            let mut td = TreeDecomposition::default();
            for component in components.iter() {
                let (sub_graph, inv) = graph.induced(component);
                let (sub_td, component_statistics) = self.decompose_component(&sub_graph)?;
                statistics.components.push(component_statistics);
                td.combine_with(sub_td, &inv, None);
            }
            td.verify(graph)?;
            td
        };
        statistics.width = td.width();

        #[cfg(feature = "log")]
        if self.verbose {
            info!(
                "width {} with {} bags, {} bags refined, {} improved, {} searches exhausted",
                statistics.width,
                td.bags().len(),
                statistics.refined_bags(),
                statistics.improved_bags(),
                statistics.exhausted_searches()
            );
        }
        Ok((td, statistics))
    }

    /// Decomposes a graph that is expected to be connected.
    pub fn decompose_connected(
        &self,
        graph: &Graph,
    ) -> Result<TreeDecomposition, DecompositionError> {
        self.decompose_component(graph).map(|(td, _)| td)
    }

    fn decompose_component(
        &self,
        graph: &Graph,
    ) -> Result<(TreeDecomposition, ComponentStatistics), DecompositionError> {
        let n = graph.n();
        let mut statistics = ComponentStatistics {
            order: n,
            ..Default::default()
        };
        if n <= 2 {
            let td = if n == 0 {
                TreeDecomposition::default()
            } else {
                TreeDecomposition::with_root((0..n).collect())
            };
            statistics.width = td.width();
            return Ok((td, statistics));
        }

        let shared = Rc::new(graph.clone());
        let modes = if self.modes.is_empty() {
            Mode::all()
        } else {
            self.modes.clone()
        };
        let mut best: Option<(Bag, ModeStatistics)> = None;
        for mode in modes {
            let (bag, mode_statistics) = self.candidate(Rc::clone(&shared), mode)?;
            statistics.modes.push(mode_statistics);
            if best
                .as_ref()
                .map_or(true, |(_, best)| improves_on(&mode_statistics, best))
            {
                best = Some((bag, mode_statistics));
            }
        }
        let (mut bag, mode) = match best {
            Some((bag, best)) => (bag, best.mode),
            None => return Ok((TreeDecomposition::with_root((0..n).collect()), statistics)),
        };
        statistics.chosen_mode = Some(mode);

        if self.refine {
            self.refine_bags(&mut bag, &mut statistics);
            bag.validate()?;
        }

        bag.flatten()?;
        let td = bag.to_tree_decomposition()?;
        td.verify(graph)?;
        statistics.width = td.width();

        #[cfg(feature = "log")]
        if self.verbose {
            info!(
                "component with {} vertices: mode {}, width {}, {} of {} refinements improved",
                n, mode, statistics.width, statistics.improved_bags, statistics.refined_bags
            );
        }
        Ok((td, statistics))
    }

    fn candidate(
        &self,
        graph: Rc<Graph>,
        mode: Mode,
    ) -> Result<(Bag, ModeStatistics), DecompositionError> {
        let mut bag = Bag::new(graph);
        GreedyDecomposer::new(&mut bag, mode).decompose();
        let heuristic_bags = bag.nested_bags(Bag::ROOT).len();
        let heuristic_width = bag.width(Bag::ROOT);

        bag.detect_safe_separators(&self.safe_separator_limits);
        bag.validate()?;
        let safeties: Vec<Safety> = bag
            .separators_of(Bag::ROOT)
            .iter()
            .map(|s| bag.separator(*s).safety())
            .collect();
        bag.pack();
        bag.validate()?;

        let statistics = ModeStatistics {
            mode,
            heuristic_bags,
            heuristic_width,
            safe_separators: safeties.iter().filter(|s| s.is_safe()).count(),
            clique_separators: safeties
                .iter()
                .filter(|s| **s == Safety::Safe(SafetyProof::Clique))
                .count(),
            packed_bags: bag.nested_bags(Bag::ROOT).len(),
            separator_width: bag.separator_width(),
            max_packed_bag_size: bag.max_nested_bag_size(Bag::ROOT),
        };
        #[cfg(feature = "log")]
        if self.verbose {
            info!(
                "{}: {} bags of width {}, {} safe separators ({} cliques), {} packed bags, \
                 separator width {}, largest packed bag {}",
                mode,
                statistics.heuristic_bags,
                statistics.heuristic_width,
                statistics.safe_separators,
                statistics.clique_separators,
                statistics.packed_bags,
                statistics.separator_width,
                statistics.max_packed_bag_size
            );
        }
        Ok((bag, statistics))
    }

    /// Runs the exact search on every packed bag that is wider than the best known lower
    /// bound, widest bags first. Every search result raises that lower bound.
    fn refine_bags(&self, bag: &mut Bag, statistics: &mut ComponentStatistics) {
        let mut lowest_possible = max(bag.graph().min_degree(), bag.separator_width());
        let mut pieces: Vec<BagId> = bag.nested_bags(Bag::ROOT).to_vec();
        pieces.sort_by_key(|id| (Reverse(bag.width(*id)), *id));

        for piece in pieces {
            let width = bag.width(piece);
            if width <= lowest_possible {
                continue;
            }
            bag.make_refinable(piece);
            let minor_min_width = bag
                .local_graph(piece)
                .map(|local| MinorMinWidth::compute(&HashMapGraph::from_graph(&local.graph)))
                .unwrap_or(0);
            let lowerbound = max(lowest_possible, minor_min_width);

            let refinement = IoDecomposer::new(bag, piece, lowerbound, width)
                .budget(self.budget)
                .decompose();
            statistics.refined_bags += 1;
            match refinement {
                Refinement::Improved(_) => statistics.improved_bags += 1,
                Refinement::Exhausted { .. } => statistics.exhausted_searches += 1,
                Refinement::NotImproved { .. } => {}
            }
            lowest_possible = max(lowest_possible, refinement.lowerbound());
        }
    }
}

/// Whether `candidate` replaces `best`: its largest packed bag, the largest subproblem left
/// for the exact search, must be strictly smaller. Earlier modes win ties.
fn improves_on(candidate: &ModeStatistics, best: &ModeStatistics) -> bool {
    candidate.max_packed_bag_size < best.max_packed_bag_size
}

/// [`Decomposer::decompose`] with the default configuration.
pub fn decompose(graph: &Graph) -> Result<TreeDecomposition, DecompositionError> {
    Decomposer::default().decompose(graph)
}

/// [`Decomposer::decompose_connected`] with the default configuration.
pub fn decompose_connected(graph: &Graph) -> Result<TreeDecomposition, DecompositionError> {
    Decomposer::default().decompose_connected(graph)
}
