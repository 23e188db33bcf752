pub use bag::{Bag, BagId, LocalGraph, SeparatorId};
pub use base_graph::BaseGraph;
pub use bit_graph::Graph;
pub use hash_map_graph::HashMapGraph;
pub use mutable_graph::MutableGraph;
pub use separator::{
    classify_separating_set, figure_out_safety, SafeSeparatorLimits, Safety, SafetyProof,
    Separator,
};

pub mod bag;
pub mod base_graph;
pub mod bit_graph;
pub mod hash_map_graph;
pub mod mutable_graph;
pub mod separator;
