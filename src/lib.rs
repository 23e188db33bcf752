macro_rules! impl_setter {
    ($self:ident, $field:ident, $type:ty) => {
        pub fn $field(mut $self, $field: $type) -> Self {
            $self.$field = $field;
            $self
        }
    };
}

pub(crate) mod datastructures;
pub use datastructures::{VertexSet, VertexSetIterator};

pub mod exact;
pub mod graph;
pub mod heuristic_elimination_order;
pub mod io;
pub mod lowerbound;
pub mod solver;
pub mod tree_decomposition;

#[cfg(feature = "pace-logging")]
pub mod log;
#[cfg(feature = "handle-ctrlc")]
pub mod signals;

pub use solver::{decompose, decompose_connected, Decomposer, DecompositionError};
pub use tree_decomposition::{TreeDecomposition, ValidationError};
