//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules, leaves first (§2 of the design doc):
//! - `rng`: re-entrant Marsaglia UNI pseudo-random number generator.
//! - `arena`: contiguous per-tree allocation of branches and statesets.
//! - `builder`: random topology construction and leaf canonicalisation.
//! - `mutate`: NNI and SPR topology rearrangement operators.
//! - `reroot`: O(depth) rerooting along an arbitrary leaf.
//! - `compare`: bipartition-signature based topological equality.
//! - `print`: canonical unrooted Newick text output.
//! - `matrix`: the character-matrix reader (Clustal/MSF/PHYLIP/FASTA/NEXUS).
//! - `error`: error types for the one recoverable layer (the matrix reader).
//! - `numeric`: checked floating-point wrappers.
//!
//! Public API kept stable by re-exporting the most commonly used types.

pub mod arena;
pub mod builder;
pub mod compare;
pub mod error;
pub mod matrix;
pub mod mutate;
pub mod numeric;
pub mod print;
pub mod reroot;
pub mod rng;

pub use arena::{TreeArena, UNSET};
pub use builder::random_tree;
pub use compare::TreeCompare;
pub use error::MatrixError;
pub use matrix::{read_matrix, Matrix};
pub use print::Printer;
pub use rng::Rng;
