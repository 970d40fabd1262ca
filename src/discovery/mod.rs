//! Discovery of candidate typosquats by running external permutation generators.

pub mod invoker;
pub mod tool;

pub use invoker::{InvocationStats, Invoker};
pub use tool::{PermutationTool, ToolKind};
