// Analysis core: instruction model, normalization, call reconstruction,
// graph construction and ordering.

pub mod callgraph;
pub mod class_usage;
pub mod error;
pub mod graph_view;
pub mod index;
pub mod instruction;
pub mod normalize;
pub mod program;
pub mod reconstruct;
pub mod toposort;
