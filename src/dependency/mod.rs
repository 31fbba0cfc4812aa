pub mod graph;
pub mod resolver;
