pub mod email;
pub mod graph;
pub mod llm;
pub mod payments;
