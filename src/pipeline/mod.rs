pub mod encoding;
pub mod inference;
pub mod orchestrator;
pub mod retrieval;
pub mod training; // offline: load → clean → encode → split → fit → evaluate → persist

pub use orchestrator::{DecisionError, DecisionOrchestrator, OrchestratorConfig};
