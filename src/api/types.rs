//! Shared state for the HTTP boundary.

use std::sync::Arc;

use crate::engine::EngineState;
use crate::trigger::AlertTrigger;

/// Shared context for all routes: the immutable engine handles plus the
/// alert-trigger collaborator. Cloning is cheap; everything inside is `Arc`.
#[derive(Clone)]
pub struct ApiContext {
    pub engine: Arc<EngineState>,
    pub trigger: Arc<dyn AlertTrigger>,
}

impl ApiContext {
    pub fn new(engine: Arc<EngineState>, trigger: Arc<dyn AlertTrigger>) -> Self {
        Self { engine, trigger }
    }
}
