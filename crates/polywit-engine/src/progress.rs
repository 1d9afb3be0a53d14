//! Stage progress reporting.

use tracing::{error, info};

use crate::error::Stage;

/// Notified as each stage starts and finishes.
pub trait ProgressObserver {
    fn start(&mut self, stage: Stage);
    fn succeed(&mut self, stage: Stage);
    fn fail(&mut self, stage: Stage);
}

/// Reports stages through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn start(&mut self, stage: Stage) {
        info!(stage = %stage, "{}", stage.progress_message());
    }

    fn succeed(&mut self, stage: Stage) {
        info!(stage = %stage, "done");
    }

    fn fail(&mut self, stage: Stage) {
        error!(stage = %stage, "failed");
    }
}
