//! Structured stage logging.
//!
//! Each stage owns a [`StageLogger`] created with it, so stage instances in
//! tests never share logger state. Everything goes through `tracing`; the
//! binary decides where events end up.

use tracing::{error, info, warn, Span};

use autocut_models::{BaseId, StageKind};

/// Logger scoped to one stage instance.
#[derive(Debug, Clone)]
pub struct StageLogger {
    stage: StageKind,
}

impl StageLogger {
    pub fn new(stage: StageKind) -> Self {
        Self { stage }
    }

    pub fn stage(&self) -> StageKind {
        self.stage
    }

    pub fn log_start(&self, id: &BaseId) {
        info!(
            stage = %self.stage,
            base_id = %id,
            "Stage started"
        );
    }

    pub fn log_progress(&self, id: &BaseId, message: &str) {
        info!(
            stage = %self.stage,
            base_id = %id,
            "{}", message
        );
    }

    pub fn log_warning(&self, id: &BaseId, message: &str) {
        warn!(
            stage = %self.stage,
            base_id = %id,
            "{}", message
        );
    }

    pub fn log_failure(&self, id: &BaseId, kind: &str, message: &str) {
        error!(
            stage = %self.stage,
            base_id = %id,
            error_kind = kind,
            "Processing {}: {}", id, message
        );
    }

    pub fn log_completion(&self, id: &BaseId) {
        info!(
            stage = %self.stage,
            base_id = %id,
            "Successfully processed {}", id
        );
    }

    /// Span covering one item of this stage.
    pub fn item_span(&self, id: &BaseId) -> Span {
        tracing::info_span!(
            "stage_item",
            stage = %self.stage,
            step = self.stage.step(),
            base_id = %id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_keeps_stage() {
        let logger = StageLogger::new(StageKind::Cut);
        assert_eq!(logger.stage(), StageKind::Cut);

        let id = BaseId::new("talk").unwrap();
        let _span = logger.item_span(&id).entered();
        logger.log_progress(&id, "cutting");
    }
}
