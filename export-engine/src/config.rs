// Copyright (c) James Kassemi, SC, US. All rights reserved.
use tokio_util::sync::CancellationToken;

use crate::{
    errors::{ExportError, Result},
    range::BlockWindow,
};

/// Run configuration supplied by the caller once per engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Prefix for log lines, e.g. `[exporter]`.
    pub label: String,
    pub window: BlockWindow,
    pub cancel: CancellationToken,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            label: "export".to_string(),
            window: BlockWindow::unbounded(),
            cancel: CancellationToken::new(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.window.start, self.window.end) {
            if start > end {
                return Err(ExportError::InvalidBlockWindow { start, end });
            }
        }
        Ok(())
    }
}
