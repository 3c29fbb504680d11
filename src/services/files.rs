// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Local file half of the dual sink.
//!
//! Artifacts are pretty-printed JSON files in one flat output directory,
//! named by the unit that produced them.

use crate::error::{HarvestError, Result, SinkTarget};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Writes JSON artifacts into the output directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    output_dir: PathBuf,
}

impl FileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                HarvestError::Storage(
                    SinkTarget::File,
                    format!("{}: {}", self.output_dir.display(), e),
                )
            })
    }

    /// Write one artifact, replacing any previous file of the same name.
    pub async fn write(&self, file_name: &str, payload: &Value) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        let json = serde_json::to_string_pretty(payload)
            .map_err(|e| HarvestError::Storage(SinkTarget::File, format!("serialize: {}", e)))?;

        tokio::fs::write(&path, json).await.map_err(|e| {
            HarvestError::Storage(SinkTarget::File, format!("{}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "Wrote artifact");
        Ok(path)
    }
}
