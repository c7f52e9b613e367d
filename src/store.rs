// Copyright 2025 the Airstroke Authors
// SPDX-License-Identifier: Apache-2.0

//! Stroke persistence.
//!
//! Saves and loads collections of strokes as JSON over the same
//! transfer shapes the transport uses, so a file written here can be
//! replayed into any canvas with `add_strokes`. The engine itself
//! never calls these — import/export is driven by the embedding app.

use crate::rpc::StrokeData;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Write `strokes` as JSON under `dir/name.json`, creating the
/// directory if needed. Returns the full path written.
pub fn write_strokes(dir: &Path, name: &str, strokes: &[StrokeData]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create stroke directory {}", dir.display()))?;

    let path = dir.join(format!("{name}.json"));
    let json = serde_json::to_string_pretty(strokes).context("failed to encode strokes")?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write strokes to {}", path.display()))?;

    tracing::info!(path = %path.display(), count = strokes.len(), "saved strokes");
    Ok(path)
}

/// Read a stroke collection previously written by [`write_strokes`].
pub fn read_strokes(path: &Path) -> Result<Vec<StrokeData>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read strokes from {}", path.display()))?;
    let strokes: Vec<StrokeData> =
        serde_json::from_str(&json).context("failed to decode strokes")?;

    tracing::info!(path = %path.display(), count = strokes.len(), "loaded strokes");
    Ok(strokes)
}
