// Copyright 2025 the Airstroke Authors
// SPDX-License-Identifier: Apache-2.0

//! Engine tuning constants and the optional TOML override file.
//!
//! The constants below are the defaults every embedding frontend starts
//! from. A frontend that ships its own tuning (different tracking
//! hardware, different world scale) loads a `Tuning` from a TOML file
//! and hands it to `PaintingCanvas`.

use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// CURVE FITTING
// ============================================================================
/// Maximum squared deviation (world units²) between raw samples and the
/// fitted curve before a segment is split
const FIT_MAX_SQUARED_ERROR: f32 = 1e-5;

/// Sampling resolution per segment when flattening fitted curves back
/// into a polyline for tube meshing
const RESAMPLE_RESOLUTION: usize = 16;

// ============================================================================
// INPUT SAMPLING
// ============================================================================
/// A hand-tracking jump larger than this (world units) between two
/// consecutive samples aborts the in-progress stroke
const JITTER_ABORT_DISTANCE: f32 = 0.1;

/// Samples closer together than this are collapsed into one
const MIN_POINT_SPACING: f32 = 1e-9;

/// Strokes with fewer raw samples than this are discarded on finish
const MIN_STROKE_POINTS: usize = 4;

// ============================================================================
// SPATIAL GRID
// ============================================================================
/// Edge length (world units) of one spatial-grid cell
const GRID_CELL_SIZE: f32 = 0.1;

// ============================================================================
// HISTORY
// ============================================================================
/// Maximum number of actions kept in the undo/redo log
const HISTORY_MAX_SIZE: usize = 100;

// ============================================================================
// RPC RETRY
// ============================================================================
/// Seconds before an unacknowledged request is retried
const RETRY_TIMEOUT_SECS: f32 = 5.0;

/// Retries before an unacknowledged request is dropped
const RETRY_MAX_COUNT: u32 = 3;

/// Errors loading a tuning file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime tuning for the painting engine.
///
/// Every field defaults to the constant of the same name above, so a
/// TOML override file only needs to name the values it changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub fit_max_squared_error: f32,
    pub resample_resolution: usize,
    pub jitter_abort_distance: f32,
    pub min_point_spacing: f32,
    pub min_stroke_points: usize,
    pub grid_cell_size: f32,
    pub history_max_size: usize,
    pub retry_timeout_secs: f32,
    pub retry_max_count: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            fit_max_squared_error: FIT_MAX_SQUARED_ERROR,
            resample_resolution: RESAMPLE_RESOLUTION,
            jitter_abort_distance: JITTER_ABORT_DISTANCE,
            min_point_spacing: MIN_POINT_SPACING,
            min_stroke_points: MIN_STROKE_POINTS,
            grid_cell_size: GRID_CELL_SIZE,
            history_max_size: HISTORY_MAX_SIZE,
            retry_timeout_secs: RETRY_TIMEOUT_SECS,
            retry_max_count: RETRY_MAX_COUNT,
        }
    }
}

impl Tuning {
    /// Load tuning from a TOML file, falling back to defaults for any
    /// field the file leaves out.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let tuning = toml::from_str(&text)?;
        Ok(tuning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let tuning = Tuning::default();
        assert!(tuning.fit_max_squared_error > 0.0);
        assert!(tuning.grid_cell_size > 0.0);
        assert!(tuning.min_stroke_points >= 2);
        assert!(tuning.history_max_size > 0);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let tuning: Tuning = toml::from_str("grid_cell_size = 0.25").unwrap();
        assert_eq!(tuning.grid_cell_size, 0.25);
        assert_eq!(tuning.history_max_size, Tuning::default().history_max_size);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Tuning::from_path(Path::new("/nonexistent/tuning.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
