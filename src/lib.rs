// Copyright 2025 the Airstroke Authors
// SPDX-License-Identifier: Apache-2.0

//! Airstroke: the core engine of a collaborative 3D painting app.
//!
//! Users draw free-form strokes in space with hand gestures; the
//! engine fits each noisy polyline to cubic Bezier segments, keeps the
//! fitted joints snappable through a spatial grid, and records every
//! committing edit in a bounded undo/redo log of replayable operation
//! descriptors. Gesture capture, rendering, and the peer-to-peer
//! transport are the embedding app's job — they talk to the engine
//! through [`model::PaintingModel`], the [`canvas::RenderDelegate`]
//! trait, and the [`rpc`] shapes.
//!
//! Everything here is synchronous and single-threaded by contract:
//! the embedding event loop serializes all calls.

pub mod bezier;
pub mod canvas;
pub mod fit;
pub mod grid;
pub mod history;
pub mod model;
pub mod rpc;
pub mod settings;
pub mod store;
pub mod stroke;

pub use bezier::{CubicSegment, sample_polyline};
pub use canvas::{PaintingCanvas, RenderDelegate, UserSession};
pub use fit::fit_curve;
pub use grid::SpatialGrid;
pub use history::{UndoRedoAction, UndoRedoManager, default_painting_exclusion};
pub use model::PaintingModel;
pub use rpc::{ControlPointData, Method, Param, RequestQueue, RequestSchema, StrokeData};
pub use settings::Tuning;
pub use stroke::{Color, ControlPoint, PointType, Stroke};

/// Initialize tracing for an embedding app or example.
///
/// Controlled via `RUST_LOG`; defaults to `airstroke=info` when the
/// variable sets no directive for this crate.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("airstroke=info".parse().expect("valid directive")),
        )
        .init();
}
