// Copyright 2025 the Airstroke Authors
// SPDX-License-Identifier: Apache-2.0

//! Stroke model — raw samples plus the fitted curve derived from them.
//!
//! A stroke owns its raw input points and, once finished, the control
//! points produced by the curve fitter. Control points reproduce the
//! first and last raw points as the first and last anchors; the
//! renderable segment list is derived pairwise from adjacent complete
//! control points.

pub mod control_point;

pub use control_point::{ControlPoint, ControlPointState, PointType};

use crate::bezier::CubicSegment;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Linear RGBA stroke color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// A user-drawn 3D path.
#[derive(Debug, Clone)]
pub struct Stroke {
    pub id: Uuid,
    /// Raw hand-tracked samples in draw order.
    pub points: Vec<Vec3>,
    /// Fitted curve joints; empty until the stroke is finished.
    pub control_points: Vec<ControlPoint>,
    pub color: Color,
    /// Tube radius used by the mesher.
    pub max_radius: f32,
}

impl Stroke {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            points: Vec::new(),
            control_points: Vec::new(),
            color: Color::default(),
            max_radius: 0.01,
        }
    }

    pub fn control_point(&self, id: Uuid) -> Option<&ControlPoint> {
        self.control_points.iter().find(|cp| cp.id == id)
    }

    pub fn control_point_mut(&mut self, id: Uuid) -> Option<&mut ControlPoint> {
        self.control_points.iter_mut().find(|cp| cp.id == id)
    }

    /// Renderable segments derived from adjacent complete control
    /// points: `[cp[i].end, cp[i].end_control, cp[i+1].start_control,
    /// cp[i+1].end]`. Pairs with unresolved positions are dropped.
    pub fn beziers(&self) -> Vec<CubicSegment> {
        let mut segments = Vec::new();
        for pair in self.control_points.windows(2) {
            let (start, end) = (&pair[0], &pair[1]);
            if let (Some(p0), Some(p1), Some(p2), Some(p3)) = (
                start.end(),
                start.end_control(),
                end.start_control(),
                end.end(),
            ) {
                segments.push(CubicSegment::new(p0, p1, p2, p3));
            }
        }
        segments
    }
}

/// Convert fitted segments into the stroke's control-point chain.
///
/// The first control point takes the first segment's anchor and its
/// outgoing handle; every segment then contributes its far anchor with
/// the incoming handle. The opposite handle of each joint is the
/// mirror, so joints are symmetric: anchors and incoming handles are
/// preserved exactly, outgoing handles at interior joints are the
/// reflected incoming ones.
pub fn control_points_from_segments(
    stroke_id: Uuid,
    segments: &[CubicSegment],
) -> Vec<ControlPoint> {
    let Some(first) = segments.first() else {
        return Vec::new();
    };

    let mut control_points = Vec::with_capacity(segments.len() + 1);

    let mut start = ControlPoint::new(stroke_id);
    start.apply(first.points[0], PointType::End);
    start.apply(first.points[1], PointType::EndControl);
    control_points.push(start);

    for segment in segments {
        let mut cp = ControlPoint::new(stroke_id);
        cp.apply(segment.points[3], PointType::End);
        cp.apply(segment.points[2], PointType::StartControl);
        control_points.push(cp);
    }

    control_points
}
