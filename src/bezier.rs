// Copyright 2025 the Airstroke Authors
// SPDX-License-Identifier: Apache-2.0

//! Cubic Bezier primitives.
//!
//! A [`CubicSegment`] is four control points evaluated in the cubic
//! Bernstein form. These are pure functions with no state; the fitter
//! and the mesh-resampling path are both built on them. `t` is expected
//! in [0, 1] but deliberately not clamped — the Newton-Raphson
//! reparameterization in the fitter probes slightly outside the range.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One cubic Bezier piece: anchor, control, control, anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicSegment {
    pub points: [Vec3; 4],
}

impl CubicSegment {
    pub fn new(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        Self {
            points: [p0, p1, p2, p3],
        }
    }

    /// First anchor of the segment.
    pub fn start(&self) -> Vec3 {
        self.points[0]
    }

    /// Last anchor of the segment.
    pub fn end(&self) -> Vec3 {
        self.points[3]
    }

    /// B(t) = (1-t)³P0 + 3(1-t)²tP1 + 3(1-t)t²P2 + t³P3
    pub fn evaluate(&self, t: f32) -> Vec3 {
        let [p0, p1, p2, p3] = self.points;
        let u = 1.0 - t;
        u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
    }

    /// B'(t) = 3(1-t)²(P1-P0) + 6(1-t)t(P2-P1) + 3t²(P3-P2)
    pub fn first_derivative(&self, t: f32) -> Vec3 {
        let [p0, p1, p2, p3] = self.points;
        let u = 1.0 - t;
        3.0 * u * u * (p1 - p0) + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (p3 - p2)
    }

    /// B''(t) = 6(1-t)(P2-2P1+P0) + 6t(P3-2P2+P1)
    pub fn second_derivative(&self, t: f32) -> Vec3 {
        let [p0, p1, p2, p3] = self.points;
        6.0 * (1.0 - t) * (p2 - 2.0 * p1 + p0) + 6.0 * t * (p3 - 2.0 * p2 + p1)
    }
}

/// Flatten a fitted segment list back into a polyline.
///
/// Each segment is sampled at `resolution` evenly spaced parameters.
/// Every segment except the last skips its final parameter so the
/// anchor shared between adjacent segments is emitted once. An empty
/// segment list or a resolution below 2 yields an empty polyline.
pub fn sample_polyline(segments: &[CubicSegment], resolution: usize) -> Vec<Vec3> {
    if segments.is_empty() || resolution < 2 {
        return Vec::new();
    }

    let mut points = Vec::with_capacity(segments.len() * resolution);
    for (index, segment) in segments.iter().enumerate() {
        let is_last = index == segments.len() - 1;
        let count = if is_last { resolution } else { resolution - 1 };
        for i in 0..count {
            let t = i as f32 / (resolution - 1) as f32;
            points.push(segment.evaluate(t));
        }
    }
    points
}
