// Copyright 2025 the Airstroke Authors
// SPDX-License-Identifier: Apache-2.0

//! Iterative cubic Bezier curve fitting.
//!
//! Converts a noisy polyline of hand-tracked samples into the minimal
//! sequence of cubic segments whose squared deviation from the input
//! stays inside a caller-supplied bound (Schneider's algorithm):
//!
//! 1. Collapse consecutive duplicates, estimate end tangents.
//! 2. Parameterize by normalized chord length and solve the 2×2
//!    least-squares system for the two control-point offsets along the
//!    tangents.
//! 3. Measure the worst squared deviation through an
//!    arc-length-to-parameter table. Accept, or — when the error is
//!    close — improve the parameterization with up to 20 Newton-Raphson
//!    rounds, or split at the worst point and recurse.
//!
//! The fitter never fails: fewer than two usable points yields an empty
//! segment list, and every normalization is guarded against degenerate
//! geometry with a fallback axis.

use crate::bezier::CubicSegment;
use glam::Vec3;

/// Newton-Raphson reparameterization rounds per recursion level.
const MAX_ITERATIONS: usize = 20;

/// Resolution of the arc-length-to-parameter lookup table.
const ARC_LENGTH_PARTS: usize = 10;

/// Consecutive input points closer than this are one sample.
const DUPLICATE_EPSILON: f32 = 1e-9;

/// Squared-length threshold below which a vector is degenerate.
const DEGENERATE_EPSILON: f32 = 1e-9;

/// Fit one or more cubic segments to `points`.
///
/// `max_squared_error` bounds the squared deviation between each input
/// point and the fitted curve. Returns an empty list when fewer than
/// two unique points remain after de-duplication.
pub fn fit_curve(points: &[Vec3], max_squared_error: f32) -> Vec<CubicSegment> {
    let mut unique: Vec<Vec3> = Vec::with_capacity(points.len());
    for &point in points {
        match unique.last() {
            Some(&previous) if previous.distance(point) < DUPLICATE_EPSILON => {}
            _ => unique.push(point),
        }
    }

    if unique.len() < 2 {
        return Vec::new();
    }

    let left_tangent = safe_normalize(unique[1] - unique[0]);
    let right_tangent = safe_normalize(unique[unique.len() - 2] - unique[unique.len() - 1]);

    let mut segments = Vec::new();
    fit_cubic(
        &unique,
        left_tangent,
        right_tangent,
        max_squared_error,
        &mut segments,
    );
    segments
}

/// Recursively fit a subrange, appending segments in order.
fn fit_cubic(
    points: &[Vec3],
    left_tangent: Vec3,
    right_tangent: Vec3,
    error: f32,
    out: &mut Vec<CubicSegment>,
) {
    // Two points: a straight cubic with controls a third of the chord
    // out along each tangent.
    if points.len() == 2 {
        let dist = points[0].distance(points[1]) / 3.0;
        out.push(CubicSegment::new(
            points[0],
            points[0] + left_tangent * dist,
            points[1] + right_tangent * dist,
            points[1],
        ));
        return;
    }

    let u = chord_length_parameterize(points);
    let (mut bez, mut max_error, mut split) =
        generate_and_measure(points, &u, &u, left_tangent, right_tangent);

    if max_error < error {
        out.push(bez);
        return;
    }

    // Close enough to try harder: refine the parameterization instead
    // of splitting right away.
    if max_error < error * error {
        let mut u_prime = u.clone();
        let mut prev_error = max_error;
        let mut prev_split = split;

        for _ in 0..MAX_ITERATIONS {
            u_prime = reparameterize(&bez, points, &u_prime);
            let (next_bez, next_error, next_split) =
                generate_and_measure(points, &u, &u_prime, left_tangent, right_tangent);
            bez = next_bez;
            max_error = next_error;
            split = next_split;

            if max_error < error {
                out.push(bez);
                return;
            }

            // Converged without reaching the bound: give up and split.
            if split == prev_split {
                let change = max_error / prev_error;
                if (0.9999..1.0001).contains(&change) {
                    break;
                }
            }
            prev_error = max_error;
            prev_split = split;
        }
    }

    // Split at the worst point and fit both halves with a tangent
    // synthesized from the split point's neighbors.
    let split = split.clamp(1, points.len() - 2);
    let mut center_vector = points[split - 1] - points[split + 1];

    if center_vector.length_squared() < DEGENERATE_EPSILON {
        // Neighbors coincide: take a perpendicular to whichever
        // adjacent edge still has length.
        let v_prev = points[split - 1] - points[split];
        let v_next = points[split + 1] - points[split];
        center_vector = if v_prev.length_squared() > DEGENERATE_EPSILON {
            perpendicular(v_prev)
        } else if v_next.length_squared() > DEGENERATE_EPSILON {
            perpendicular(v_next)
        } else {
            Vec3::X
        };
    }

    let to_center = safe_normalize(center_vector);

    fit_cubic(&points[..=split], left_tangent, to_center, error, out);
    fit_cubic(&points[split..], -to_center, right_tangent, error, out);
}

/// Solve for a candidate segment and measure its worst deviation.
fn generate_and_measure(
    points: &[Vec3],
    params_orig: &[f32],
    params_prime: &[f32],
    left_tangent: Vec3,
    right_tangent: Vec3,
) -> (CubicSegment, f32, usize) {
    let bez = generate_bezier(points, params_prime, left_tangent, right_tangent);
    let (max_error, split) = compute_max_error(points, &bez, params_orig);
    (bez, max_error, split)
}

/// Least-squares placement of the two inner control points.
///
/// The normal equations reduce to a 2×2 system in the offsets
/// (alpha_l, alpha_r) along the fixed end tangents, solved in closed
/// form by determinants. Degenerate or negative solutions fall back to
/// chord-length/3 placement.
fn generate_bezier(
    points: &[Vec3],
    parameters: &[f32],
    left_tangent: Vec3,
    right_tangent: Vec3,
) -> CubicSegment {
    let first = points[0];
    let last = points[points.len() - 1];

    let mut c00 = 0.0_f32;
    let mut c01 = 0.0_f32;
    let mut c11 = 0.0_f32;
    let mut x0 = 0.0_f32;
    let mut x1 = 0.0_f32;

    for (&point, &u) in points.iter().zip(parameters) {
        let ux = 1.0 - u;
        let a0 = left_tangent * (3.0 * u * ux * ux);
        let a1 = right_tangent * (3.0 * ux * u * u);

        c00 += a0.dot(a0);
        c01 += a0.dot(a1);
        c11 += a1.dot(a1);

        let baseline = first * (1.0 - u) + last * u;
        let tmp = point - baseline;
        x0 += a0.dot(tmp);
        x1 += a1.dot(tmp);
    }
    let c10 = c01;

    let det_c0_c1 = c00 * c11 - c10 * c01;
    let det_c0_x = c00 * x1 - c10 * x0;
    let det_x_c1 = x0 * c11 - x1 * c01;

    let alpha_l = if det_c0_c1.abs() < DEGENERATE_EPSILON {
        0.0
    } else {
        det_x_c1 / det_c0_c1
    };
    let alpha_r = if det_c0_c1.abs() < DEGENERATE_EPSILON {
        0.0
    } else {
        det_c0_x / det_c0_c1
    };

    let seg_length = first.distance(last);
    let epsilon = 1.0e-6 * seg_length;

    let (ctrl1, ctrl2) = if alpha_l < epsilon || alpha_r < epsilon {
        (
            first + left_tangent * (seg_length / 3.0),
            last + right_tangent * (seg_length / 3.0),
        )
    } else {
        (first + left_tangent * alpha_l, last + right_tangent * alpha_r)
    };

    CubicSegment::new(first, ctrl1, ctrl2, last)
}

/// One Newton-Raphson step per point toward the parameter minimizing
/// its distance to the current curve.
fn reparameterize(bez: &CubicSegment, points: &[Vec3], parameters: &[f32]) -> Vec<f32> {
    points
        .iter()
        .zip(parameters)
        .map(|(&point, &u)| newton_raphson_root_find(bez, point, u))
        .collect()
}

fn newton_raphson_root_find(bez: &CubicSegment, point: Vec3, u: f32) -> f32 {
    let d = bez.evaluate(u) - point;
    let qprime = bez.first_derivative(u);
    let numerator = d.dot(qprime);

    let qprimeprime = bez.second_derivative(u);
    let denominator = qprime.dot(qprime) + d.dot(qprimeprime);

    if denominator.abs() < DEGENERATE_EPSILON {
        u
    } else {
        u - numerator / denominator
    }
}

/// Normalized cumulative chord length in [0, 1]; uniform spacing when
/// the total length degenerates to zero.
fn chord_length_parameterize(points: &[Vec3]) -> Vec<f32> {
    let mut distances = vec![0.0_f32; points.len()];
    for i in 1..points.len() {
        distances[i] = distances[i - 1] + points[i].distance(points[i - 1]);
    }

    let total = *distances.last().unwrap_or(&0.0);
    if total <= 0.0 {
        return (0..points.len())
            .map(|i| i as f32 / (points.len() - 1) as f32)
            .collect();
    }

    distances.iter().map(|d| d / total).collect()
}

/// Worst squared deviation and the index where it occurs.
fn compute_max_error(points: &[Vec3], bez: &CubicSegment, parameters: &[f32]) -> (f32, usize) {
    let mut max_dist = 0.0_f32;
    let mut split = points.len() / 2;

    let t_dist_map = map_t_to_relative_distances(bez, ARC_LENGTH_PARTS);

    for (i, (&point, &param)) in points.iter().zip(parameters).enumerate() {
        let t = find_t(&t_dist_map, param);
        let dist = (bez.evaluate(t) - point).length_squared();
        if dist > max_dist {
            max_dist = dist;
            split = i;
        }
    }
    (max_dist, split)
}

/// Table mapping curve parameter to relative arc length.
fn map_t_to_relative_distances(bez: &CubicSegment, parts: usize) -> Vec<f32> {
    let mut distances = vec![0.0_f32];
    let mut previous = bez.points[0];
    let mut total = 0.0_f32;

    for i in 1..=parts {
        let t = i as f32 / parts as f32;
        let current = bez.evaluate(t);
        total += current.distance(previous);
        distances.push(total);
        previous = current;
    }

    if total <= 0.0 {
        return distances;
    }
    distances.iter().map(|d| d / total).collect()
}

/// Invert the arc-length table: fractional arc length to parameter.
fn find_t(t_dist_map: &[f32], param: f32) -> f32 {
    if param < 0.0 {
        return 0.0;
    }
    if param > 1.0 {
        return 1.0;
    }

    let parts = t_dist_map.len() - 1;
    for i in 1..=parts {
        if param <= t_dist_map[i] {
            let t_min = (i - 1) as f32 / parts as f32;
            let t_max = i as f32 / parts as f32;
            let len_min = t_dist_map[i - 1];
            let len_max = t_dist_map[i];

            if len_max <= len_min {
                return t_min;
            }
            return (param - len_min) / (len_max - len_min) * (t_max - t_min) + t_min;
        }
    }
    1.0
}

fn safe_normalize(v: Vec3) -> Vec3 {
    v.try_normalize().unwrap_or(Vec3::X)
}

/// A vector perpendicular to `v`, preferring the X axis as the second
/// factor and falling back to Y when they are parallel.
fn perpendicular(v: Vec3) -> Vec3 {
    let mut axis = Vec3::X;
    if v.cross(axis).length_squared() < DEGENERATE_EPSILON {
        axis = Vec3::Y;
    }
    v.cross(axis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Loose deviation check: min distance from each input point to a
    /// dense sampling of the fitted segments.
    fn max_sampled_deviation(points: &[Vec3], segments: &[CubicSegment]) -> f32 {
        let samples: Vec<Vec3> = segments
            .iter()
            .flat_map(|s| (0..=200).map(|i| s.evaluate(i as f32 / 200.0)))
            .collect();
        points
            .iter()
            .map(|p| {
                samples
                    .iter()
                    .map(|s| s.distance(*p))
                    .fold(f32::INFINITY, f32::min)
            })
            .fold(0.0, f32::max)
    }

    #[test]
    fn empty_input_yields_no_segments() {
        assert!(fit_curve(&[], 1e-4).is_empty());
    }

    #[test]
    fn all_duplicates_yield_no_segments() {
        let p = Vec3::new(0.3, 0.2, 0.1);
        assert!(fit_curve(&[p, p, p, p], 1e-4).is_empty());
    }

    #[test]
    fn two_points_produce_one_straight_segment() {
        let a = Vec3::ZERO;
        let b = Vec3::new(3.0, 0.0, 0.0);
        let segments = fit_curve(&[a, b], 1e-4);

        assert_eq!(segments.len(), 1);
        let s = segments[0];
        assert_relative_eq!(s.points[0].x, 0.0);
        assert_relative_eq!(s.points[1].x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(s.points[2].x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(s.points[3].x, 3.0);
    }

    #[test]
    fn collinear_points_fit_a_single_on_line_segment() {
        let points: Vec<Vec3> = (0..10)
            .map(|i| Vec3::new(i as f32 * 0.1, i as f32 * 0.2, i as f32 * 0.05))
            .collect();
        let segments = fit_curve(&points, 1e-6);

        assert_eq!(segments.len(), 1);
        // Every control point lies on the input line through the origin.
        let direction = points[9].normalize();
        for control in segments[0].points {
            let off_line = control - direction * control.dot(direction);
            assert!(off_line.length() < 1e-3, "control point off line: {control}");
        }
    }

    #[test]
    fn endpoints_are_reproduced_exactly() {
        let points: Vec<Vec3> = (0..20)
            .map(|i| {
                let t = i as f32 / 19.0;
                Vec3::new(t, (t * 6.0).sin() * 0.2, (t * 4.0).cos() * 0.1)
            })
            .collect();
        let segments = fit_curve(&points, 1e-4);

        assert!(!segments.is_empty());
        let first = segments.first().unwrap().start();
        let last = segments.last().unwrap().end();
        assert!(first.distance(points[0]) < 1e-6);
        assert!(last.distance(*points.last().unwrap()) < 1e-6);
    }

    #[test]
    fn adjacent_segments_share_anchors() {
        let points: Vec<Vec3> = (0..30)
            .map(|i| {
                let t = i as f32 / 29.0;
                Vec3::new((t * 8.0).cos(), (t * 8.0).sin(), t)
            })
            .collect();
        let segments = fit_curve(&points, 1e-6);

        for pair in segments.windows(2) {
            assert!(pair[0].end().distance(pair[1].start()) < 1e-6);
        }
    }

    #[test]
    fn staircase_splits_into_multiple_segments() {
        // A single cubic cannot reproduce the two corners within 1e-6.
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
        ];
        let segments = fit_curve(&points, 1e-6);

        assert!(segments.len() > 1);
        assert!(segments.len() <= 4);
        assert!(max_sampled_deviation(&points, &segments) < 1e-2);
        assert!(segments[0].start().distance(points[0]) < 1e-6);
        assert!(segments.last().unwrap().end().distance(points[4]) < 1e-6);
    }

    #[test]
    fn smooth_arc_fits_within_tolerance() {
        let points: Vec<Vec3> = (0..25)
            .map(|i| {
                let angle = i as f32 / 24.0 * std::f32::consts::PI;
                Vec3::new(angle.cos(), angle.sin(), 0.0)
            })
            .collect();
        let segments = fit_curve(&points, 1e-4);

        assert!(!segments.is_empty());
        assert!(max_sampled_deviation(&points, &segments) < 0.05);
    }

    #[test]
    fn degenerate_doubling_back_does_not_panic() {
        // The point sequence doubles back on itself, forcing the
        // perpendicular-axis fallback when a split tangent degenerates.
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
        ];
        let _ = fit_curve(&points, 1e-8);
    }
}
