// Copyright 2025 the Airstroke Authors
// SPDX-License-Identifier: Apache-2.0

//! The painting canvas — ties fitting, the spatial grid, and the
//! stroke model together.
//!
//! All mutation of the stroke list and the grid flows through this
//! type; it is the synchronization boundary the engine's
//! single-threaded contract relies on. Per-user in-progress state
//! lives in an explicit session map, created on first use and cleared
//! when a stroke is finished or aborted.
//!
//! Rendering is delegated: the canvas reports geometry changes through
//! a [`RenderDelegate`] and owns no renderer handles itself. A mesher
//! keeps its own side table keyed by stroke id.

use crate::fit;
use crate::grid::SpatialGrid;
use crate::rpc::{ControlPointData, StrokeData};
use crate::settings::Tuning;
use crate::stroke::{self, Color, PointType, Stroke};
use glam::Vec3;
use std::collections::HashMap;
use uuid::Uuid;

/// Receiver for geometry-affecting canvas events.
///
/// The engine calls these synchronously from its own thread; an
/// implementation typically re-meshes the named stroke or drops its
/// renderer resources.
pub trait RenderDelegate {
    fn stroke_changed(&mut self, _stroke: &Stroke) {}
    fn stroke_removed(&mut self, _stroke_id: Uuid) {}
    fn canvas_cleared(&mut self) {}
}

/// Delegate that ignores every event.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl RenderDelegate for NullRenderer {}

/// In-progress drawing state for one user.
#[derive(Debug, Clone, Copy)]
pub struct UserSession {
    /// Stroke currently being drawn, if any.
    pub current_stroke_id: Option<Uuid>,
    /// Last raw sample, for jitter rejection.
    pub last_sampled_position: Vec3,
    /// The first sample after a reset only establishes the baseline.
    pub is_first_sample: bool,
    pub active_color: Color,
    pub max_radius: f32,
}

impl Default for UserSession {
    fn default() -> Self {
        Self {
            current_stroke_id: None,
            last_sampled_position: Vec3::ZERO,
            is_first_sample: true,
            active_color: Color::WHITE,
            max_radius: 0.01,
        }
    }
}

/// Stroke store and per-user drawing orchestrator.
pub struct PaintingCanvas {
    strokes: Vec<Stroke>,
    grid: SpatialGrid,
    sessions: HashMap<Uuid, UserSession>,
    tuning: Tuning,
    renderer: Box<dyn RenderDelegate>,
}

impl Default for PaintingCanvas {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}

impl PaintingCanvas {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            strokes: Vec::new(),
            grid: SpatialGrid::new(tuning.grid_cell_size),
            sessions: HashMap::new(),
            tuning,
            renderer: Box::new(NullRenderer),
        }
    }

    /// Install the mesher/renderer callback.
    pub fn set_render_delegate(&mut self, delegate: Box<dyn RenderDelegate>) {
        self.renderer = delegate;
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn stroke(&self, stroke_id: Uuid) -> Option<&Stroke> {
        self.strokes.iter().find(|s| s.id == stroke_id)
    }

    pub fn session(&self, user_id: Uuid) -> Option<&UserSession> {
        self.sessions.get(&user_id)
    }

    /// Number of points currently indexed for snapping.
    pub fn indexed_point_count(&self) -> usize {
        self.grid.len()
    }

    /// Nearest snappable control-point position within `radius`.
    pub fn snap_target(&self, position: Vec3, radius: f32) -> Option<Vec3> {
        self.grid.nearest_within_radius(position, radius)
    }

    /// Color applied to strokes this user starts from now on.
    pub fn set_active_color(&mut self, user_id: Uuid, color: Color) {
        self.sessions.entry(user_id).or_default().active_color = color;
    }

    /// Tube radius applied to strokes this user starts from now on.
    pub fn set_max_radius(&mut self, user_id: Uuid, radius: f32) {
        self.sessions.entry(user_id).or_default().max_radius = radius;
    }

    /// Feed one gesture sample into the user's in-progress stroke.
    ///
    /// The first sample after a reset is discarded (baseline only). A
    /// jump beyond the jitter threshold reads as a tracking glitch and
    /// aborts the in-progress stroke. Otherwise the sample starts a
    /// stroke under `stroke_id` if none is active and is appended
    /// unless it sits within the minimum spacing of the previous one.
    pub fn add_point(&mut self, stroke_id: Uuid, position: Vec3, user_id: Uuid) {
        let jitter_threshold = self.tuning.jitter_abort_distance;
        let min_spacing = self.tuning.min_point_spacing;

        let session = self.sessions.entry(user_id).or_default();
        if session.is_first_sample {
            session.is_first_sample = false;
            session.last_sampled_position = position;
            return;
        }

        let jump = position.distance(session.last_sampled_position);
        session.last_sampled_position = position;

        if jump > jitter_threshold {
            let aborted = session.current_stroke_id.take();
            tracing::warn!(
                user = %user_id,
                distance = jump,
                "sample jump exceeds jitter threshold, aborting stroke"
            );
            if let Some(id) = aborted {
                self.remove_stroke(id);
            }
            return;
        }

        let color = session.active_color;
        let max_radius = session.max_radius;
        let current_id = match session.current_stroke_id {
            Some(id) => id,
            None => {
                session.current_stroke_id = Some(stroke_id);
                stroke_id
            }
        };

        if self.stroke(current_id).is_none() {
            let mut stroke = Stroke::new(current_id);
            stroke.color = color;
            stroke.max_radius = max_radius;
            self.strokes.push(stroke);
        }

        if let Some(stroke) = self.strokes.iter_mut().find(|s| s.id == current_id) {
            if let Some(&previous) = stroke.points.last() {
                if position.distance(previous) < min_spacing {
                    return;
                }
            }
            stroke.points.push(position);
            self.renderer.stroke_changed(stroke);
        }
    }

    /// Commit the user's in-progress stroke.
    ///
    /// Strokes with too few samples are discarded outright. Otherwise
    /// the raw polyline is fitted, the resulting control points are
    /// indexed for snapping, the session is reset, and the finished
    /// stroke's transfer shape is returned for sharing with peers.
    pub fn finish_stroke(&mut self, user_id: Uuid) -> Option<StrokeData> {
        let session = self.sessions.get_mut(&user_id)?;
        let current = session.current_stroke_id.take();
        session.is_first_sample = true;
        let stroke_id = current?;

        let index = self.strokes.iter().position(|s| s.id == stroke_id)?;

        if self.strokes[index].points.len() < self.tuning.min_stroke_points {
            tracing::debug!(stroke = %stroke_id, "discarding stroke with too few samples");
            self.strokes.remove(index);
            self.renderer.stroke_removed(stroke_id);
            return None;
        }

        let segments = fit::fit_curve(
            &self.strokes[index].points,
            self.tuning.fit_max_squared_error,
        );
        if segments.is_empty() {
            self.strokes.remove(index);
            self.renderer.stroke_removed(stroke_id);
            return None;
        }

        let control_points = stroke::control_points_from_segments(stroke_id, &segments);
        for cp in &control_points {
            self.grid.insert_all(cp.grid_records());
        }

        let stroke = &mut self.strokes[index];
        stroke.control_points = control_points;
        self.renderer.stroke_changed(stroke);
        Some(StrokeData::from(&*stroke))
    }

    /// Apply an interactive control-point edit. Unknown stroke or
    /// control-point ids are expected races and no-ops.
    pub fn move_control_point(
        &mut self,
        stroke_id: Uuid,
        control_point_id: Uuid,
        point_type: PointType,
        new_position: Vec3,
    ) {
        let Some(stroke) = self.strokes.iter_mut().find(|s| s.id == stroke_id) else {
            return;
        };
        let Some(cp) = stroke.control_point_mut(control_point_id) else {
            return;
        };
        cp.apply(new_position, point_type);
        self.renderer.stroke_changed(stroke);
    }

    /// Commit a control-point edit: re-index the stroke's control
    /// points (their positions may all have shifted) and refresh
    /// geometry.
    pub fn finish_control_point(&mut self, stroke_id: Uuid, control_point_id: Uuid) {
        let Some(stroke) = self.strokes.iter().find(|s| s.id == stroke_id) else {
            return;
        };
        tracing::debug!(stroke = %stroke_id, control_point = %control_point_id, "control point edit committed");
        for cp in &stroke.control_points {
            self.grid.remove_all(cp.grid_ids());
            self.grid.insert_all(cp.grid_records());
        }
        self.renderer.stroke_changed(stroke);
    }

    /// Remove a stroke and all of its snap-index entries.
    pub fn remove_stroke(&mut self, stroke_id: Uuid) {
        let Some(index) = self.strokes.iter().position(|s| s.id == stroke_id) else {
            return;
        };
        let stroke = self.strokes.remove(index);
        for cp in &stroke.control_points {
            self.grid.remove_all(cp.grid_ids());
        }
        for session in self.sessions.values_mut() {
            if session.current_stroke_id == Some(stroke_id) {
                session.current_stroke_id = None;
            }
        }
        self.renderer.stroke_removed(stroke_id);
    }

    /// Re-materialize a stroke from its transfer shape (undo of a
    /// removal, or a peer's stroke arriving). An existing stroke with
    /// the same id is replaced, not duplicated.
    pub fn restore_stroke(&mut self, data: StrokeData) {
        self.remove_stroke(data.id);
        let stroke = data.into_stroke();
        for cp in &stroke.control_points {
            self.grid.insert_all(cp.grid_records());
        }
        self.renderer.stroke_changed(&stroke);
        self.strokes.push(stroke);
    }

    /// Bulk [`restore_stroke`](Self::restore_stroke).
    pub fn add_strokes(&mut self, strokes: Vec<StrokeData>) {
        for data in strokes {
            self.restore_stroke(data);
        }
    }

    /// Merge streamed control points into a (possibly not yet known)
    /// stroke — a peer sharing its curve while still drawing. Nothing
    /// is indexed for snapping until the stroke is committed.
    pub fn add_bezier_stroke_points(
        &mut self,
        stroke_id: Uuid,
        control_points: Vec<ControlPointData>,
    ) {
        if self.stroke(stroke_id).is_none() {
            self.strokes.push(Stroke::new(stroke_id));
        }
        let Some(stroke) = self.strokes.iter_mut().find(|s| s.id == stroke_id) else {
            return;
        };
        for data in control_points {
            match stroke.control_points.iter().position(|cp| cp.id == data.id) {
                Some(i) => stroke.control_points[i] = data.into_control_point(),
                None => stroke.control_points.push(data.into_control_point()),
            }
        }
        self.renderer.stroke_changed(stroke);
    }

    /// Drop every stroke and the whole snap index. Users keep their
    /// color and radius, but any in-progress stroke is forgotten.
    pub fn remove_all_strokes(&mut self) {
        self.strokes.clear();
        self.grid = SpatialGrid::new(self.tuning.grid_cell_size);
        for session in self.sessions.values_mut() {
            session.current_stroke_id = None;
            session.is_first_sample = true;
        }
        self.renderer.canvas_cleared();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn canvas() -> PaintingCanvas {
        PaintingCanvas::new(Tuning::default())
    }

    /// Draw a simple arc for `user`, leaving the stroke in progress.
    fn draw_arc(canvas: &mut PaintingCanvas, stroke_id: Uuid, user: Uuid, n: usize) {
        // Baseline sample.
        canvas.add_point(stroke_id, Vec3::ZERO, user);
        for i in 0..n {
            let t = i as f32 / (n - 1) as f32;
            let p = Vec3::new(t * 0.08, (t * 3.0).sin() * 0.02, 0.0);
            canvas.add_point(stroke_id, p, user);
        }
    }

    #[test]
    fn first_sample_only_establishes_baseline() {
        let mut canvas = canvas();
        canvas.add_point(Uuid::new_v4(), Vec3::new(0.01, 0.0, 0.0), Uuid::new_v4());
        assert!(canvas.strokes().is_empty());
    }

    #[test]
    fn samples_accumulate_into_one_stroke() {
        let mut canvas = canvas();
        let (stroke_id, user) = (Uuid::new_v4(), Uuid::new_v4());
        draw_arc(&mut canvas, stroke_id, user, 10);

        assert_eq!(canvas.strokes().len(), 1);
        let stroke = canvas.stroke(stroke_id).unwrap();
        assert_eq!(stroke.points.len(), 10);
        assert_eq!(
            canvas.session(user).unwrap().current_stroke_id,
            Some(stroke_id)
        );
    }

    #[test]
    fn near_duplicate_samples_are_collapsed() {
        let mut canvas = canvas();
        let (stroke_id, user) = (Uuid::new_v4(), Uuid::new_v4());
        canvas.add_point(stroke_id, Vec3::ZERO, user);
        let p = Vec3::new(0.01, 0.0, 0.0);
        canvas.add_point(stroke_id, p, user);
        canvas.add_point(stroke_id, p + Vec3::splat(1e-12), user);

        assert_eq!(canvas.stroke(stroke_id).unwrap().points.len(), 1);
    }

    #[test]
    fn tracking_jump_aborts_the_stroke() {
        let mut canvas = canvas();
        let (stroke_id, user) = (Uuid::new_v4(), Uuid::new_v4());
        draw_arc(&mut canvas, stroke_id, user, 5);
        assert_eq!(canvas.strokes().len(), 1);

        // Half a meter in one frame: glitch.
        canvas.add_point(stroke_id, Vec3::new(0.6, 0.0, 0.0), user);

        assert!(canvas.strokes().is_empty());
        assert_eq!(canvas.session(user).unwrap().current_stroke_id, None);
    }

    #[test]
    fn finishing_a_short_stroke_discards_it() {
        let mut canvas = canvas();
        let (stroke_id, user) = (Uuid::new_v4(), Uuid::new_v4());
        canvas.add_point(stroke_id, Vec3::ZERO, user);
        canvas.add_point(stroke_id, Vec3::new(0.01, 0.0, 0.0), user);
        canvas.add_point(stroke_id, Vec3::new(0.02, 0.0, 0.0), user);

        assert!(canvas.finish_stroke(user).is_none());
        assert!(canvas.strokes().is_empty());
        assert_eq!(canvas.indexed_point_count(), 0);
    }

    #[test]
    fn finishing_a_stroke_fits_and_indexes_it() {
        let mut canvas = canvas();
        let (stroke_id, user) = (Uuid::new_v4(), Uuid::new_v4());
        draw_arc(&mut canvas, stroke_id, user, 12);

        let shared = canvas.finish_stroke(user).expect("finished stroke");
        assert_eq!(shared.id, stroke_id);
        assert!(!shared.control_points.is_empty());

        let stroke = canvas.stroke(stroke_id).unwrap();
        assert!(!stroke.control_points.is_empty());
        assert!(stroke.control_points.iter().all(|cp| cp.is_complete()));

        // First and last anchors reproduce the raw endpoints.
        let first_anchor = stroke.control_points.first().unwrap().end().unwrap();
        let last_anchor = stroke.control_points.last().unwrap().end().unwrap();
        assert!(first_anchor.distance(stroke.points[0]) < 1e-5);
        assert!(last_anchor.distance(*stroke.points.last().unwrap()) < 1e-5);

        // Three grid entries per complete control point.
        assert_eq!(
            canvas.indexed_point_count(),
            stroke.control_points.len() * 3
        );

        // Session is reset for the next stroke.
        let session = canvas.session(user).unwrap();
        assert_eq!(session.current_stroke_id, None);
        assert!(session.is_first_sample);
    }

    #[test]
    fn finish_without_active_stroke_is_a_noop() {
        let mut canvas = canvas();
        assert!(canvas.finish_stroke(Uuid::new_v4()).is_none());
    }

    #[test]
    fn new_strokes_pick_up_color_and_radius() {
        let mut canvas = canvas();
        let (stroke_id, user) = (Uuid::new_v4(), Uuid::new_v4());
        canvas.set_active_color(user, Color::RED);
        canvas.set_max_radius(user, 0.05);

        draw_arc(&mut canvas, stroke_id, user, 5);
        let stroke = canvas.stroke(stroke_id).unwrap();
        assert_eq!(stroke.color, Color::RED);
        assert_eq!(stroke.max_radius, 0.05);
    }

    #[test]
    fn move_control_point_with_unknown_ids_is_a_noop() {
        let mut canvas = canvas();
        canvas.move_control_point(Uuid::new_v4(), Uuid::new_v4(), PointType::End, Vec3::ONE);
        assert!(canvas.strokes().is_empty());
    }

    #[test]
    fn move_and_finish_control_point_reindexes_the_grid() {
        let mut canvas = canvas();
        let (stroke_id, user) = (Uuid::new_v4(), Uuid::new_v4());
        draw_arc(&mut canvas, stroke_id, user, 12);
        canvas.finish_stroke(user).unwrap();

        let cp_id = canvas.stroke(stroke_id).unwrap().control_points[0].id;
        let far = Vec3::new(3.0, 3.0, 3.0);
        canvas.move_control_point(stroke_id, cp_id, PointType::End, far);

        // Not re-indexed until the edit commits.
        assert!(canvas.snap_target(far, 0.05).is_none());

        canvas.finish_control_point(stroke_id, cp_id);
        assert_eq!(canvas.snap_target(far, 0.05), Some(far));
        // Invariant survived the re-index.
        let stroke = canvas.stroke(stroke_id).unwrap();
        assert_eq!(
            canvas.indexed_point_count(),
            stroke.control_points.len() * 3
        );
    }

    #[test]
    fn remove_stroke_clears_its_grid_entries() {
        let mut canvas = canvas();
        let (stroke_id, user) = (Uuid::new_v4(), Uuid::new_v4());
        draw_arc(&mut canvas, stroke_id, user, 12);
        canvas.finish_stroke(user).unwrap();
        assert!(canvas.indexed_point_count() > 0);

        canvas.remove_stroke(stroke_id);
        assert!(canvas.strokes().is_empty());
        assert_eq!(canvas.indexed_point_count(), 0);
    }

    #[test]
    fn restore_round_trips_a_removed_stroke() {
        let mut canvas = canvas();
        let (stroke_id, user) = (Uuid::new_v4(), Uuid::new_v4());
        draw_arc(&mut canvas, stroke_id, user, 12);
        let shared = canvas.finish_stroke(user).unwrap();
        let indexed = canvas.indexed_point_count();

        canvas.remove_stroke(stroke_id);
        canvas.restore_stroke(shared.clone());

        let stroke = canvas.stroke(stroke_id).expect("restored");
        assert_eq!(stroke.points, shared.points);
        assert_eq!(stroke.control_points.len(), shared.control_points.len());
        assert_eq!(canvas.indexed_point_count(), indexed);

        // Restoring again replaces instead of duplicating.
        canvas.restore_stroke(shared);
        assert_eq!(canvas.strokes().len(), 1);
        assert_eq!(canvas.indexed_point_count(), indexed);
    }

    #[test]
    fn streamed_control_points_merge_by_id() {
        let mut canvas = canvas();
        let stroke_id = Uuid::new_v4();
        let cp_id = Uuid::new_v4();
        let data = ControlPointData {
            id: cp_id,
            stroke_id,
            end: Some(Vec3::ZERO),
            start_control: None,
            end_control: None,
        };
        canvas.add_bezier_stroke_points(stroke_id, vec![data]);
        assert_eq!(canvas.stroke(stroke_id).unwrap().control_points.len(), 1);

        // The same joint arrives again, now complete.
        let updated = ControlPointData {
            end: Some(Vec3::ZERO),
            start_control: Some(Vec3::new(-0.1, 0.0, 0.0)),
            end_control: Some(Vec3::new(0.1, 0.0, 0.0)),
            ..data
        };
        canvas.add_bezier_stroke_points(stroke_id, vec![updated]);

        let stroke = canvas.stroke(stroke_id).unwrap();
        assert_eq!(stroke.control_points.len(), 1);
        assert!(stroke.control_points[0].is_complete());
        // Streamed joints are not snappable yet.
        assert_eq!(canvas.indexed_point_count(), 0);
    }

    #[test]
    fn remove_all_strokes_clears_everything() {
        let mut canvas = canvas();
        let user = Uuid::new_v4();
        for _ in 0..3 {
            let stroke_id = Uuid::new_v4();
            draw_arc(&mut canvas, stroke_id, user, 12);
            canvas.finish_stroke(user);
        }
        assert_eq!(canvas.strokes().len(), 3);

        canvas.remove_all_strokes();
        assert!(canvas.strokes().is_empty());
        assert_eq!(canvas.indexed_point_count(), 0);
    }

    #[test]
    fn render_delegate_sees_removals() {
        #[derive(Default)]
        struct Recorder {
            removed: Rc<RefCell<Vec<Uuid>>>,
        }
        impl RenderDelegate for Recorder {
            fn stroke_removed(&mut self, stroke_id: Uuid) {
                self.removed.borrow_mut().push(stroke_id);
            }
        }

        let removed = Rc::new(RefCell::new(Vec::new()));
        let mut canvas = canvas();
        canvas.set_render_delegate(Box::new(Recorder {
            removed: Rc::clone(&removed),
        }));

        let (stroke_id, user) = (Uuid::new_v4(), Uuid::new_v4());
        draw_arc(&mut canvas, stroke_id, user, 12);
        canvas.finish_stroke(user).unwrap();
        canvas.remove_stroke(stroke_id);

        assert_eq!(removed.borrow().as_slice(), &[stroke_id]);
    }
}
