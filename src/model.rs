// Copyright 2025 the Airstroke Authors
// SPDX-License-Identifier: Apache-2.0

//! The painting model — dispatcher and undo recorder.
//!
//! `PaintingModel` is the single entry point an embedding app (and its
//! transport) drives. Incoming operation descriptors are replayed
//! through [`PaintingModel::apply`]; the record helpers capture the
//! (redo, undo) pair for committing edits *before* the edit destroys
//! the state the undo needs. Undo and redo themselves go back through
//! the same dispatcher, so a locally undone operation looks exactly
//! like one received from a peer.
//!
//! The model is deliberately single-threaded: calls must be serialized
//! by the embedding event loop. It owns the canvas and history and is
//! the only type that mutates them.

use crate::canvas::PaintingCanvas;
use crate::history::{UndoRedoAction, UndoRedoManager, default_painting_exclusion};
use crate::rpc::{
    AddStrokesParam, ChangeLineWidthParam, FinishControlPointParam, FinishStrokeParam,
    MoveControlPointParam, Param, RemoveStrokeParam, RestoreStrokeParam, SetStrokeColorParam,
    StrokeData,
};
use crate::settings::Tuning;
use crate::stroke::{Color, PointType};
use uuid::Uuid;

/// Canvas plus history behind one dispatch surface.
pub struct PaintingModel {
    pub canvas: PaintingCanvas,
    pub history: UndoRedoManager,
}

impl Default for PaintingModel {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}

impl PaintingModel {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            canvas: PaintingCanvas::new(tuning),
            history: UndoRedoManager::with_exclusion(
                tuning.history_max_size,
                default_painting_exclusion,
            ),
        }
    }

    /// Replay one operation descriptor against the canvas.
    ///
    /// This is the dispatcher peers, persistence, and the undo/redo
    /// log all funnel through. Stale ids inside the payloads are
    /// handled by the canvas as silent no-ops.
    pub fn apply(&mut self, param: &Param) {
        match param {
            Param::SetStrokeColor(p) => self.canvas.set_active_color(p.user_id, p.color),
            Param::RemoveAllStrokes(_) => self.canvas.remove_all_strokes(),
            Param::RemoveStroke(p) => self.canvas.remove_stroke(p.stroke_id),
            Param::RestoreStroke(p) => self.canvas.restore_stroke(p.stroke.clone()),
            Param::AddStrokePoint(p) => self.canvas.add_point(p.stroke_id, p.point, p.user_id),
            Param::AddBezierStrokePoints(p) => self
                .canvas
                .add_bezier_stroke_points(p.stroke_id, p.control_points.clone()),
            Param::AddStrokes(p) => self.canvas.add_strokes(p.strokes.clone()),
            Param::FinishStroke(p) => {
                self.canvas.finish_stroke(p.user_id);
            }
            Param::ChangeLineWidth(p) => self.canvas.set_max_radius(p.user_id, p.max_radius),
            Param::MoveControlPoint(p) => self.canvas.move_control_point(
                p.stroke_id,
                p.control_point_id,
                p.point_type,
                p.new_position,
            ),
            Param::FinishControlPoint(p) => self
                .canvas
                .finish_control_point(p.stroke_id, p.control_point_id),
        }
    }

    /// Undo the most recent recorded action. Returns whether anything
    /// happened.
    pub fn perform_undo(&mut self) -> bool {
        let Some(action) = self.history.undo() else {
            return false;
        };
        tracing::debug!(action = %action.id, method = ?action.undo_method, "undo");
        self.apply(&action.undo_param);
        true
    }

    /// Reapply the most recently undone action. Returns whether
    /// anything happened.
    pub fn perform_redo(&mut self) -> bool {
        let Some(action) = self.history.redo() else {
            return false;
        };
        tracing::debug!(action = %action.id, method = ?action.redo_method, "redo");
        self.apply(&action.redo_param);
        true
    }

    // ========================================================================
    // RECORD HELPERS
    //
    // Each captures whatever pre-edit state its undo needs, then logs
    // the (redo, undo) pair. None of them apply the edit — callers
    // apply and record independently, exactly like replicated peers.
    // ========================================================================

    /// Color change undoes to the previous color.
    pub fn record_color_change(&mut self, user_id: Uuid, new_color: Color, old_color: Color) {
        self.history.record(UndoRedoAction::new(
            Param::SetStrokeColor(SetStrokeColorParam {
                user_id,
                color: new_color,
            }),
            Param::SetStrokeColor(SetStrokeColorParam {
                user_id,
                color: old_color,
            }),
        ));
    }

    /// Line-width change undoes to the previous radius.
    pub fn record_line_width_change(&mut self, user_id: Uuid, new_radius: f32, old_radius: f32) {
        self.history.record(UndoRedoAction::new(
            Param::ChangeLineWidth(ChangeLineWidthParam {
                user_id,
                max_radius: new_radius,
            }),
            Param::ChangeLineWidth(ChangeLineWidthParam {
                user_id,
                max_radius: old_radius,
            }),
        ));
    }

    /// Finishing a stroke undoes to removing it.
    pub fn record_stroke_finish(&mut self, user_id: Uuid, stroke_id: Uuid) {
        self.history.record(UndoRedoAction::new(
            Param::FinishStroke(FinishStrokeParam { user_id }),
            Param::RemoveStroke(RemoveStrokeParam { stroke_id }),
        ));
    }

    /// Removing a stroke undoes to restoring the pre-removal snapshot.
    /// Recording after the stroke is already gone is a silent no-op.
    pub fn record_stroke_removal(&mut self, stroke_id: Uuid) {
        let Some(stroke) = self.canvas.stroke(stroke_id) else {
            return;
        };
        let snapshot = StrokeData::from(stroke);
        self.history.record(UndoRedoAction::new(
            Param::RemoveStroke(RemoveStrokeParam { stroke_id }),
            Param::RestoreStroke(RestoreStrokeParam { stroke: snapshot }),
        ));
    }

    /// Clearing the canvas undoes to re-adding every current stroke.
    pub fn record_all_strokes_removal(&mut self) {
        let snapshot: Vec<StrokeData> = self
            .canvas
            .strokes()
            .iter()
            .map(StrokeData::from)
            .collect();
        self.history.record(UndoRedoAction::new(
            Param::RemoveAllStrokes(crate::rpc::RemoveAllStrokesParam {}),
            Param::AddStrokes(AddStrokesParam { strokes: snapshot }),
        ));
    }

    /// A bulk addition undoes by removing the first added stroke only
    /// — a known simplification kept for peer compatibility.
    pub fn record_strokes_addition(&mut self, strokes: &[StrokeData]) {
        let Some(first) = strokes.first() else {
            return;
        };
        self.history.record(UndoRedoAction::new(
            Param::AddStrokes(AddStrokesParam {
                strokes: strokes.to_vec(),
            }),
            Param::RemoveStroke(RemoveStrokeParam {
                stroke_id: first.id,
            }),
        ));
    }

    /// A committed control-point edit undoes by moving the handle back
    /// to where it was. Note the default policy excludes this method,
    /// so with a stock model the record is dropped — see
    /// [`default_painting_exclusion`].
    pub fn record_control_point_finish(
        &mut self,
        stroke_id: Uuid,
        control_point_id: Uuid,
        point_type: PointType,
        old_position: glam::Vec3,
    ) {
        self.history.record(UndoRedoAction::new(
            Param::FinishControlPoint(FinishControlPointParam {
                stroke_id,
                control_point_id,
            }),
            Param::MoveControlPoint(MoveControlPointParam {
                stroke_id,
                control_point_id,
                point_type,
                new_position: old_position,
            }),
        ));
    }
}
