// Copyright 2025 the Airstroke Authors
// SPDX-License-Identifier: Apache-2.0

//! One joint of a fitted multi-segment curve.
//!
//! A control point is an anchor plus two handles mirrored about it.
//! Its lifecycle is an explicit state machine: it is created empty,
//! the anchor lands first, and the first handle set mirrors the
//! opposite handle automatically. After that, moving the anchor drags
//! both handles rigidly and moving either handle recomputes the mirror.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which position of a control point an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointType {
    /// The on-curve anchor.
    End,
    /// The handle leading into the anchor.
    StartControl,
    /// The handle leading out of the anchor.
    EndControl,
}

impl PointType {
    /// The position expected after this one while a curve is being
    /// streamed point by point.
    pub fn next(self) -> PointType {
        match self {
            PointType::End => PointType::EndControl,
            PointType::StartControl => PointType::End,
            PointType::EndControl => PointType::End,
        }
    }
}

/// Resolution state of a control point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlPointState {
    /// Nothing set yet.
    Empty,
    /// Anchor known, handles not yet placed.
    AnchorOnly { end: Vec3 },
    /// Anchor and both (mirrored) handles resolved.
    Complete {
        end: Vec3,
        start_control: Vec3,
        end_control: Vec3,
    },
}

/// One joint of a stroke's fitted curve.
///
/// The grid sub-ids identify the three resolved positions in the
/// spatial grid. They are local bookkeeping only — transfer objects
/// carry just the control point id, and peers mint their own sub-ids.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPoint {
    pub id: Uuid,
    pub stroke_id: Uuid,
    state: ControlPointState,
    /// Progress marker for streamed curve input.
    pub next_point_type: PointType,
    pub anchor_grid_id: Uuid,
    pub start_control_grid_id: Uuid,
    pub end_control_grid_id: Uuid,
}

impl ControlPoint {
    pub fn new(stroke_id: Uuid) -> Self {
        Self::with_id(stroke_id, Uuid::new_v4())
    }

    pub fn with_id(stroke_id: Uuid, id: Uuid) -> Self {
        Self {
            id,
            stroke_id,
            state: ControlPointState::Empty,
            next_point_type: PointType::End,
            anchor_grid_id: Uuid::new_v4(),
            start_control_grid_id: Uuid::new_v4(),
            end_control_grid_id: Uuid::new_v4(),
        }
    }

    pub fn state(&self) -> ControlPointState {
        self.state
    }

    /// Anchor position, once set.
    pub fn end(&self) -> Option<Vec3> {
        match self.state {
            ControlPointState::Empty => None,
            ControlPointState::AnchorOnly { end } | ControlPointState::Complete { end, .. } => {
                Some(end)
            }
        }
    }

    pub fn start_control(&self) -> Option<Vec3> {
        match self.state {
            ControlPointState::Complete { start_control, .. } => Some(start_control),
            _ => None,
        }
    }

    pub fn end_control(&self) -> Option<Vec3> {
        match self.state {
            ControlPointState::Complete { end_control, .. } => Some(end_control),
            _ => None,
        }
    }

    /// Both handles resolved.
    pub fn is_complete(&self) -> bool {
        matches!(self.state, ControlPointState::Complete { .. })
    }

    pub fn position_of(&self, point_type: PointType) -> Option<Vec3> {
        match point_type {
            PointType::End => self.end(),
            PointType::StartControl => self.start_control(),
            PointType::EndControl => self.end_control(),
        }
    }

    /// Apply a position to the slot named by `point_type`.
    ///
    /// Transitions:
    /// - empty + anchor: the anchor lands; handles before the anchor
    ///   are ignored.
    /// - anchor-only + a handle: that handle is set and the opposite
    ///   one mirrored as `end + (end - handle)`.
    /// - a new anchor with handles present: both handles translate by
    ///   the anchor delta.
    /// - a handle while complete: overwritten, mirror recomputed.
    pub fn apply(&mut self, position: Vec3, point_type: PointType) {
        self.state = match (self.state, point_type) {
            (ControlPointState::Empty, PointType::End) => {
                ControlPointState::AnchorOnly { end: position }
            }
            // A handle cannot land before the anchor.
            (ControlPointState::Empty, _) => return,

            (ControlPointState::AnchorOnly { .. }, PointType::End) => {
                ControlPointState::AnchorOnly { end: position }
            }
            (ControlPointState::AnchorOnly { end }, PointType::EndControl) => {
                ControlPointState::Complete {
                    end,
                    end_control: position,
                    start_control: end + (end - position),
                }
            }
            (ControlPointState::AnchorOnly { end }, PointType::StartControl) => {
                ControlPointState::Complete {
                    end,
                    start_control: position,
                    end_control: end + (end - position),
                }
            }

            (
                ControlPointState::Complete {
                    end,
                    start_control,
                    end_control,
                },
                PointType::End,
            ) => {
                // Rigid move: the handles keep their geometry relative
                // to the anchor.
                let delta = position - end;
                ControlPointState::Complete {
                    end: position,
                    start_control: start_control + delta,
                    end_control: end_control + delta,
                }
            }
            (ControlPointState::Complete { end, .. }, PointType::EndControl) => {
                ControlPointState::Complete {
                    end,
                    end_control: position,
                    start_control: end + (end - position),
                }
            }
            (ControlPointState::Complete { end, .. }, PointType::StartControl) => {
                ControlPointState::Complete {
                    end,
                    start_control: position,
                    end_control: end + (end - position),
                }
            }
        };
        self.next_point_type = point_type.next();
    }

    /// `(grid id, position)` records for every resolved position.
    pub fn grid_records(&self) -> Vec<(Uuid, Vec3)> {
        match self.state {
            ControlPointState::Empty => Vec::new(),
            ControlPointState::AnchorOnly { end } => vec![(self.anchor_grid_id, end)],
            ControlPointState::Complete {
                end,
                start_control,
                end_control,
            } => vec![
                (self.anchor_grid_id, end),
                (self.start_control_grid_id, start_control),
                (self.end_control_grid_id, end_control),
            ],
        }
    }

    /// All grid ids this control point may be indexed under.
    pub fn grid_ids(&self) -> [Uuid; 3] {
        [
            self.anchor_grid_id,
            self.start_control_grid_id,
            self.end_control_grid_id,
        ]
    }
}
